pub mod extractor;
pub mod fetcher;

pub use extractor::HtmlRankExtractor;
pub use fetcher::ReqwestFetcher;
