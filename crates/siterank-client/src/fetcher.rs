use reqwest::Client;
use siterank_core::error::AppError;
use siterank_core::traits::Fetcher;

/// Default ranking provider page prefix; the domain is appended to it.
pub const DEFAULT_BASE_URL: &str = "https://www.alexa.com/siteinfo/";

/// HTTP fetcher for ranking provider pages, using reqwest.
///
/// Certificate validation is **disabled** and no request timeout is set: a
/// hung request stalls only the worker that issued it. Transport failures
/// are logged and surface as an empty payload.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    base_url: String,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent("siterank/0.1")
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Target URL: the base path concatenated with the domain.
    pub fn url_for(&self, domain: &str) -> String {
        format!("{}{}", self.base_url, domain)
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(e.to_string())
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        Ok(body.to_vec())
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, domain: &str) -> Vec<u8> {
        let url = self.url_for(domain);
        match self.try_fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                if e.is_transport() {
                    tracing::warn!(%url, error = %e, "Fetch failed, treating as empty page");
                } else {
                    tracing::error!(%url, error = %e, "Fetch failed, treating as empty page");
                }
                Vec::new()
            }
        }
    }
}
