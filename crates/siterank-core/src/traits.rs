use std::future::Future;

use futures::stream::BoxStream;

use crate::error::AppError;
use crate::models::{RankFields, RankResult};

/// Shared queue of domains waiting to be ranked.
///
/// `pop` must be a single atomic store operation so that two workers never
/// claim the same domain. A claimed domain is never handed out again.
pub trait WorkQueue: Send + Sync + Clone {
    fn push(&self, domains: &[String]) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Atomically remove and return one domain. `None` when the queue is empty.
    fn pop(&self) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Downloads the ranking page for a domain.
///
/// Never fails: transport errors yield an empty payload.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, domain: &str) -> impl Future<Output = Vec<u8>> + Send;
}

/// Reads the four rank fields out of a ranking page.
///
/// Called on the blocking thread pool, hence the `'static` bound.
pub trait RankParser: Send + Sync + Clone + 'static {
    fn parse(&self, page: &[u8]) -> RankFields;
}

/// Persists rank records. Each worker owns its own sink.
pub trait ResultSink: Send {
    fn persist(
        &mut self,
        result: &RankResult,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Creates one [`ResultSink`] per worker.
pub trait SinkFactory: Send + Sync + Clone {
    type Sink: ResultSink;

    fn create(&self) -> impl Future<Output = Result<Self::Sink, AppError>> + Send;
}

/// Connection management for sinks backed by a remote store.
///
/// Wrapped by [`ReconnectingSink`](crate::sink::ReconnectingSink), which
/// reconnects once and retries once when an insert fails.
pub trait SinkConnector: Send + Sync + Clone {
    type Connection: Send;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, AppError>> + Send;

    fn insert(
        &self,
        conn: &mut Self::Connection,
        result: &RankResult,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Streams domains out of a query result (first column of each row).
pub trait DomainSource: Send {
    fn domains<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<String, AppError>>;
}
