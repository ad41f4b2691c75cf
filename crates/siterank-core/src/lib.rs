pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pool;
pub mod sink;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{AltRankStrategy, FileSinkConfig, LoadConfig, QueueMode, WorkerConfig};
pub use error::AppError;
pub use loader::{LoadSummary, Loader};
pub use models::{Rank, RankFields, RankResult};
pub use pool::{PoolSummary, WorkerPool};
pub use sink::{FileSinkFactory, ReconnectingSinkFactory};
pub use traits::{DomainSource, Fetcher, RankParser, ResultSink, SinkConnector, SinkFactory, WorkQueue};
pub use worker::{TracingWorkerReporter, WorkerReporter};
