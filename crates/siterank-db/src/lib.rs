pub mod config;
pub mod database;
pub mod queue;
pub mod result_repository;

pub use config::{DEFAULT_LOAD_QUERY, DatabaseConfig, QueueConfig};
pub use database::{Database, PgDomainSource};
pub use queue::{RedisListQueue, RedisSetQueue};
pub use result_repository::PgResultConnector;
