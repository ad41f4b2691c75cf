use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use siterank_core::error::AppError;
use siterank_core::traits::WorkQueue;

use crate::config::QueueConfig;

fn queue_error(e: redis::RedisError) -> AppError {
    AppError::QueueError(e.to_string())
}

async fn open(config: &QueueConfig) -> Result<MultiplexedConnection, AppError> {
    tracing::debug!(key = %config.key, mode = %config.mode, "Connecting to work queue");
    let client = redis::Client::open(config.redis_url.as_str()).map_err(queue_error)?;
    client
        .get_multiplexed_async_connection()
        .await
        .map_err(queue_error)
}

/// FIFO work queue on a Redis list: `LPUSH` to enqueue, `RPOP` to claim.
///
/// Duplicates are kept and insertion order is preserved.
#[derive(Clone)]
pub struct RedisListQueue {
    conn: MultiplexedConnection,
    key: String,
}

impl RedisListQueue {
    pub async fn connect(config: &QueueConfig) -> Result<Self, AppError> {
        Ok(Self {
            conn: open(config).await?,
            key: config.key.clone(),
        })
    }
}

impl WorkQueue for RedisListQueue {
    async fn push(&self, domains: &[String]) -> Result<(), AppError> {
        if domains.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(&self.key, domains)
            .await
            .map_err(queue_error)
    }

    async fn pop(&self) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        conn.rpop(&self.key, None).await.map_err(queue_error)
    }

    async fn clear(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&self.key).await.map_err(queue_error)
    }
}

/// Deduplicating work queue on a Redis set: `SADD` to enqueue, `SPOP` to claim.
///
/// Pop order is arbitrary.
#[derive(Clone)]
pub struct RedisSetQueue {
    conn: MultiplexedConnection,
    key: String,
}

impl RedisSetQueue {
    pub async fn connect(config: &QueueConfig) -> Result<Self, AppError> {
        Ok(Self {
            conn: open(config).await?,
            key: config.key.clone(),
        })
    }
}

impl WorkQueue for RedisSetQueue {
    async fn push(&self, domains: &[String]) -> Result<(), AppError> {
        if domains.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(&self.key, domains)
            .await
            .map_err(queue_error)
    }

    async fn pop(&self) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        conn.spop(&self.key).await.map_err(queue_error)
    }

    async fn clear(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&self.key).await.map_err(queue_error)
    }
}
