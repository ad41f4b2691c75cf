use futures::StreamExt;
use futures::stream::BoxStream;
use siterank_core::AppError;
use siterank_core::traits::DomainSource;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::result_repository::PgResultConnector;

/// Central database facade. Owns the pool used by the load stage, runs
/// migrations, and vends per-worker result connectors.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    url: String,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self {
            pool,
            url: config.url.clone(),
        })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        tracing::debug!("Database migrations applied");
        Ok(())
    }

    /// Get a [`PgDomainSource`] backed by this pool.
    pub fn domain_source(&self) -> PgDomainSource {
        PgDomainSource::new(self.pool.clone())
    }

    /// Get a [`PgResultConnector`]; every sink it backs opens its own
    /// connection instead of sharing this pool.
    pub fn result_connector(&self) -> PgResultConnector {
        PgResultConnector::new(self.url.clone())
    }
}

/// Streams domains from an arbitrary read query (first column, text).
#[derive(Clone)]
pub struct PgDomainSource {
    pool: PgPool,
}

impl PgDomainSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainSource for PgDomainSource {
    fn domains<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<String, AppError>> {
        sqlx::query_scalar::<_, String>(query)
            .fetch(&self.pool)
            .map(|row| row.map_err(|e| AppError::DatabaseError(e.to_string())))
            .boxed()
    }
}
