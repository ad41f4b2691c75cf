use siterank_core::error::AppError;
use siterank_core::models::RankResult;
use siterank_core::traits::SinkConnector;
use sqlx::{Connection, PgConnection};

/// Writes rank results to the `rank_results` table.
///
/// Each [`connect`](SinkConnector::connect) opens a dedicated connection, so
/// workers never share a handle.
#[derive(Debug, Clone)]
pub struct PgResultConnector {
    url: String,
}

impl PgResultConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl SinkConnector for PgResultConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, AppError> {
        PgConnection::connect(&self.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))
    }

    async fn insert(&self, conn: &mut PgConnection, result: &RankResult) -> Result<(), AppError> {
        let [china_1, global_1, china_2, global_2] = result.ranks.codes();
        sqlx::query(
            r#"
            INSERT INTO rank_results (domain, china_1, global_1, china_2, global_2, craw_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&result.domain)
        .bind(china_1)
        .bind(global_1)
        .bind(china_2)
        .bind(global_2)
        .bind(result.crawled_at)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
