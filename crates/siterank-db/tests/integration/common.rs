use siterank_core::QueueMode;
use siterank_db::QueueConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// SQL migration statements, executed one at a time.
const MIGRATIONS: &[&str] = &[
    // 001_rank_results.sql
    r#"CREATE TABLE IF NOT EXISTS rank_domains (
        domain TEXT PRIMARY KEY
    )"#,
    r#"CREATE TABLE IF NOT EXISTS rank_results (
        id BIGSERIAL PRIMARY KEY,
        domain TEXT NOT NULL,
        china_1 BIGINT NOT NULL,
        global_1 BIGINT NOT NULL,
        china_2 BIGINT NOT NULL,
        global_2 BIGINT NOT NULL,
        craw_time TIMESTAMP NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_rank_results_domain
        ON rank_results(domain, craw_time DESC)"#,
];

/// Spins up a PostgreSQL container and returns a connected pool and its URL.
///
/// The `ContainerAsync` must be kept in scope for the test duration;
/// dropping it will stop the container.
pub async fn setup_test_db() -> (PgPool, String, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "siterank_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/siterank_test");

    // Retry connection until container is fully ready
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    // Run migrations one statement at a time
    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    (pool, connection_string, container)
}

/// Spins up a Redis container and returns a queue config pointing at it.
pub async fn setup_test_redis(mode: QueueMode) -> (QueueConfig, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("redis", "7")
        .with_exposed_port(ContainerPort::Tcp(6379))
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .expect("Failed to start Redis container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get port");

    let config = QueueConfig {
        redis_url: format!("redis://{host}:{port}/"),
        key: "rank_domains_test".to_string(),
        mode,
    };

    (config, container)
}
