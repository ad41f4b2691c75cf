use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use siterank_client::{HtmlRankExtractor, ReqwestFetcher};
use siterank_core::config::{AltRankStrategy, FileSinkConfig, LoadConfig, QueueMode, WorkerConfig};
use siterank_core::traits::{SinkFactory, WorkQueue};
use siterank_core::{
    FileSinkFactory, Loader, ReconnectingSinkFactory, TracingWorkerReporter, WorkerPool,
};
use siterank_db::{DEFAULT_LOAD_QUERY, Database, DatabaseConfig, QueueConfig};
use siterank_db::{RedisListQueue, RedisSetQueue};

#[derive(Parser)]
#[command(name = "siterank", version, about = "Queue-driven site rank crawler")]
struct Cli {
    #[command(flatten)]
    queue: QueueArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Queue flags; anything left unset falls back to `QueueConfig::from_env`.
#[derive(Args)]
struct QueueArgs {
    /// Redis connection URL [env: REDIS_URL, default: redis://127.0.0.1/]
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Redis key holding the work queue [env: SITERANK_QUEUE_KEY, default: rank_domains]
    #[arg(long, global = true)]
    queue_key: Option<String>,

    /// Queue mode: "list" (FIFO, duplicates kept) or "set" (deduplicated)
    /// [env: SITERANK_QUEUE_MODE, default: set]
    #[arg(long, global = true)]
    queue_mode: Option<String>,
}

impl QueueArgs {
    fn into_config(self) -> Result<QueueConfig> {
        let mut config = QueueConfig::from_env()?;
        if let Some(redis_url) = self.redis_url {
            config.redis_url = redis_url;
        }
        if let Some(key) = self.queue_key {
            config.key = key;
        }
        if let Some(mode) = self.queue_mode {
            config.mode = mode.parse()?;
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    /// Append lines to a per-run result file
    File,
    /// Insert rows into the rank_results table (requires DATABASE_URL)
    Db,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the work queue from a domain file or a database query
    Load {
        /// Domain file, one domain per line (loads from the database query if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Text encoding of the domain file
        #[arg(short, long, default_value = "gbk")]
        encoding: String,

        /// Query whose first column yields domains
        #[arg(long, env = "SITERANK_LOAD_QUERY", default_value = DEFAULT_LOAD_QUERY)]
        query: String,

        /// Keep existing queue entries instead of clearing the key first
        #[arg(long, default_value_t = false)]
        no_clear: bool,
    },

    /// Start workers that drain the queue until it is empty
    Run {
        /// Number of parallel workers
        #[arg(short, long, env = "SITERANK_WORKERS", default_value_t = 30)]
        workers: usize,

        /// Where results are written
        #[arg(short, long, value_enum, env = "SITERANK_OUTPUT", default_value = "db")]
        output: Output,

        /// Result file prefix for file output; the run timestamp is appended
        #[arg(long, default_value = "./rank_results/siterank_result_")]
        output_base: PathBuf,

        /// Ranking provider page prefix; the domain is appended
        #[arg(long, env = "SITERANK_BASE_URL", default_value = siterank_client::fetcher::DEFAULT_BASE_URL)]
        base_url: String,

        /// Source of the fourth rank field: "script" or "panel"
        #[arg(long, default_value = "script")]
        alt_rank: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("siterank=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let queue_config = cli.queue.into_config()?;

    match cli.command {
        Commands::Load {
            file,
            encoding,
            query,
            no_clear,
        } => {
            let source = match file {
                Some(path) => LoadSource::File { path, encoding },
                None => LoadSource::Query(query),
            };
            let config = LoadConfig {
                clear_before_load: !no_clear,
                ..LoadConfig::default()
            };
            match queue_config.mode {
                QueueMode::List => {
                    let queue = RedisListQueue::connect(&queue_config).await?;
                    cmd_load(queue, source, config).await?;
                }
                QueueMode::Set => {
                    let queue = RedisSetQueue::connect(&queue_config).await?;
                    cmd_load(queue, source, config).await?;
                }
            }
        }
        Commands::Run {
            workers,
            output,
            output_base,
            base_url,
            alt_rank,
        } => {
            let alt_rank: AltRankStrategy = alt_rank.parse()?;
            let settings = RunSettings {
                workers,
                output,
                file: FileSinkConfig { output_base },
                base_url,
                alt_rank,
            };
            match queue_config.mode {
                QueueMode::List => {
                    let queue = RedisListQueue::connect(&queue_config).await?;
                    cmd_run(queue, settings).await?;
                }
                QueueMode::Set => {
                    let queue = RedisSetQueue::connect(&queue_config).await?;
                    cmd_run(queue, settings).await?;
                }
            }
        }
    }

    Ok(())
}

enum LoadSource {
    File { path: PathBuf, encoding: String },
    Query(String),
}

struct RunSettings {
    workers: usize,
    output: Output,
    file: FileSinkConfig,
    base_url: String,
    alt_rank: AltRankStrategy,
}

/// Connect to PostgreSQL using DATABASE_URL and apply migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    Ok(db)
}

async fn cmd_load<Q: WorkQueue>(queue: Q, source: LoadSource, config: LoadConfig) -> Result<()> {
    let loader = Loader::new(queue, config);

    let summary = match source {
        LoadSource::File { path, encoding } => loader
            .load_from_file(&path, &encoding)
            .await
            .with_context(|| format!("Failed to load domains from {}", path.display()))?,
        LoadSource::Query(query) => {
            let db = connect_db().await?;
            let mut domains = db.domain_source();
            loader
                .load_from_query(&mut domains, &query)
                .await
                .context("Failed to load domains from database")?
        }
    };

    println!(
        "Loaded {} domains in {} batches",
        summary.domains, summary.batches
    );
    Ok(())
}

async fn cmd_run<Q: WorkQueue + 'static>(queue: Q, settings: RunSettings) -> Result<()> {
    let fetcher =
        ReqwestFetcher::with_base_url(&settings.base_url).context("Failed to create HTTP client")?;
    let extractor = HtmlRankExtractor::with_alt_strategy(settings.alt_rank)?;

    match settings.output {
        Output::File => {
            let sinks = FileSinkFactory::new(&settings.file, chrono::Local::now());
            tracing::info!(path = %sinks.path().display(), "Writing results to file");
            run_pool(queue, fetcher, extractor, sinks, settings.workers).await
        }
        Output::Db => {
            let db = connect_db().await?;
            let sinks = ReconnectingSinkFactory::new(db.result_connector());
            run_pool(queue, fetcher, extractor, sinks, settings.workers).await
        }
    }
}

async fn run_pool<Q, SF>(
    queue: Q,
    fetcher: ReqwestFetcher,
    extractor: HtmlRankExtractor,
    sinks: SF,
    workers: usize,
) -> Result<()>
where
    Q: WorkQueue + 'static,
    SF: SinkFactory + 'static,
    SF::Sink: 'static,
{
    let pool = WorkerPool::new(queue, fetcher, extractor, sinks, WorkerConfig::default());
    let summary = pool.run(workers, Arc::new(TracingWorkerReporter)).await;

    println!(
        "Processed {} domains ({} saved, {} parse failures, {} save failures) with {} workers ({} failed)",
        summary.processed,
        summary.persisted,
        summary.parse_failures,
        summary.persist_failures,
        summary.workers_finished + summary.workers_failed,
        summary.workers_failed,
    );
    Ok(())
}
