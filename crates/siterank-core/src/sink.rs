use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

use crate::config::FileSinkConfig;
use crate::error::AppError;
use crate::models::RankResult;
use crate::traits::{ResultSink, SinkConnector, SinkFactory};

// ---------------------------------------------------------------------------
// File sink
// ---------------------------------------------------------------------------

/// Appends `domain,rank,rank,rank,rank` lines to the run's result file.
pub struct FileSink {
    file: tokio::fs::File,
}

impl ResultSink for FileSink {
    async fn persist(&mut self, result: &RankResult) -> Result<(), AppError> {
        let mut line = result.to_line();
        line.push('\n');
        // One write per line; the handle is in append mode so lines from
        // different workers never interleave.
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }
}

/// Opens one append handle per worker onto a single per-run file.
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    path: PathBuf,
}

impl FileSinkFactory {
    /// The file name is the configured base followed by the run-start unix
    /// timestamp.
    pub fn new(config: &FileSinkConfig, run_started: DateTime<Local>) -> Self {
        let path = PathBuf::from(format!(
            "{}{}",
            config.output_base.display(),
            run_started.timestamp()
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SinkFactory for FileSinkFactory {
    type Sink = FileSink;

    async fn create(&self) -> Result<FileSink, AppError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok(FileSink { file })
    }
}

// ---------------------------------------------------------------------------
// Reconnecting sink
// ---------------------------------------------------------------------------

/// Sink over a remote store connection.
///
/// A failed insert triggers exactly one reconnect and exactly one retry. If
/// the retry fails too, the error is returned and the record is dropped.
pub struct ReconnectingSink<C: SinkConnector> {
    connector: C,
    conn: C::Connection,
}

impl<C: SinkConnector> ReconnectingSink<C> {
    pub async fn connect(connector: C) -> Result<Self, AppError> {
        let conn = connector.connect().await?;
        Ok(Self { connector, conn })
    }
}

impl<C: SinkConnector> ResultSink for ReconnectingSink<C> {
    async fn persist(&mut self, result: &RankResult) -> Result<(), AppError> {
        match self.connector.insert(&mut self.conn, result).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(domain = %result.domain, error = %e, "Insert failed, reconnecting");
                self.conn = self.connector.connect().await?;
                self.connector.insert(&mut self.conn, result).await
            }
        }
    }
}

/// Opens a fresh connection for every worker.
#[derive(Debug, Clone)]
pub struct ReconnectingSinkFactory<C: SinkConnector> {
    connector: C,
}

impl<C: SinkConnector> ReconnectingSinkFactory<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }
}

impl<C: SinkConnector> SinkFactory for ReconnectingSinkFactory<C> {
    type Sink = ReconnectingSink<C>;

    async fn create(&self) -> Result<ReconnectingSink<C>, AppError> {
        ReconnectingSink::connect(self.connector.clone()).await
    }
}
