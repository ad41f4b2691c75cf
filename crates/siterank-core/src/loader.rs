use std::path::Path;

use encoding_rs::Encoding;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;

use crate::config::LoadConfig;
use crate::error::AppError;
use crate::traits::{DomainSource, WorkQueue};

const READ_CHUNK: usize = 8 * 1024;

/// Counters reported after a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub domains: usize,
    pub batches: usize,
}

/// Extract the domain token from one input line.
///
/// The token is everything before the first comma, then before the first
/// space, trimmed. Example: `"example.com, Site Name"` → `"example.com"`.
pub fn domain_token(line: &str) -> Option<&str> {
    let token = line
        .split(',')
        .next()
        .and_then(|field| field.split(' ').next())
        .map(str::trim)
        .unwrap_or_default();
    (!token.is_empty()).then_some(token)
}

/// Seeds the work queue from a flat file or a query result.
pub struct Loader<Q: WorkQueue> {
    queue: Q,
    config: LoadConfig,
}

impl<Q: WorkQueue> Loader<Q> {
    pub fn new(queue: Q, config: LoadConfig) -> Self {
        Self { queue, config }
    }

    /// Load domains from a text file decoded with `encoding` (a WHATWG label
    /// such as `gbk` or `utf-8`).
    pub async fn load_from_file(
        &self,
        path: &Path,
        encoding: &str,
    ) -> Result<LoadSummary, AppError> {
        let encoding = Encoding::for_label(encoding.as_bytes()).ok_or_else(|| {
            AppError::ConfigError(format!("Unknown file encoding '{encoding}'"))
        })?;
        let mut file = tokio::fs::File::open(path).await?;

        self.clear_if_configured().await?;
        tracing::info!(path = %path.display(), encoding = encoding.name(), "Loading domains from file");

        let mut pusher = BatchPusher::new(&self.queue, self.config.batch_size);
        let mut decoder = encoding.new_decoder_with_bom_removal();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut text = String::new();

        loop {
            let n = file.read(&mut buf).await?;
            let last = n == 0;
            text.reserve(decoder.max_utf8_buffer_length(n).unwrap_or(n * 3 + 16));
            let (_, _, had_errors) = decoder.decode_to_string(&buf[..n], &mut text, last);
            if had_errors {
                tracing::debug!("Replaced undecodable bytes in domain file");
            }

            while let Some(pos) = text.find('\n') {
                let line: String = text.drain(..=pos).collect();
                if let Some(domain) = domain_token(&line) {
                    pusher.add(domain.to_string()).await?;
                }
            }

            if last {
                break;
            }
        }

        // Final line without a trailing newline
        if let Some(domain) = domain_token(&text) {
            pusher.add(domain.to_string()).await?;
        }

        let summary = pusher.finish().await?;
        tracing::info!(domains = summary.domains, batches = summary.batches, "File load complete");
        Ok(summary)
    }

    /// Load domains from the first column of a relational query.
    pub async fn load_from_query<D: DomainSource>(
        &self,
        source: &mut D,
        query: &str,
    ) -> Result<LoadSummary, AppError> {
        self.clear_if_configured().await?;
        tracing::info!(%query, "Loading domains from query");

        let mut pusher = BatchPusher::new(&self.queue, self.config.batch_size);
        let mut rows = source.domains(query);
        while let Some(domain) = rows.try_next().await? {
            let domain = domain.trim();
            if !domain.is_empty() {
                pusher.add(domain.to_string()).await?;
            }
        }

        let summary = pusher.finish().await?;
        tracing::info!(domains = summary.domains, batches = summary.batches, "Query load complete");
        Ok(summary)
    }

    async fn clear_if_configured(&self) -> Result<(), AppError> {
        if self.config.clear_before_load {
            tracing::info!("Clearing work queue");
            self.queue.clear().await?;
        }
        Ok(())
    }
}

/// Buffers domains and pushes them in fixed-size batches.
struct BatchPusher<'a, Q: WorkQueue> {
    queue: &'a Q,
    batch: Vec<String>,
    batch_size: usize,
    summary: LoadSummary,
}

impl<'a, Q: WorkQueue> BatchPusher<'a, Q> {
    fn new(queue: &'a Q, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            queue,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            summary: LoadSummary::default(),
        }
    }

    async fn add(&mut self, domain: String) -> Result<(), AppError> {
        self.batch.push(domain);
        if self.batch.len() == self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), AppError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.queue.push(&self.batch).await?;
        self.summary.domains += self.batch.len();
        self.summary.batches += 1;
        self.batch.clear();
        Ok(())
    }

    async fn finish(mut self) -> Result<LoadSummary, AppError> {
        self.flush().await?;
        Ok(self.summary)
    }
}
