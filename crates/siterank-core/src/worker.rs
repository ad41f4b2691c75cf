use chrono::{Local, NaiveDateTime};

use crate::error::AppError;
use crate::models::{CRAWL_TIME_FORMAT, RankFields, RankResult};
use crate::traits::{Fetcher, RankParser, ResultSink, WorkQueue};

/// Events emitted by the worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        worker_id: &'a str,
    },
    DomainClaimed {
        worker_id: &'a str,
        domain: &'a str,
    },
    PageFetched {
        domain: &'a str,
        bytes: usize,
    },
    ResultPersisted {
        domain: &'a str,
        ranks: &'a RankFields,
        crawled_at: NaiveDateTime,
    },
    ParseFailed {
        domain: &'a str,
        error: &'a str,
    },
    PersistFailed {
        domain: &'a str,
        error: &'a str,
    },
    QueueDrained {
        worker_id: &'a str,
    },
    Stopped {
        worker_id: &'a str,
        stats: &'a WorkerStats,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started { worker_id } => {
                tracing::info!(%worker_id, "Worker started");
            }
            WorkerEvent::DomainClaimed { worker_id, domain } => {
                tracing::info!(%worker_id, %domain, "Crawling");
            }
            WorkerEvent::PageFetched { domain, bytes } => {
                tracing::debug!(%domain, %bytes, "Fetched ranking page");
            }
            WorkerEvent::ResultPersisted {
                domain,
                ranks,
                crawled_at,
            } => {
                let [china, global, china_visitors, global_alt] = ranks.codes();
                tracing::debug!(
                    %domain,
                    china,
                    global,
                    china_visitors,
                    global_alt,
                    crawled_at = %crawled_at.format(CRAWL_TIME_FORMAT),
                    "Result saved"
                );
            }
            WorkerEvent::ParseFailed { domain, error } => {
                tracing::error!(%domain, %error, "Failed to parse ranking page");
            }
            WorkerEvent::PersistFailed { domain, error } => {
                tracing::error!(%domain, %error, "Failed to save result");
            }
            WorkerEvent::QueueDrained { worker_id } => {
                tracing::info!(%worker_id, "Work queue empty");
            }
            WorkerEvent::Stopped { worker_id, stats } => {
                tracing::info!(
                    %worker_id,
                    processed = stats.processed,
                    persisted = stats.persisted,
                    parse_failures = stats.parse_failures,
                    persist_failures = stats.persist_failures,
                    "Worker stopped"
                );
            }
        }
    }
}

/// Per-worker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Domains claimed from the queue.
    pub processed: usize,
    pub persisted: usize,
    pub parse_failures: usize,
    pub persist_failures: usize,
}

/// One worker: claims domains until the queue is empty.
///
/// Delivery is at-most-once. A domain popped from the queue is never pushed
/// back, whether or not its result makes it to the sink.
pub struct RankWorker<Q, F, P, S>
where
    Q: WorkQueue,
    F: Fetcher,
    P: RankParser,
    S: ResultSink,
{
    worker_id: String,
    queue: Q,
    fetcher: F,
    parser: P,
    sink: S,
}

impl<Q, F, P, S> RankWorker<Q, F, P, S>
where
    Q: WorkQueue,
    F: Fetcher,
    P: RankParser,
    S: ResultSink,
{
    pub fn new(worker_id: impl Into<String>, queue: Q, fetcher: F, parser: P, sink: S) -> Self {
        Self {
            worker_id: worker_id.into(),
            queue,
            fetcher,
            parser,
            sink,
        }
    }

    /// Run the worker loop until the queue is empty.
    ///
    /// Only a failing `pop` ends the loop early; fetch, parse and persist
    /// failures are confined to the domain being processed.
    pub async fn run<WR: WorkerReporter>(mut self, reporter: &WR) -> Result<WorkerStats, AppError> {
        reporter.report(WorkerEvent::Started {
            worker_id: &self.worker_id,
        });

        let mut stats = WorkerStats::default();

        while let Some(domain) = self.queue.pop().await? {
            reporter.report(WorkerEvent::DomainClaimed {
                worker_id: &self.worker_id,
                domain: &domain,
            });
            stats.processed += 1;
            self.process(&domain, &mut stats, reporter).await;
        }

        reporter.report(WorkerEvent::QueueDrained {
            worker_id: &self.worker_id,
        });
        reporter.report(WorkerEvent::Stopped {
            worker_id: &self.worker_id,
            stats: &stats,
        });

        Ok(stats)
    }

    async fn process<WR: WorkerReporter>(
        &mut self,
        domain: &str,
        stats: &mut WorkerStats,
        reporter: &WR,
    ) {
        let page = self.fetcher.fetch(domain).await;
        reporter.report(WorkerEvent::PageFetched {
            domain,
            bytes: page.len(),
        });

        // HTML parsing is CPU-bound; keep it off the async worker threads.
        let parser = self.parser.clone();
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&page)).await;
        let ranks = match parsed {
            Ok(ranks) => ranks,
            Err(e) => {
                let error = if e.is_panic() {
                    panic_message(e.into_panic().as_ref())
                } else {
                    e.to_string()
                };
                reporter.report(WorkerEvent::ParseFailed {
                    domain,
                    error: &error,
                });
                stats.parse_failures += 1;
                return;
            }
        };

        let result = RankResult::new(domain, ranks, Local::now().naive_local());
        match self.sink.persist(&result).await {
            Ok(()) => {
                stats.persisted += 1;
                reporter.report(WorkerEvent::ResultPersisted {
                    domain,
                    ranks: &result.ranks,
                    crawled_at: result.crawled_at,
                });
            }
            Err(e) => {
                stats.persist_failures += 1;
                let error = e.to_string();
                reporter.report(WorkerEvent::PersistFailed {
                    domain,
                    error: &error,
                });
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "parser panicked".to_string()
    }
}
