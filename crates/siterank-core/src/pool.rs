use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::WorkerConfig;
use crate::error::AppError;
use crate::traits::{Fetcher, RankParser, SinkFactory, WorkQueue};
use crate::worker::{RankWorker, WorkerReporter, WorkerStats};

/// Totals over every worker in a pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    pub workers_finished: usize,
    pub workers_failed: usize,
    pub processed: usize,
    pub persisted: usize,
    pub parse_failures: usize,
    pub persist_failures: usize,
}

impl PoolSummary {
    fn absorb(&mut self, stats: &WorkerStats) {
        self.workers_finished += 1;
        self.processed += stats.processed;
        self.persisted += stats.persisted;
        self.parse_failures += stats.parse_failures;
        self.persist_failures += stats.persist_failures;
    }
}

/// Spawns a fixed number of independent workers that drain the queue.
///
/// Workers share nothing but the external queue: each gets its own queue
/// handle, fetcher and parser clones, and a sink of its own from the factory.
/// A worker that fails or panics is not restarted; the others carry on.
pub struct WorkerPool<Q, F, P, SF>
where
    Q: WorkQueue,
    F: Fetcher,
    P: RankParser,
    SF: SinkFactory,
{
    queue: Q,
    fetcher: F,
    parser: P,
    sinks: SF,
    config: WorkerConfig,
}

impl<Q, F, P, SF> WorkerPool<Q, F, P, SF>
where
    Q: WorkQueue + 'static,
    F: Fetcher + 'static,
    P: RankParser + 'static,
    SF: SinkFactory + 'static,
    SF::Sink: 'static,
{
    pub fn new(queue: Q, fetcher: F, parser: P, sinks: SF, config: WorkerConfig) -> Self {
        Self {
            queue,
            fetcher,
            parser,
            sinks,
            config,
        }
    }

    /// Start `count` workers and wait until every one of them has stopped.
    pub async fn run<WR>(&self, count: usize, reporter: Arc<WR>) -> PoolSummary
    where
        WR: WorkerReporter + 'static,
    {
        tracing::info!(workers = count, "Starting worker pool");

        let mut tasks = JoinSet::new();
        for index in 0..count {
            let worker_id = self.config.worker_id(index);
            let queue = self.queue.clone();
            let fetcher = self.fetcher.clone();
            let parser = self.parser.clone();
            let sinks = self.sinks.clone();
            let reporter = Arc::clone(&reporter);

            tasks.spawn(async move {
                let result: Result<WorkerStats, AppError> = async {
                    let sink = sinks.create().await?;
                    RankWorker::new(worker_id.clone(), queue, fetcher, parser, sink)
                        .run(reporter.as_ref())
                        .await
                }
                .await;
                (worker_id, result)
            });
        }

        let mut summary = PoolSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(stats))) => summary.absorb(&stats),
                Ok((worker_id, Err(e))) => {
                    summary.workers_failed += 1;
                    tracing::error!(%worker_id, error = %e, "Worker failed");
                }
                Err(e) => {
                    summary.workers_failed += 1;
                    tracing::error!(error = %e, "Worker crashed");
                }
            }
        }

        tracing::info!(
            finished = summary.workers_finished,
            failed = summary.workers_failed,
            processed = summary.processed,
            persisted = summary.persisted,
            "Worker pool finished"
        );
        summary
    }
}
