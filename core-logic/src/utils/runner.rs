use crate::traits::{Worker, WorkerStats};
use anyhow::Result;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Spawns every worker as its own task and waits for all of them.
    /// Ctrl+C cancels the shared token so each worker can wind down.
    pub async fn run_workers(workers: Vec<Box<dyn Worker>>) -> Result<WorkerStats> {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!(target: "task_result", "🛑 Received Ctrl+C. Initiating graceful shutdown...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        Self::run_workers_until(workers, token).await
    }

    /// Same as [`WorkerRunner::run_workers`] but driven by a caller-owned token.
    pub async fn run_workers_until(
        workers: Vec<Box<dyn Worker>>,
        token: CancellationToken,
    ) -> Result<WorkerStats> {
        let mut set = JoinSet::new();

        let start_time = std::time::Instant::now();
        info!(target: "task_result", "Starting {} account workers...", workers.len());

        for (i, worker) in workers.into_iter().enumerate() {
            let span = tracing::info_span!(
                "worker",
                worker_id = format!("{:03}", i + 1),
                account = worker.name().to_string()
            );
            let child_token = token.child_token();

            set.spawn(
                async move {
                    let result = worker.start(child_token).await;
                    if let Err(e) = worker.stop().await {
                        error!("{} | Cleanup failed: {:?}", worker.name(), e);
                    }
                    match result {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!(target: "task_result", "{} | Worker stopped: {:#}", worker.name(), e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut total = WorkerStats::default();

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(stats)) => {
                    total.success += stats.success;
                    total.failed += stats.failed;
                }
                Ok(Err(_)) => {
                    // Already logged inside the task; counts as one failed worker
                    total.failed += 1;
                }
                Err(e) => {
                    error!("A worker task panicked or failed to join: {:?}", e);
                    total.failed += 1;
                }
            }
        }

        let total_duration = start_time.elapsed();
        let count = total.success + total.failed;
        let rate = if count > 0 {
            (total.success as f64 / count as f64) * 100.0
        } else {
            0.0
        };

        info!(target: "task_result", "🛑 Shutdown Complete.");
        info!(
            target: "task_result",
            "Total Time: {:.1}s | Total Success: {} | Total Fail: {} | Success Rate: {:.2}%",
            total_duration.as_secs_f64(),
            total.success,
            total.failed,
            rate
        );

        Ok(total)
    }
}
