use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub success: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// One long-running job bound to a single account.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Name used for log spans and summaries
    fn name(&self) -> &str;

    /// Run until the token is cancelled or a fatal error occurs
    async fn start(&self, cancellation_token: CancellationToken) -> Result<WorkerStats>;

    /// Release any held resources
    async fn stop(&self) -> Result<()>;
}
