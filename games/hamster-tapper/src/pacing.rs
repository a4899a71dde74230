//! Cancellation-aware pauses.
//!
//! Every sleep in the tapper goes through [`Pacer`], so a stop request is
//! honoured at the top of any sleep and before the next network call.
//! In-flight calls are never interrupted.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Stop requested")]
pub struct StopRequested;

#[derive(Debug, Clone)]
pub struct Pacer {
    token: CancellationToken,
}

impl Pacer {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A pacer that is never cancelled.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails fast if a stop was requested.
    pub fn checkpoint(&self) -> Result<(), StopRequested> {
        if self.token.is_cancelled() {
            return Err(StopRequested);
        }
        Ok(())
    }

    /// Sleeps for `duration` unless a stop is requested first.
    pub async fn pause(&self, duration: Duration) -> Result<(), StopRequested> {
        self.checkpoint()?;
        if duration.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = self.token.cancelled() => Err(StopRequested),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// True when `err` was caused by a stop request rather than a failure.
pub fn is_stop_requested(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<StopRequested>().is_some())
}
