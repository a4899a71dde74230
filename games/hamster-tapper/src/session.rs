//! Session Manager - transport and access token freshness
//!
//! Tokens are valid for one hour. A refresh always rebuilds the transport so
//! a proxy connection torn down during a long sleep never leaks into the next
//! session.

use crate::api::GameApi;
use anyhow::{Context, Result};
use core_logic::SessionError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

pub const TOKEN_VALIDITY: Duration = Duration::from_secs(3600);

#[derive(Debug)]
pub struct SessionManager {
    session_name: String,
    token_issued_at: Option<Instant>,
    validity: Duration,
}

impl SessionManager {
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            token_issued_at: None,
            validity: TOKEN_VALIDITY,
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        match self.token_issued_at {
            Some(issued) => now.saturating_duration_since(issued) >= self.validity,
            None => true,
        }
    }

    pub fn needs_refresh<A: GameApi + ?Sized>(&self, api: &A, now: Instant) -> bool {
        api.is_closed() || self.is_stale(now)
    }

    /// Forces re-authentication on the next [`SessionManager::ensure_fresh_session`].
    pub fn invalidate(&mut self) {
        self.token_issued_at = None;
    }

    /// Refreshes transport and token when needed.
    ///
    /// Returns `true` if a new token was issued, so the caller knows game
    /// state must be re-synced. Fails with [`SessionError`] when the identity
    /// handshake cannot produce a usable token.
    pub async fn ensure_fresh_session<A: GameApi + ?Sized>(&mut self, api: &mut A) -> Result<bool> {
        if !self.needs_refresh(api, Instant::now()) {
            return Ok(false);
        }

        debug!("{} | Refreshing session", self.session_name);
        self.token_issued_at = None;

        api.connect().await.context("Failed to rebuild transport")?;
        api.bootstrap().await.context("Pre-auth handshake failed")?;

        let token = api.authenticate().await?;
        if token.trim().is_empty() {
            return Err(SessionError::invalid(&self.session_name, "empty access token").into());
        }

        api.set_bearer(&token);
        self.token_issued_at = Some(Instant::now());
        info!(target: "task_result", "{} | Session authorized", self.session_name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_staleness_follows_validity_window() {
        let mut session = SessionManager::new("acc").with_validity(Duration::from_secs(10));
        assert!(session.is_stale(Instant::now()));

        session.token_issued_at = Some(Instant::now());
        assert!(!session.is_stale(Instant::now()));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!session.is_stale(Instant::now()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(session.is_stale(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refresh() {
        let mut session = SessionManager::new("acc");
        session.token_issued_at = Some(Instant::now());
        assert!(!session.is_stale(Instant::now()));

        session.invalidate();
        assert!(session.is_stale(Instant::now()));
    }
}
