//! # Core Logic - Shared Utilities for Game Automation Workers
//!
//! This crate provides the game-agnostic plumbing used by every per-game crate
//! in the workspace: error types, proxy handling, logging, backoff and the
//! worker runner that drives one task per account.
//!
//! ## Modules
//!
//! - [`config`] - Configuration structures shared by all games (proxies)
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Core trait definitions
//! - [`utils`] - Utility modules (logger, proxy loading, retry, runner)

// Module declarations - internal modules marked pub(crate)
pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

// Selective exports - only public API types
pub use config::ProxyConfig;
pub use error::{is_fatal_session_error, ConfigError, CoreError, NetworkError, SessionError};
pub use traits::{Worker, WorkerStats};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{setup_logger, ProxyManager, WorkerRunner};

// Export retry utilities for the worker loops and their tests
pub use utils::retry::{is_transient_error, with_retry, RetryConfig};
