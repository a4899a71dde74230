//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Network(NetworkError),

    #[error(transparent)]
    Session(SessionError),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

impl From<SessionError> for CoreError {
    fn from(e: SessionError) -> Self {
        CoreError::Session(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid URL format for '{field}': '{url}'")]
    InvalidUrl { field: String, url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid range for '{field}': min {min} is greater than max {max}")]
    InvalidRange { field: String, min: u64, max: u64 },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

/// Network and HTTP-related errors
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Rate limited by {endpoint}: retry after {retry_after}s")]
    RateLimited { endpoint: String, retry_after: u64 },

    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Proxy {proxy} is unreachable: {reason}")]
    ProxyUnreachable { proxy: String, reason: String },
}

/// Session and credential errors
///
/// `InvalidSession` is the only fatal kind: a worker that sees it stops
/// for that account instead of retrying.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("Invalid session '{session}': {reason}")]
    InvalidSession { session: String, reason: String },
}

impl SessionError {
    pub fn invalid(session: impl Into<String>, reason: impl Into<String>) -> Self {
        SessionError::InvalidSession {
            session: session.into(),
            reason: reason.into(),
        }
    }
}

/// Returns true if the error chain carries a fatal [`SessionError`].
pub fn is_fatal_session_error(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| cause.downcast_ref::<SessionError>().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_session_error_detected_through_context() {
        let err = anyhow::Error::from(SessionError::invalid("acc-1", "no token"))
            .context("authenticate failed");
        assert!(is_fatal_session_error(&err));
    }

    #[test]
    fn test_network_error_is_not_fatal() {
        let err: anyhow::Error = NetworkError::HttpError {
            status_code: 502,
            endpoint: "/clicker/tap".to_string(),
        }
        .into();
        assert!(!is_fatal_session_error(&err));

        let wrapped = Err::<(), _>(err).context("tap failed").unwrap_err();
        assert!(!is_fatal_session_error(&wrapped));
    }

    #[test]
    fn test_core_error_display_is_transparent() {
        let err = CoreError::from(ConfigError::InvalidRange {
            field: "random_taps_count".to_string(),
            min: 10,
            max: 5,
        });
        assert_eq!(
            err.to_string(),
            "Invalid range for 'random_taps_count': min 10 is greater than max 5"
        );
    }
}
