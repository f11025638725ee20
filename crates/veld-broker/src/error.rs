//! Identity broker error types.
//!
//! Error definitions with transient/terminal classification for retry logic.

use thiserror::Error;

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur when talking to the identity broker.
///
/// Only [`BrokerError::Unavailable`] and [`BrokerError::RateLimited`] are
/// transient; everything else is terminal for the current step and must be
/// surfaced to the caller rather than retried.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker could not be reached or answered with a server error.
    #[error("broker unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The broker rejected the request (4xx: bad input or conflict).
    #[error("broker rejected request: {status} {message}")]
    Rejected { status: u16, message: String },

    /// Admin credentials or token were not accepted.
    #[error("broker authentication failed: {0}")]
    Auth(String),

    /// The broker asked us to slow down.
    #[error("broker rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// The broker answered with a body we could not interpret.
    #[error("invalid broker response: {message}")]
    InvalidResponse { message: String },

    /// The client itself is misconfigured (bad base URL, unbuildable client).
    #[error("invalid broker configuration: {0}")]
    InvalidConfig(String),
}

impl BrokerError {
    /// Whether the operation may succeed if retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrokerError::Unavailable { .. } | BrokerError::RateLimited { .. }
        )
    }

    /// Create an unavailable error without a source.
    pub fn unavailable(message: impl Into<String>) -> Self {
        BrokerError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error wrapping an underlying cause.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BrokerError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        BrokerError::InvalidResponse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BrokerError::unavailable_with_source("request timed out", err)
        } else if err.is_connect() {
            BrokerError::unavailable_with_source("connection failed", err)
        } else if err.is_decode() {
            BrokerError::invalid_response(err.to_string())
        } else {
            BrokerError::unavailable_with_source("transport error", err)
        }
    }
}
