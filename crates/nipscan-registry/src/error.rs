//! Error types for registry lookups.

use thiserror::Error;

/// Errors that can occur during a registry lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The registry answered but has no entity for this identifier
    #[error("no registered entity for NIP {nip}")]
    NotFound {
        /// Identifier that was looked up
        nip: String,
    },

    /// Connection failure, timeout or non-success HTTP status
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status code, when a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The registry answered with a body that does not parse
    #[error("invalid registry response: {message}")]
    InvalidResponse {
        /// Error message
        message: String,
    },

    /// Externally supplied identifier failed local validation
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl LookupError {
    /// Whether this is one of the routine per-attempt outcomes.
    ///
    /// Most candidates do not correspond to a registered entity, so
    /// `NotFound`, `Transport` and `InvalidResponse` are expected at high
    /// frequency and never end a run.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Transport { .. } | Self::InvalidResponse { .. }
        )
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// Result type alias for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
