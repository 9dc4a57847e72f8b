//! Error types for the access map pipeline.
//!
//! Most of these never reach the user: the cache layer absorbs transport and
//! parse failures and hands back stale or empty data instead. They still exist
//! as values so that every layer can log exactly what went wrong.

use thiserror::Error;

/// Result type alias using `AccessError`.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Main error type for all access map operations.
#[derive(Debug, Error)]
pub enum AccessError {
    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Network unreachable, connection reset, or request deadline exceeded.
    #[error("Request to '{url}' failed: {reason}")]
    TransportFailure {
        /// Requested URL
        url: String,
        /// Underlying client error
        reason: String,
    },

    /// Upstream answered with a non-2xx status.
    #[error("Request to '{url}' returned HTTP {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Persisted cache entry could not be decoded.
    #[error("Malformed cache entry '{key}': {reason}")]
    MalformedCache {
        /// Cache key
        key: String,
        /// Decode error
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // DATA ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Feed text could not be interpreted (no header row, bad date).
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Fetch succeeded but yielded zero usable records.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// A record failed boundary validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION / STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AccessError {
    /// Builds a transport failure for `url`.
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        AccessError::TransportFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for failures that happened on the wire.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AccessError::TransportFailure { .. } | AccessError::HttpStatus { .. }
        )
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        match self {
            AccessError::TransportFailure { .. } => true,
            AccessError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this is a data interpretation error.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AccessError::ParseFailure(_)
                | AccessError::EmptyResult(_)
                | AccessError::InvalidRecord(_)
                | AccessError::JsonError(_)
        )
    }
}
