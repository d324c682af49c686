//! Error types for the ingestion core.
//!
//! One variant family per external boundary, each tagged with whether it's
//! retryable — this mirrors the error-kind table in the pipeline design
//! (transient network errors retry with backoff; permanent errors fail the
//! document immediately).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Connection refused, 5xx, timeout — retried with backoff before
    /// escalating to a permanent failure.
    #[error("transient network error calling {endpoint}: {message}")]
    Transient { endpoint: String, message: String },

    /// 4xx on GET, corrupt archive, unrecognized format — never retried.
    #[error("permanent error calling {endpoint}: {message}")]
    Permanent { endpoint: String, message: String },

    /// Embedding response length did not match the dimension discovered at
    /// startup.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Batch embedding response came back out of order or the wrong size.
    #[error("embedding batch response mismatch: {0}")]
    BatchMismatch(String),

    /// Extraction produced zero chunks or failed outright.
    #[error("extraction failed for {storage_key}: {message}")]
    Extraction { storage_key: String, message: String },

    /// Index write failed with a non-transient error.
    #[error("index write failed for {storage_key}: {message}")]
    IndexWrite { storage_key: String, message: String },

    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error reading local configuration or state.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant violation; should not happen in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    pub fn transient(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient { endpoint: endpoint.into(), message: message.into() }
    }

    pub fn permanent(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Permanent { endpoint: endpoint.into(), message: message.into() }
    }

    pub fn extraction(storage_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction { storage_key: storage_key.into(), message: message.into() }
    }

    pub fn index_write(storage_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexWrite { storage_key: storage_key.into(), message: message.into() }
    }

    /// Whether this error should be retried with backoff (§7 error table:
    /// only transient network errors are retryable).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
