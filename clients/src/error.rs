//! HTTP-boundary error type, classified into the core's transient/permanent
//! split at the point each concrete client hands control back to the
//! pipeline (§7 error table).

use ingest_core::error::IngestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {source}")]
    Request { endpoint: String, source: reqwest::Error },

    #[error("{endpoint} responded with {status}: {body}")]
    Status { endpoint: String, status: reqwest::StatusCode, body: String },

    #[error("could not parse {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request { endpoint: endpoint.into(), source }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode { endpoint: endpoint.into(), message: message.into() }
    }

    /// Whether the wire-level failure looks transient (§7: connection
    /// refused, 5xx, timeout) as opposed to permanent (4xx, unparseable
    /// body).
    fn is_transient(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_timeout() || source.is_connect() || source.status().is_none(),
            Self::Status { status, .. } => status.is_server_error(),
            Self::Decode { .. } => false,
        }
    }

    /// Convert into the core's error type, preserving the transient/permanent
    /// classification the retry helper acts on.
    pub fn into_ingest_error(self, endpoint: &str) -> IngestError {
        let message = self.to_string();
        if self.is_transient() {
            IngestError::transient(endpoint, message)
        } else {
            IngestError::permanent(endpoint, message)
        }
    }
}

/// Map a non-2xx response into a `ClientError::Status`, draining the body
/// for the error message.
pub async fn require_success(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { endpoint: endpoint.to_string(), status, body })
}
