//! The OCR backend contract (§4.A "OCR service selection").
//!
//! Extraction depends on this trait, never on a concrete fast-path or
//! LLM-path HTTP client — `ingest-clients` supplies the implementation,
//! mirroring how the teacher's `Provider` trait decouples the agent
//! core from any one LLM vendor.

use async_trait::async_trait;

use crate::error::Result;

/// One page (from a rendered PDF page) or one whole image file, ready
/// to send to OCR.
pub struct OcrUnit {
    pub page_index: usize,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Extract text from a single page or image. Retried by the caller
    /// on transient failure (§4.A: 3 attempts, exponential backoff).
    async fn extract_text(&self, unit: &OcrUnit) -> Result<String>;
}
