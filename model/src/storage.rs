//! Objects as they exist in the external object store, and their in-memory
//! snapshots once fetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object in the external object store. Identity is `storage_key`; the
/// core never mutates the store, it only reads and (via delete events)
/// reacts to removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    pub storage_key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
}

impl StorageObject {
    pub fn new(
        storage_key: impl Into<String>,
        size: u64,
        last_modified: DateTime<Utc>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            size,
            last_modified,
            content_type: content_type.into(),
        }
    }

    /// Suffix-based content type inference, case-insensitive, matching the
    /// dispatch rules in the Content Extractor.
    pub fn infer_content_type(storage_key: &str) -> &'static str {
        let lower = storage_key.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            "application/pdf"
        } else if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else if lower.ends_with(".tiff") {
            "image/tiff"
        } else if lower.ends_with(".docx") {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        } else if lower.ends_with(".xlsx") {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        } else if lower.ends_with(".xls") {
            "application/vnd.ms-excel"
        } else if lower.ends_with(".csv") {
            "text/csv"
        } else if lower.ends_with(".txt") {
            "text/plain"
        } else {
            "application/octet-stream"
        }
    }
}

/// An in-memory snapshot of one `StorageObject`, downloaded for extraction.
/// Discarded once the Content Extractor has produced an `ExtractedDocument`.
#[derive(Clone)]
pub struct RawDocument {
    pub storage_key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub size: u64,
}

impl RawDocument {
    pub fn new(storage_key: impl Into<String>, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        let bytes_len = bytes.len() as u64;
        Self {
            storage_key: storage_key.into(),
            bytes,
            content_type: content_type.into(),
            size: bytes_len,
        }
    }

    /// File extension (lowercase, without the dot), used for format dispatch.
    pub fn extension(&self) -> Option<String> {
        self.storage_key
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.storage_key)
            .map(|ext| ext.to_ascii_lowercase())
    }
}
