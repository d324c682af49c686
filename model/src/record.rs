//! One entry in the search index — a single chunk of a single document.

use crate::fingerprint::ContentFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `IndexedRecord` per chunk of a document. `record_id` is deterministic
/// from `storage_key` and `chunk_index` so re-indexing the same document
/// overwrites rather than accumulates (see Index Driver, §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub record_id: String,
    pub storage_key: String,
    pub file_name: String,
    pub file_type: String,
    pub content: String,
    pub content_hash: String,
    pub vector: Vec<f32>,
    pub chunk_index: usize,
    pub chunk_count: usize,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedRecord {
    /// Deterministic id: same storage_key + chunk_index always yields the
    /// same id, which is what makes `upsert_document`'s delete-then-insert
    /// idempotent across retries.
    pub fn record_id(storage_key: &str, chunk_index: usize) -> String {
        format!("{storage_key}#{chunk_index}")
    }

    pub fn file_name(storage_key: &str) -> String {
        storage_key.rsplit('/').next().unwrap_or(storage_key).to_string()
    }

    pub fn file_type(storage_key: &str) -> String {
        storage_key
            .rsplit('.')
            .next()
            .filter(|ext| *ext != storage_key)
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage_key: &str,
        content: impl Into<String>,
        content_hash: &ContentFingerprint,
        vector: Vec<f32>,
        chunk_index: usize,
        chunk_count: usize,
        indexed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: Self::record_id(storage_key, chunk_index),
            storage_key: storage_key.to_string(),
            file_name: Self::file_name(storage_key),
            file_type: Self::file_type(storage_key),
            content: content.into(),
            content_hash: content_hash.as_str().to_string(),
            vector,
            chunk_index,
            chunk_count,
            indexed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_deterministic() {
        assert_eq!(IndexedRecord::record_id("a/b.txt", 2), "a/b.txt#2");
        assert_eq!(IndexedRecord::record_id("a/b.txt", 2), IndexedRecord::record_id("a/b.txt", 2));
    }

    #[test]
    fn file_name_and_type_from_key() {
        assert_eq!(IndexedRecord::file_name("docs/a/report.pdf"), "report.pdf");
        assert_eq!(IndexedRecord::file_type("docs/a/report.pdf"), "pdf");
        assert_eq!(IndexedRecord::file_type("README"), "");
    }
}
