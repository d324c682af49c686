//! External collaborator contracts the pipeline and coordinator depend
//! on (§6 "External interfaces"): object store, event queue, embedding
//! backend, search index. The OCR backend contract lives in
//! `ingest_extract` instead, since it is a parameter of extraction, not
//! something the pipeline calls directly.
//!
//! The pipeline and coordinator depend only on these traits, never on
//! `ingest-clients` directly — mirrors how the teacher's agent core
//! depends on `Provider` rather than on any concrete LLM client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest_model::StorageObject;

use crate::error::Result;

/// Metadata for one object under a configured prefix, returned by a
/// paginated `list` call.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub storage_key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
}

/// A page of `list` results plus an opaque continuation token.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectMetadata>,
    pub continuation_token: Option<String>,
}

/// Object-store access (§6 "Object store").
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List objects under `prefix`, paginated via `continuation_token`.
    async fn list(&self, prefix: &str, continuation_token: Option<&str>) -> Result<ObjectPage>;

    /// Fetch metadata only, without downloading the body. `None` if the key is gone.
    async fn head(&self, storage_key: &str) -> Result<Option<StorageObject>>;

    /// Download the full object body. `None` if the key is gone.
    async fn get(&self, storage_key: &str) -> Result<Option<Vec<u8>>>;
}

/// One decoded queue message: possibly several WorkEvents, plus the
/// receipt handle needed to delete it once all of them reach a
/// terminal outcome (§4.E "Queue subscription").
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub receipt_handle: String,
    pub events: Vec<ingest_model::WorkEvent>,
}

/// Event-queue access (§6 "Event queue").
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Long-poll for up to `max_messages` messages.
    async fn receive(&self, max_messages: u32) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a message so it is not redelivered.
    async fn delete(&self, receipt_handle: &str) -> Result<()>;
}

/// Embedding backend (§4.B "Embedding call").
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of chunk texts, in order. The returned vectors are
    /// in the same order as `texts`; implementations MUST fail the
    /// whole batch rather than return a partial or reordered result.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector dimension, discovered once at startup and cached by the caller.
    fn dimension(&self) -> Option<usize>;
}

/// Search index (§4.C "Index Driver").
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index with its declared mapping if it does not already exist.
    async fn ensure_index(&self) -> Result<()>;

    /// First existing storage_key already holding this content, if any.
    async fn lookup_by_fingerprint(&self, fingerprint: &str) -> Result<Option<String>>;

    /// Delete-then-insert all records for `storage_key`.
    async fn upsert_document(
        &self,
        storage_key: &str,
        chunks: &[ingest_model::EmbeddedChunk],
        fingerprint: &str,
    ) -> Result<()>;

    /// Remove all records for `storage_key`; returns the count removed.
    async fn delete_by_storage_key(&self, storage_key: &str) -> Result<u64>;

    /// Distinct storage_keys currently in the index, paginated.
    async fn list_storage_keys(&self, continuation_token: Option<&str>) -> Result<(Vec<String>, Option<String>)>;
}
