//! Terminal outcomes and per-phase timings for one `WorkEvent`.

use serde::{Deserialize, Serialize};

/// Every `WorkEvent` resolves to exactly one of these (§4.D "Failure
/// isolation"). A `Failed` document never stops the coordinator from
/// processing others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Chunks were embedded and written to the index.
    Indexed { chunk_count: usize },
    /// Content already indexed under a different `storage_key`.
    Duplicate { original_storage_key: String },
    /// Identical content already indexed under this exact `storage_key`.
    Unchanged,
    /// `delete_by_storage_key` ran; `records_removed` may be 0.
    Deleted { records_removed: u64 },
    /// `cleaned_text` was empty after extraction.
    Empty,
    /// Terminal failure; not retried further by this event.
    Failed { reason: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Indexed { .. } => "indexed",
            Outcome::Duplicate { .. } => "duplicate",
            Outcome::Unchanged => "unchanged",
            Outcome::Deleted { .. } => "deleted",
            Outcome::Empty => "empty",
            Outcome::Failed { .. } => "failed",
        }
    }
}

/// Per-phase timing breakdown for one CREATE event (§4.D point 9). A
/// value-typed record with one field per phase, assembled by the pipeline
/// as each phase completes — replacing the teacher's mutable
/// hand-off-through-nested-functions pattern with a single struct built up
/// phase by phase (see §9, design notes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub fetch_ms: u64,
    pub extract_ms: u64,
    pub hash_ms: u64,
    pub dedup_ms: u64,
    pub chunk_ms: u64,
    pub embed_ms: u64,
    pub index_ms: u64,
}

impl PhaseTimings {
    pub fn total_ms(&self) -> u64 {
        self.fetch_ms + self.extract_ms + self.hash_ms + self.dedup_ms + self.chunk_ms + self.embed_ms + self.index_ms
    }
}
