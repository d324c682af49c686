//! The unit of work passed from the Event Coordinator to the Ingestion
//! Pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkKind {
    Create,
    Delete,
}

/// Where a `WorkEvent` originated. Used only for logging/metrics; the
/// pipeline's behavior does not branch on origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Scan,
    Queue,
    Reconcile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkEvent {
    pub kind: WorkKind,
    pub storage_key: String,
    pub origin: EventOrigin,
    pub enqueued_at: DateTime<Utc>,
}

impl WorkEvent {
    pub fn new(kind: WorkKind, storage_key: impl Into<String>, origin: EventOrigin) -> Self {
        Self { kind, storage_key: storage_key.into(), origin, enqueued_at: Utc::now() }
    }

    pub fn create(storage_key: impl Into<String>, origin: EventOrigin) -> Self {
        Self::new(WorkKind::Create, storage_key, origin)
    }

    pub fn delete(storage_key: impl Into<String>, origin: EventOrigin) -> Self {
        Self::new(WorkKind::Delete, storage_key, origin)
    }
}
