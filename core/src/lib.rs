//! Cross-cutting traits, the ingestion pipeline, and the Event Coordinator
//! for the document ingestion and search-consistency engine.
//!
//! This crate provides:
//! - External collaborator contracts (`traits`)
//! - Error handling (`error`)
//! - Logging setup (`logging`)
//! - Configuration loading (`config`)
//! - Retry with backoff (`retry`)
//! - Lane-routed work dispatch (`bus`)
//! - The per-document ingestion pipeline (`pipeline`)
//! - The Event Coordinator: scan, queue, and reconciliation sources (`coordinator`)
//! - Pipeline-wide running totals (`aggregate`)

pub mod aggregate;
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod retry;
pub mod traits;

pub use coordinator::Coordinator;
pub use error::{IngestError, Result};
pub use pipeline::Pipeline;
