//! HTTP implementations of the `ingest-core` boundary traits: object
//! store, event queue, OCR, embedding service, and search index.
//!
//! Each module owns one external service and speaks whatever wire
//! contract §6 describes for it; `ingestd` wires the concrete types in
//! here to the trait objects `ingest-core` and `ingest-extract` expect.

pub mod embedding;
pub mod error;
pub mod http;
pub mod index;
pub mod object_store;
pub mod ocr;
pub mod queue;

pub use embedding::HttpEmbeddingBackend;
pub use error::ClientError;
pub use http::HttpConfig;
pub use index::HttpSearchIndex;
pub use object_store::HttpObjectStore;
pub use ocr::HttpOcrBackend;
pub use queue::HttpEventQueue;
