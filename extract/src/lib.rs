//! Content extraction, cleaning, chunking, and fingerprinting.
//!
//! Transforms a `RawDocument` into chunked, fingerprinted text ready
//! for embedding (§4.A "Content Extractor", §4.B "Chunker").

pub mod chunker;
pub mod cleaning;
pub mod error;
pub mod extractor;
pub mod fingerprint;
pub mod ocr;
pub mod pdf;

pub use chunker::{chunk, ChunkerConfig};
pub use cleaning::clean;
pub use error::{ExtractError, Result};
pub use extractor::extract;
pub use fingerprint::fingerprint;
pub use ocr::{OcrBackend, OcrUnit};
