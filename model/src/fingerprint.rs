//! The dedup key: a 256-bit digest of a document's cleaned text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressable fingerprint of `cleaned_text`. Two documents with
/// byte-identical cleaned text always produce identical fingerprints
/// (invariant, see spec §3 "ContentFingerprint").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Construct from an already-computed lowercase hex digest. Hashing
    /// itself lives in `ingest-extract` (it needs no model-crate
    /// dependency on `sha2`); this type is just the stable, serializable
    /// wrapper around the result.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
