//! Content fingerprinting (§3 "ContentFingerprint", §4.A step 5).
//!
//! Adapted from the teacher's content-addressable-storage hash: same
//! SHA-256-over-UTF-8-bytes approach, but fingerprints `cleaned_text`
//! (post-cleaning, pre-chunking) rather than raw stored bytes, and
//! returns the full hex digest rather than a truncated docid — the
//! index's dedup lookup needs the whole thing to avoid collisions.

use sha2::{Digest, Sha256};

use ingest_model::ContentFingerprint;

/// `hash(clean(x))` — a pure function of the cleaned text (§8 "Fingerprint stability").
pub fn fingerprint(cleaned_text: &str) -> ContentFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(cleaned_text.as_bytes());
    ContentFingerprint::from_hex(hex::encode(hasher.finalize()))
}
