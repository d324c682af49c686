//! A contiguous token-window of cleaned text, with its embedding once
//! computed.

/// A chunk of cleaned text prior to embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// 0-based position within the document's chunk sequence.
    pub chunk_index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(chunk_index: usize, text: impl Into<String>) -> Self {
        Self { chunk_index, text: text.into() }
    }
}

/// A chunk plus its dense embedding, ready for indexing.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk_index: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk_index: chunk.chunk_index, text: chunk.text, vector }
    }
}
