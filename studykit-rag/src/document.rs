//! Data types for documents, chunks, and retrieval results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator placed between chunk texts when building the context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Metadata for one ingested source document.
///
/// Written once at the end of a successful ingestion and replaced wholesale
/// on re-ingestion, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    /// Stable external key for the document (e.g. a book id).
    pub document_id: String,
    /// Length of the raw source text in characters.
    pub text_len: usize,
    /// Number of chunks stored for this document.
    pub chunk_count: usize,
    /// When ingestion completed.
    pub ingested_at: DateTime<Utc>,
}

/// A contiguous, offset-tracked segment of a source document.
///
/// Offsets are character offsets into the untrimmed source text; `text`
/// holds the trimmed window content. Chunks are append-only: created during
/// ingestion, never mutated, deleted only with the owning document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Store-generated unique identifier. Empty until the chunk has been
    /// persisted by a [`VectorStore`](crate::VectorStore).
    pub id: String,
    /// The id of the owning document.
    pub document_id: String,
    /// Zero-based position among the document's emitted chunks.
    pub chunk_index: usize,
    /// Character offset of the window start in the source text.
    pub start_offset: usize,
    /// Character offset one past the window end; always greater than
    /// `start_offset`.
    pub end_offset: usize,
    /// Trimmed window text.
    pub text: String,
    /// Embedding vector; empty until attached by the ingestion pipeline.
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity against the query embedding, in `[-1, 1]`.
    pub score: f32,
}

/// The outcome of a retrieval call: ranked chunks plus the joined context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Chunks ordered by descending score, ties broken by ascending
    /// `chunk_index`, truncated to the requested `top_k`.
    pub results: Vec<ScoredChunk>,
    /// The surviving chunk texts joined with [`CONTEXT_SEPARATOR`], ready to
    /// ground a downstream prompt.
    pub context: String,
}

impl RetrievalResult {
    /// True when no chunks were stored for the queried document.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
