//! Document chunking.
//!
//! [`FixedWindowChunker`] splits source text into overlapping fixed-size
//! character windows, recording each window's offsets so stored chunks can
//! be traced back into the source text.

use crate::config::RetrievalConfig;
use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting source text into chunks.
///
/// Implementations produce [`Chunk`]s with offsets and text but no
/// embedding; embeddings are attached later by the ingestion pipeline.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks owned by `document_id`.
    ///
    /// Returns an empty `Vec` for empty text.
    fn chunk(&self, document_id: &str, text: &str) -> Vec<Chunk>;
}

/// Splits text into fixed-size character windows with overlap.
///
/// Consecutive windows overlap by exactly the configured amount; the final
/// window may be shorter and is not padded. Each window is trimmed before
/// emission and dropped entirely when the trimmed text is at or below the
/// minimum length; offsets always refer to the untrimmed window.
///
/// # Example
///
/// ```rust,ignore
/// use studykit_rag::FixedWindowChunker;
///
/// let chunker = FixedWindowChunker::new(3000, 300)?;
/// let chunks = chunker.chunk("physics_grade_10", &text);
/// ```
#[derive(Debug, Clone)]
pub struct FixedWindowChunker {
    chunk_size_chars: usize,
    overlap: usize,
    min_chunk_chars: usize,
}

impl FixedWindowChunker {
    /// Default minimum trimmed length; shorter fragments carry no signal.
    pub const DEFAULT_MIN_CHUNK_CHARS: usize = 20;

    /// Create a chunker with the given window size and overlap.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] unless
    /// `chunk_size_chars > overlap` and `chunk_size_chars > 0`; anything
    /// else could stall the window loop or emit empty windows.
    pub fn new(chunk_size_chars: usize, overlap: usize) -> Result<Self> {
        if chunk_size_chars == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size_chars must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size_chars {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({overlap}) must be less than chunk_size_chars ({chunk_size_chars})"
            )));
        }
        Ok(Self {
            chunk_size_chars,
            overlap,
            min_chunk_chars: Self::DEFAULT_MIN_CHUNK_CHARS,
        })
    }

    /// Create a chunker from a validated [`RetrievalConfig`].
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size_chars, config.chunk_overlap)?
            .with_min_chunk_chars(config.min_chunk_chars))
    }

    /// Override the minimum trimmed chunk length.
    pub fn with_min_chunk_chars(mut self, min: usize) -> Self {
        self.min_chunk_chars = min;
        self
    }
}

impl Chunker for FixedWindowChunker {
    fn chunk(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Char-boundary table: boundaries[i] is the byte offset of character
        // i, with a trailing entry for the end of the string. Offsets in the
        // emitted chunks are character offsets, not byte offsets.
        let mut boundaries: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
        boundaries.push(text.len());
        let len = boundaries.len() - 1;

        let step = self.chunk_size_chars - self.overlap;
        let mut chunks = Vec::new();
        let mut pos = 0;
        let mut chunk_index = 0;

        while pos < len {
            let end = usize::min(len, pos + self.chunk_size_chars);
            let window = &text[boundaries[pos]..boundaries[end]];
            let trimmed = window.trim();
            if trimmed.chars().count() > self.min_chunk_chars {
                chunks.push(Chunk {
                    id: String::new(),
                    document_id: document_id.to_string(),
                    chunk_index,
                    start_offset: pos,
                    end_offset: end,
                    text: trimmed.to_string(),
                    embedding: Vec::new(),
                });
                chunk_index += 1;
            }
            if end == len {
                // The window reached the end of the text; stepping again
                // would only re-read the tail.
                break;
            }
            pos += step;
        }

        chunks
    }
}
