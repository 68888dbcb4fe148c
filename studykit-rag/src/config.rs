//! Configuration for chunking, retrieval, and ingestion.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunable parameters for the retrieval core.
///
/// Defaults are sized for a single-textbook corpus: 3000-character windows
/// with a 300-character overlap, 16 chunks per embed-and-store round-trip,
/// and four context chunks per query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    /// Window size in characters.
    pub chunk_size_chars: usize,
    /// Overlap between consecutive windows in characters.
    pub chunk_overlap: usize,
    /// Trimmed chunks at or below this length are dropped.
    pub min_chunk_chars: usize,
    /// Number of chunks returned per retrieval.
    pub top_k: usize,
    /// Chunks per embed-and-store round-trip during ingestion.
    pub batch_size: usize,
    /// Optional pause between ingestion batches, for rate-limited backends.
    #[serde(default)]
    pub batch_delay: Option<Duration>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size_chars: 3000,
            chunk_overlap: 300,
            min_chunk_chars: 20,
            top_k: 4,
            batch_size: 16,
            batch_delay: None,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.chunk_size_chars == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size_chars must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size_chars {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size_chars ({})",
                self.chunk_overlap, self.chunk_size_chars
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the window size in characters.
    pub fn chunk_size_chars(mut self, size: usize) -> Self {
        self.config.chunk_size_chars = size;
        self
    }

    /// Set the overlap between consecutive windows in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the minimum trimmed chunk length; shorter chunks are dropped.
    pub fn min_chunk_chars(mut self, min: usize) -> Self {
        self.config.min_chunk_chars = min;
        self
    }

    /// Set the number of chunks returned per retrieval.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the number of chunks per ingestion round-trip.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set an optional pause between ingestion batches.
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.config.batch_delay = Some(delay);
        self
    }

    /// Build the [`RetrievalConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size_chars == 0`
    /// - `chunk_overlap >= chunk_size_chars`
    /// - `top_k == 0`
    /// - `batch_size == 0`
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
