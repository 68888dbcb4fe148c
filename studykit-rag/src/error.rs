//! Error types for the `studykit-rag` crate.

use thiserror::Error;

/// The failure class of an embedding backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingFault {
    /// The credential was rejected (expired or invalid). Not retried.
    Auth,
    /// The backend asked the caller to slow down (HTTP 429). Retry-safe.
    RateLimited,
    /// The response matched no recognized shape. Not retried.
    MalformedResponse,
    /// The request never completed (connect, timeout, transport). Retry-safe.
    Transport,
}

impl std::fmt::Display for EmbeddingFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EmbeddingFault::Auth => "auth",
            EmbeddingFault::RateLimited => "rate-limited",
            EmbeddingFault::MalformedResponse => "malformed-response",
            EmbeddingFault::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in retrieval and ingestion operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking/retrieval parameters. Failed fast, never clamped.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An embedding backend call failed.
    #[error("embedding unavailable ({provider}, {fault}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// The failure class, which decides retry safety.
        fault: EmbeddingFault,
        /// A description of the failure.
        message: String,
    },

    /// A vector store backend call failed.
    #[error("vector store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// One batch failed mid-document. Earlier batches stay committed; the
    /// caller decides whether to delete-and-retry or resume.
    #[error(
        "ingestion of '{document_id}' failed at batch {batch_index} \
         after {committed_chunks} committed chunks"
    )]
    PartialIngestion {
        /// The document whose ingestion was aborted.
        document_id: String,
        /// Zero-based index of the batch that failed.
        batch_index: usize,
        /// Chunks already committed before the failure.
        committed_chunks: usize,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },
}

impl RagError {
    /// Whether retrying the failed operation could succeed.
    ///
    /// Configuration errors, rejected credentials, and unrecognized response
    /// shapes are permanent; rate limits, transport faults, and store
    /// connectivity are transient.
    pub fn is_retry_safe(&self) -> bool {
        match self {
            RagError::InvalidConfiguration(_) => false,
            RagError::EmbeddingUnavailable { fault, .. } => {
                matches!(fault, EmbeddingFault::RateLimited | EmbeddingFault::Transport)
            }
            RagError::StoreUnavailable { .. } => true,
            RagError::PartialIngestion { source, .. } => source.is_retry_safe(),
        }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
