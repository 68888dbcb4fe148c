//! Query-time retrieval.
//!
//! [`Retriever`] embeds a query, fetches the target document's chunks from
//! the vector store, scores them client-side, and returns the ranked chunks
//! plus a joined context string ready for prompt grounding.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::{CONTEXT_SEPARATOR, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::retry::RetryPolicy;
use crate::scoring;
use crate::vectorstore::VectorStore;

/// Read-path retrieval over one document's stored chunks.
///
/// Scoring always happens here, against freshly recomputed norms; the store
/// is only asked for the document's chunk set. Retrieval is read-only and
/// safe to run with unlimited concurrency.
///
/// # Example
///
/// ```rust,ignore
/// use studykit_rag::Retriever;
///
/// let retriever = Retriever::new(embedder, store);
/// let result = retriever.retrieve("physics_grade_10", "What is momentum?").await?;
/// println!("{}", result.context);
/// ```
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
    retry: RetryPolicy,
}

impl Retriever {
    /// Default number of context chunks per query.
    pub const DEFAULT_TOP_K: usize = 4;

    /// Create a retriever with the default `top_k` and no retries.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            top_k: Self::DEFAULT_TOP_K,
            retry: RetryPolicy::none(),
        }
    }

    /// Set the default number of chunks returned per query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] when `top_k` is zero.
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        self.top_k = top_k;
        Ok(self)
    }

    /// Inject a retry policy for the embedding and store calls.
    ///
    /// The default is [`RetryPolicy::none`]: a failed query embedding
    /// surfaces immediately instead of being retried here.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Retrieve with the configured `top_k`.
    pub async fn retrieve(&self, document_id: &str, query: &str) -> Result<RetrievalResult> {
        self.retrieve_top_k(document_id, query, self.top_k).await
    }

    /// Retrieve the `top_k` highest-scoring chunks for `query`.
    ///
    /// A document that was never ingested (or produced zero chunks) yields
    /// an empty [`RetrievalResult`], not an error.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidConfiguration`] for `top_k == 0`;
    /// [`RagError::EmbeddingUnavailable`] when the query cannot be embedded;
    /// [`RagError::StoreUnavailable`] when the chunk fetch fails.
    pub async fn retrieve_top_k(
        &self,
        document_id: &str,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievalResult> {
        if top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let query_vector = self
            .retry
            .run(|| self.embedder.embed(query))
            .await
            .inspect_err(|e| {
                error!(document_id, error = %e, "query embedding failed");
            })?;

        let chunks = self
            .retry
            .run(|| self.store.document_chunks(document_id))
            .await
            .inspect_err(|e| {
                error!(document_id, error = %e, "chunk fetch failed");
            })?;

        if chunks.is_empty() {
            info!(document_id, "no chunks stored for document");
            return Ok(RetrievalResult::default());
        }

        let results = scoring::rank(&query_vector, chunks, top_k);
        let context = results
            .iter()
            .map(|scored| scored.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        info!(document_id, result_count = results.len(), "retrieval completed");
        Ok(RetrievalResult { results, context })
    }
}
