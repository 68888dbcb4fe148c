//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A backend that turns text into fixed-dimension embedding vectors.
///
/// [`embed_batch`](EmbeddingProvider::embed_batch) preserves order: the
/// vector at position `i` always corresponds to `texts[i]`. The default
/// implementation embeds sequentially; backends with native batching should
/// override it.
///
/// Vectors from different providers (or model configurations) are not
/// comparable. Nothing here detects mixing; the scores would simply be
/// meaningless.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of inputs, one vector per
    /// input, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short backend name used in logs and error context.
    fn name(&self) -> &str {
        "embedding"
    }
}
