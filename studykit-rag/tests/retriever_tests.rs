//! Retrieval ranking, truncation, and failure surfacing.

use std::sync::Arc;

use async_trait::async_trait;
use studykit_rag::{
    CONTEXT_SEPARATOR, Chunk, EmbeddingFault, EmbeddingProvider, InMemoryVectorStore, RagError,
    Result, Retriever, VectorStore,
};

/// Returns the same fixed vector for every input.
struct FixedEmbedder(Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Fails every call with a permanent auth fault.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingUnavailable {
            provider: "stub".to_string(),
            fault: EmbeddingFault::Auth,
            message: "credential rejected".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        2
    }
}

fn chunk(index: usize, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: String::new(),
        document_id: "book".to_string(),
        chunk_index: index,
        start_offset: index * 100,
        end_offset: index * 100 + 100,
        text: text.to_string(),
        embedding,
    }
}

async fn store_with(chunks: &[Chunk]) -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store.put_chunks("book", chunks).await.unwrap();
    store
}

#[tokio::test]
async fn ranks_by_descending_cosine_similarity() {
    let store = store_with(&[
        chunk(0, "aligned", vec![1.0, 0.0]),
        chunk(1, "orthogonal", vec![0.0, 1.0]),
        chunk(2, "diagonal", vec![1.0, 1.0]),
    ])
    .await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve("book", "query").await.unwrap();

    assert_eq!(result.results.len(), 3);
    assert_eq!(result.results[0].chunk.text, "aligned");
    assert!((result.results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(result.results[1].chunk.text, "diagonal");
    assert!((result.results[1].score - 0.7071).abs() < 1e-3);
    assert_eq!(result.results[2].chunk.text, "orthogonal");
    assert_eq!(result.results[2].score, 0.0);
}

#[tokio::test]
async fn joins_context_in_rank_order() {
    let store = store_with(&[
        chunk(0, "second", vec![0.5, 0.5]),
        chunk(1, "first", vec![1.0, 0.0]),
    ])
    .await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve("book", "query").await.unwrap();

    assert_eq!(
        result.context,
        format!("first{CONTEXT_SEPARATOR}second")
    );
}

#[tokio::test]
async fn unknown_document_yields_empty_result() {
    let store = Arc::new(InMemoryVectorStore::new());
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve("never_ingested", "query").await.unwrap();

    assert!(result.is_empty());
    assert!(result.context.is_empty());
}

#[tokio::test]
async fn zero_magnitude_embeddings_score_zero() {
    let store = store_with(&[chunk(0, "degenerate", vec![0.0, 0.0])]).await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve("book", "query").await.unwrap();

    assert_eq!(result.results[0].score, 0.0);
    assert!(result.results[0].score.is_finite());
}

#[tokio::test]
async fn equal_scores_keep_ascending_chunk_index_order() {
    let store = store_with(&[
        chunk(5, "late", vec![2.0, 0.0]),
        chunk(1, "early", vec![1.0, 0.0]),
        chunk(3, "middle", vec![3.0, 0.0]),
    ])
    .await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve("book", "query").await.unwrap();

    let order: Vec<usize> = result.results.iter().map(|r| r.chunk.chunk_index).collect();
    assert_eq!(order, vec![1, 3, 5]);
}

#[tokio::test]
async fn truncates_to_top_k() {
    let chunks: Vec<Chunk> = (0..10)
        .map(|i| chunk(i, "text", vec![1.0, i as f32]))
        .collect();
    let store = store_with(&chunks).await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve_top_k("book", "query", 3).await.unwrap();

    assert_eq!(result.results.len(), 3);
}

#[tokio::test]
async fn zero_top_k_is_a_configuration_error() {
    let store = store_with(&[chunk(0, "text", vec![1.0, 0.0])]).await;
    let retriever = Retriever::new(Arc::new(FixedEmbedder(vec![1.0, 0.0])), store);

    let result = retriever.retrieve_top_k("book", "query", 0).await;

    assert!(matches!(result, Err(RagError::InvalidConfiguration(_))));
}

#[tokio::test]
async fn with_top_k_rejects_zero() {
    let store = Arc::new(InMemoryVectorStore::new());
    let result = Retriever::new(Arc::new(FixedEmbedder(vec![1.0])), store).with_top_k(0);
    assert!(matches!(result, Err(RagError::InvalidConfiguration(_))));
}

#[tokio::test]
async fn embedding_failure_surfaces_unchanged() {
    let store = store_with(&[chunk(0, "text", vec![1.0, 0.0])]).await;
    let retriever = Retriever::new(Arc::new(FailingEmbedder), store);

    let result = retriever.retrieve("book", "query").await;

    match result {
        Err(RagError::EmbeddingUnavailable { fault, .. }) => {
            assert_eq!(fault, EmbeddingFault::Auth);
        }
        other => panic!("expected EmbeddingUnavailable, got {other:?}"),
    }
}
