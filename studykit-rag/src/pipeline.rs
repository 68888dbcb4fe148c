//! Offline ingestion pipeline.
//!
//! [`IngestionPipeline`] drives chunk → embed → store for one document at a
//! time, committing fixed-size batches strictly sequentially so memory and
//! per-call payload stay bounded. Ingestion of the same document is
//! serialized; distinct documents may ingest concurrently.
//!
//! # Example
//!
//! ```rust,ignore
//! use studykit_rag::{IngestionPipeline, InMemoryVectorStore, RetrievalConfig};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let report = pipeline.ingest("physics_grade_10", &text).await?;
//! println!("{} chunks in {} batches", report.chunk_count, report.batch_count);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::chunking::{Chunker, FixedWindowChunker};
use crate::config::RetrievalConfig;
use crate::document::{Chunk, DocumentRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingFault, RagError, Result};
use crate::retry::RetryPolicy;
use crate::vectorstore::VectorStore;

/// Summary of a successful [`IngestionPipeline::ingest`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// The ingested document.
    pub document_id: String,
    /// Number of chunks stored.
    pub chunk_count: usize,
    /// Number of embed-and-store round-trips performed.
    pub batch_count: usize,
}

/// The ingestion orchestrator.
///
/// Re-ingesting a document replaces it: the pipeline deletes the previous
/// chunk set before the first insert, under a per-document lock, so a
/// re-run can never interleave with or duplicate an earlier ingestion.
/// A mid-document failure leaves earlier batches committed and surfaces
/// [`RagError::PartialIngestion`] with the failed batch index.
pub struct IngestionPipeline {
    config: RetrievalConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
    document_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Ingest one document: chunk, embed, and store in sequential batches.
    ///
    /// Zero emitted chunks (empty or all-whitespace text) still records the
    /// document and returns a zero report.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PartialIngestion`] when a batch fails; batches
    /// committed before the failure are not rolled back. The wrapped source
    /// error keeps the transient/permanent distinction for the caller's
    /// resume-or-delete decision.
    pub async fn ingest(&self, document_id: &str, text: &str) -> Result<IngestReport> {
        let lock = self.document_lock(document_id).await;
        let _guard = lock.lock().await;

        // Replace, not append: clear any prior ingestion of this document
        // before the first insert.
        self.retry
            .run(|| self.store.delete_document(document_id))
            .await?;

        let chunks = self.chunker.chunk(document_id, text);
        let chunk_count = chunks.len();
        let batch_count = chunk_count.div_ceil(self.config.batch_size);

        let mut committed = 0usize;
        for (batch_index, group) in chunks.chunks(self.config.batch_size).enumerate() {
            if batch_index > 0 {
                if let Some(delay) = self.config.batch_delay {
                    tokio::time::sleep(delay).await;
                }
            }

            self.commit_batch(document_id, group).await.map_err(|source| {
                error!(
                    document_id,
                    batch_index,
                    committed,
                    error = %source,
                    "ingestion aborted"
                );
                RagError::PartialIngestion {
                    document_id: document_id.to_string(),
                    batch_index,
                    committed_chunks: committed,
                    source: Box::new(source),
                }
            })?;
            committed += group.len();
        }

        let record = DocumentRecord {
            document_id: document_id.to_string(),
            text_len: text.chars().count(),
            chunk_count,
            ingested_at: Utc::now(),
        };
        self.retry.run(|| self.store.put_document(&record)).await?;

        info!(document_id, chunk_count, batch_count, "ingested document");
        Ok(IngestReport {
            document_id: document_id.to_string(),
            chunk_count,
            batch_count,
        })
    }

    /// Ingest several documents in order, stopping at the first failure.
    pub async fn ingest_many(&self, documents: &[(&str, &str)]) -> Result<Vec<IngestReport>> {
        let mut reports = Vec::with_capacity(documents.len());
        for (document_id, text) in documents {
            reports.push(self.ingest(document_id, text).await?);
        }
        Ok(reports)
    }

    /// Delete a document and all its chunks, under the same per-document
    /// lock as ingestion. Idempotent.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let lock = self.document_lock(document_id).await;
        let _guard = lock.lock().await;
        self.retry
            .run(|| self.store.delete_document(document_id))
            .await
    }

    /// Embed one batch and persist it.
    async fn commit_batch(&self, document_id: &str, group: &[Chunk]) -> Result<()> {
        let texts: Vec<&str> = group.iter().map(|chunk| chunk.text.as_str()).collect();

        let embeddings = self.retry.run(|| self.embedder.embed_batch(&texts)).await?;
        if embeddings.len() != group.len() {
            return Err(RagError::EmbeddingUnavailable {
                provider: self.embedder.name().to_string(),
                fault: EmbeddingFault::MalformedResponse,
                message: format!(
                    "expected {} embeddings, got {}",
                    group.len(),
                    embeddings.len()
                ),
            });
        }

        let mut batch = group.to_vec();
        for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.retry
            .run(|| self.store.put_chunks(document_id, &batch))
            .await
    }

    /// Get or create the serialization lock for one document id.
    async fn document_lock(&self, document_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.document_locks.lock().await;
        locks
            .entry(document_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// The embedding provider and vector store are required; the config
/// defaults to [`RetrievalConfig::default`], the chunker to a
/// [`FixedWindowChunker`] derived from the config, and the retry policy to
/// [`RetryPolicy::standard`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<RetrievalConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    retry: Option<RetryPolicy>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a custom chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the retry policy for embedding and store calls.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Build the [`IngestionPipeline`], validating the configuration and
    /// required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] for an inconsistent
    /// config or a missing embedding provider or vector store.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedder = self.embedder.ok_or_else(|| {
            RagError::InvalidConfiguration("embedding_provider is required".to_string())
        })?;
        let store = self.store.ok_or_else(|| {
            RagError::InvalidConfiguration("vector_store is required".to_string())
        })?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedWindowChunker::from_config(&config)?),
        };

        Ok(IngestionPipeline {
            config,
            chunker,
            embedder,
            store,
            retry: self.retry.unwrap_or_else(RetryPolicy::standard),
            document_locks: Mutex::new(HashMap::new()),
        })
    }
}
