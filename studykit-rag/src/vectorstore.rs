//! Vector store trait for persisting and fetching embedded chunks.

use async_trait::async_trait;

use crate::document::{Chunk, DocumentRecord};
use crate::error::Result;

/// A storage backend for embedded chunks, keyed by document.
///
/// The store exclusively owns persisted chunks: readers never mutate them.
/// Similarity scoring is the caller's job (brute-force cosine over one
/// document's chunk set is the accepted read-path policy at textbook
/// scale); the store is only asked for a document's chunks.
///
/// # Example
///
/// ```rust,ignore
/// use studykit_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.put_chunks("physics_grade_10", &chunks).await?;
/// let stored = store.document_chunks("physics_grade_10").await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist a batch of chunks, assigning each a store-generated unique
    /// id.
    ///
    /// Append-only: re-inserting a document's chunks without deleting the
    /// document first duplicates them. The
    /// [`IngestionPipeline`](crate::IngestionPipeline) deletes before the
    /// first insert to get replace semantics.
    async fn put_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()>;

    /// Fetch all chunks for one document, sorted by ascending
    /// `chunk_index` regardless of backend iteration order.
    ///
    /// An unknown document returns an empty `Vec`.
    async fn document_chunks(&self, document_id: &str) -> Result<Vec<Chunk>>;

    /// Remove a document's metadata record and all of its chunks.
    ///
    /// Idempotent: deleting a document that does not exist is a no-op.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Write (or replace) a document's metadata record.
    async fn put_document(&self, record: &DocumentRecord) -> Result<()>;

    /// Fetch a document's metadata record, if it was ever ingested.
    async fn document(&self, document_id: &str) -> Result<Option<DocumentRecord>>;

    /// List all known document records, sorted by `document_id`.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>>;
}
