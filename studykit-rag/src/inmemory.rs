//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is the
//! default backend for tests, demos, and single-process deployments with
//! book-sized corpora.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Chunk, DocumentRecord};
use crate::error::Result;
use crate::vectorstore::VectorStore;

#[derive(Debug, Default)]
struct DocumentState {
    record: Option<DocumentRecord>,
    chunks: Vec<Chunk>,
}

/// An in-memory [`VectorStore`] keyed by document id.
///
/// All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: RwLock<HashMap<String, DocumentState>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn put_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()> {
        let mut documents = self.documents.write().await;
        let state = documents.entry(document_id.to_string()).or_default();
        for chunk in chunks {
            let mut stored = chunk.clone();
            stored.id = Uuid::new_v4().to_string();
            stored.document_id = document_id.to_string();
            state.chunks.push(stored);
        }
        Ok(())
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let documents = self.documents.read().await;
        let mut chunks = documents
            .get(document_id)
            .map(|state| state.chunks.clone())
            .unwrap_or_default();
        chunks.sort_by_key(|chunk| chunk.chunk_index);
        Ok(chunks)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.remove(document_id);
        Ok(())
    }

    async fn put_document(&self, record: &DocumentRecord) -> Result<()> {
        let mut documents = self.documents.write().await;
        let state = documents.entry(record.document_id.clone()).or_default();
        state.record = Some(record.clone());
        Ok(())
    }

    async fn document(&self, document_id: &str) -> Result<Option<DocumentRecord>> {
        let documents = self.documents.read().await;
        Ok(documents.get(document_id).and_then(|state| state.record.clone()))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let documents = self.documents.read().await;
        let mut records: Vec<DocumentRecord> = documents
            .values()
            .filter_map(|state| state.record.clone())
            .collect();
        records.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(records)
    }
}
