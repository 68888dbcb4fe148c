//! Textbook retrieval core for StudyKit tutoring bots.
//!
//! Splits source text into overlapping, offset-tracked chunks, embeds them
//! behind a pluggable [`EmbeddingProvider`], persists the vectors behind a
//! pluggable [`VectorStore`], and answers queries with the top-scoring
//! chunks joined into a grounding context for a downstream prompt.
//!
//! Ingestion (offline) and retrieval (request time) are separate entry
//! points:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studykit_rag::{IngestionPipeline, InMemoryVectorStore, Retriever};
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! let pipeline = IngestionPipeline::builder()
//!     .embedding_provider(embedder.clone())
//!     .vector_store(store.clone())
//!     .build()?;
//! pipeline.ingest("physics_grade_10", &text).await?;
//!
//! let retriever = Retriever::new(embedder, store);
//! let result = retriever.retrieve("physics_grade_10", "What is momentum?").await?;
//! println!("{}", result.context);
//! ```
//!
//! # Feature flags
//!
//! - `vertex` — [`vertex::VertexEmbeddingProvider`], a Vertex AI embedding
//!   backend over HTTP.
//! - `sqlite` — [`sqlite::SqliteVectorStore`], a SQLite-backed store.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod pipeline;
pub mod retriever;
pub mod retry;
pub mod scoring;
pub mod vectorstore;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "vertex")]
pub mod vertex;

pub use chunking::{Chunker, FixedWindowChunker};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use document::{CONTEXT_SEPARATOR, Chunk, DocumentRecord, RetrievalResult, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{EmbeddingFault, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{IngestReport, IngestionPipeline, IngestionPipelineBuilder};
pub use retriever::Retriever;
pub use retry::RetryPolicy;
pub use vectorstore::VectorStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteVectorStore;

#[cfg(feature = "vertex")]
pub use vertex::{AccessTokenProvider, StaticTokenProvider, VertexEmbeddingProvider};
