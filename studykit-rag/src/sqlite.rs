//! SQLite vector store backend.
//!
//! Provides [`SqliteVectorStore`], which implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the bundled SQLite driver. Embeddings
//! are stored as JSON text and scored client-side by the retriever, the
//! same read-path shape as any document-oriented backend with an equality
//! filter on `document_id`.
//!
//! This module is only available when the `sqlite` feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use studykit_rag::sqlite::SqliteVectorStore;
//!
//! let store = SqliteVectorStore::new("sqlite://studykit.db?mode=rwc").await?;
//! store.put_chunks("physics_grade_10", &chunks).await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, DocumentRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by SQLite.
///
/// Two tables: `documents` (one row per ingested document) and `chunks`
/// (one row per stored chunk, JSON-encoded embedding).
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    /// Connect to the given database URL and create the schema if needed.
    ///
    /// Use `sqlite::memory:` for an in-memory database or
    /// `sqlite://path/to.db?mode=rwc` to create a file on first use.
    pub async fn new(database_url: &str) -> Result<Self> {
        // One pooled connection: SQLite serializes writers anyway, and a
        // multi-connection pool would give `sqlite::memory:` a separate
        // database per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create a store from an existing connection pool. The caller is
    /// responsible for calling [`migrate`](Self::migrate) once.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `documents` and `chunks` tables if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (\
                document_id TEXT PRIMARY KEY, \
                text_len INTEGER NOT NULL, \
                chunk_count INTEGER NOT NULL, \
                ingested_at TEXT NOT NULL\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (\
                id TEXT PRIMARY KEY, \
                document_id TEXT NOT NULL, \
                chunk_index INTEGER NOT NULL, \
                start_offset INTEGER NOT NULL, \
                end_offset INTEGER NOT NULL, \
                text TEXT NOT NULL, \
                embedding TEXT NOT NULL\
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS chunks_document_id ON chunks(document_id)")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        debug!("sqlite schema ready");
        Ok(())
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::StoreUnavailable {
            backend: "sqlite".to_string(),
            message: e.to_string(),
        }
    }

    fn corrupt(message: impl Into<String>) -> RagError {
        RagError::StoreUnavailable {
            backend: "sqlite".to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn put_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        for chunk in chunks {
            let embedding_json = serde_json::to_string(&chunk.embedding)
                .map_err(|e| Self::corrupt(format!("embedding not serializable: {e}")))?;

            sqlx::query(
                "INSERT INTO chunks \
                 (id, document_id, chunk_index, start_offset, end_offset, text, embedding) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(document_id)
            .bind(chunk.chunk_index as i64)
            .bind(chunk.start_offset as i64)
            .bind(chunk.end_offset as i64)
            .bind(&chunk.text)
            .bind(&embedding_json)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        }
        tx.commit().await.map_err(Self::map_err)?;

        debug!(document_id, count = chunks.len(), "inserted chunks into sqlite");
        Ok(())
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, chunk_index, start_offset, end_offset, text, embedding \
             FROM chunks WHERE document_id = ?1 ORDER BY chunk_index",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        rows.iter()
            .map(|row| {
                let embedding_json: String = row.get("embedding");
                let embedding: Vec<f32> = serde_json::from_str(&embedding_json)
                    .map_err(|e| Self::corrupt(format!("stored embedding unreadable: {e}")))?;
                Ok(Chunk {
                    id: row.get("id"),
                    document_id: document_id.to_string(),
                    chunk_index: row.get::<i64, _>("chunk_index") as usize,
                    start_offset: row.get::<i64, _>("start_offset") as usize,
                    end_offset: row.get::<i64, _>("end_offset") as usize,
                    text: row.get("text"),
                    embedding,
                })
            })
            .collect()
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Self::map_err)?;
        sqlx::query("DELETE FROM chunks WHERE document_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        sqlx::query("DELETE FROM documents WHERE document_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_err)?;
        tx.commit().await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn put_document(&self, record: &DocumentRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents (document_id, text_len, chunk_count, ingested_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(document_id) DO UPDATE SET \
                text_len = excluded.text_len, \
                chunk_count = excluded.chunk_count, \
                ingested_at = excluded.ingested_at",
        )
        .bind(&record.document_id)
        .bind(record.text_len as i64)
        .bind(record.chunk_count as i64)
        .bind(record.ingested_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(Self::map_err)?;
        Ok(())
    }

    async fn document(&self, document_id: &str) -> Result<Option<DocumentRecord>> {
        let row = sqlx::query(
            "SELECT document_id, text_len, chunk_count, ingested_at \
             FROM documents WHERE document_id = ?1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_err)?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>> {
        let rows = sqlx::query(
            "SELECT document_id, text_len, chunk_count, ingested_at \
             FROM documents ORDER BY document_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_err)?;

        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<DocumentRecord> {
    let ingested_at_raw: String = row.get("ingested_at");
    let ingested_at = DateTime::parse_from_rfc3339(&ingested_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SqliteVectorStore::corrupt(format!("stored timestamp unreadable: {e}")))?;
    Ok(DocumentRecord {
        document_id: row.get("document_id"),
        text_len: row.get::<i64, _>("text_len") as usize,
        chunk_count: row.get::<i64, _>("chunk_count") as usize,
        ingested_at,
    })
}
