#![cfg(feature = "sqlite")]

//! SQLite backend contract tests against an in-memory database.

use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use studykit_rag::sqlite::SqliteVectorStore;
use studykit_rag::{Chunk, DocumentRecord, VectorStore};

/// A single-connection pool keeps every query on the same in-memory
/// database.
async fn memory_store() -> SqliteVectorStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteVectorStore::from_pool(pool);
    store.migrate().await.unwrap();
    store
}

fn chunk(index: usize, text: &str) -> Chunk {
    Chunk {
        id: String::new(),
        document_id: "book".to_string(),
        chunk_index: index,
        start_offset: index * 100,
        end_offset: index * 100 + 100,
        text: text.to_string(),
        embedding: vec![index as f32, 1.0],
    }
}

#[tokio::test]
async fn round_trips_chunks_sorted_by_index() {
    let store = memory_store().await;

    // Insert out of order; reads must come back sorted by chunk_index.
    store
        .put_chunks("book", &[chunk(2, "third"), chunk(0, "first"), chunk(1, "second")])
        .await
        .unwrap();

    let chunks = store.document_chunks("book").await.unwrap();
    assert_eq!(chunks.len(), 3);
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert_eq!(chunks[1].embedding, vec![1.0, 1.0]);
    assert_eq!(chunks[1].start_offset, 100);
    assert!(!chunks[0].id.is_empty());
}

#[tokio::test]
async fn unknown_document_reads_empty() {
    let store = memory_store().await;
    assert!(store.document_chunks("missing").await.unwrap().is_empty());
    assert!(store.document("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_document_is_idempotent_and_complete() {
    let store = memory_store().await;
    store.put_chunks("book", &[chunk(0, "text")]).await.unwrap();
    store
        .put_document(&DocumentRecord {
            document_id: "book".to_string(),
            text_len: 100,
            chunk_count: 1,
            ingested_at: Utc::now(),
        })
        .await
        .unwrap();

    store.delete_document("book").await.unwrap();
    store.delete_document("book").await.unwrap();

    assert!(store.document_chunks("book").await.unwrap().is_empty());
    assert!(store.document("book").await.unwrap().is_none());
}

#[tokio::test]
async fn document_record_round_trips_with_timestamp() {
    let store = memory_store().await;
    let ingested_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
    let record = DocumentRecord {
        document_id: "book".to_string(),
        text_len: 3500,
        chunk_count: 2,
        ingested_at,
    };

    store.put_document(&record).await.unwrap();
    let loaded = store.document("book").await.unwrap().unwrap();
    assert_eq!(loaded, record);

    // Replacing the record keeps a single row.
    store
        .put_document(&DocumentRecord {
            chunk_count: 5,
            ..record.clone()
        })
        .await
        .unwrap();
    let records = store.list_documents().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].chunk_count, 5);
}
