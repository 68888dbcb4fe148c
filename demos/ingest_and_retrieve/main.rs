//! # Ingest and Retrieve
//!
//! Demonstrates the core retrieval flow: ingest textbook excerpts, then
//! answer questions against them, with per-user menu selections held in a
//! `SessionStore`.
//!
//! Uses `InMemoryVectorStore` and a deterministic `MockEmbeddingProvider`
//! so it runs with **zero API keys** and no database.
//!
//! Run: `cargo run -p studykit-demos --bin ingest_and_retrieve`

use std::sync::Arc;
use std::time::Duration;

use studykit_rag::{
    EmbeddingProvider, IngestionPipeline, InMemoryVectorStore, RetrievalConfig, Retriever,
};
use studykit_session::SessionStore;

// ---------------------------------------------------------------------------
// MockEmbeddingProvider — deterministic hash-based embeddings for demos/tests
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> studykit_rag::Result<Vec<f32>> {
        // Deterministic embedding: hash the text bytes, then generate a
        // normalised vector whose direction depends on the content.
        let hash = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        // L2-normalise so cosine similarity is just the dot product.
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Per-user menu selections, as the chat layer would track them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct TutorState {
    grade: Option<u8>,
    subject: Option<String>,
    topic: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // -- 1. Configure the pipeline ----------------------------------------
    // Small windows keep the demo excerpts multi-chunk; a real textbook
    // would use the 3000/300 defaults.
    let config = RetrievalConfig::builder()
        .chunk_size_chars(240)
        .chunk_overlap(40)
        .min_chunk_chars(10)
        .top_k(2)
        .batch_size(4)
        .build()?;

    // -- 2. Build the pipeline with in-memory components ------------------
    let embedder = Arc::new(MockEmbeddingProvider::new(64));
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .embedding_provider(embedder.clone())
        .vector_store(store.clone())
        .build()?;

    // -- 3. Ingest textbook excerpts --------------------------------------
    let books = [
        (
            "physics_grade_10",
            "Newton's first law states that a body remains at rest, or in \
             motion at a constant speed in a straight line, unless acted \
             upon by a force. Newton's second law relates the net force on \
             a body to its acceleration: force equals mass times \
             acceleration. Newton's third law says that for every action \
             there is an equal and opposite reaction. Momentum is the \
             product of an object's mass and velocity, and is conserved in \
             closed systems.",
        ),
        (
            "biology_grade_9",
            "Photosynthesis is the process by which green plants use \
             sunlight to synthesize food from carbon dioxide and water. It \
             takes place in the chloroplasts, using the green pigment \
             chlorophyll. Cellular respiration releases the stored energy \
             by breaking glucose down into carbon dioxide and water, \
             producing ATP that powers the cell.",
        ),
    ];

    println!("Ingesting {} books...", books.len());
    for (book_id, text) in &books {
        let report = pipeline.ingest(book_id, text).await?;
        println!(
            "  {} -> {} chunk(s) in {} batch(es)",
            report.document_id, report.chunk_count, report.batch_count
        );
    }

    // -- 4. Walk a user's menu selections ---------------------------------
    // The chat layer stores grade/subject/topic per user; the selection
    // decides which book retrieval is grounded in.
    let sessions: SessionStore<TutorState> = SessionStore::with_ttl(Duration::from_secs(1800));
    let user_id = 12_345;
    sessions
        .update(user_id, |s| {
            s.grade = Some(10);
            s.subject = Some("physics".to_string());
        })
        .await;
    let state = sessions
        .update(user_id, |s| s.topic = Some("Newton's laws".to_string()))
        .await;

    let book_id = format!(
        "{}_grade_{}",
        state.subject.as_deref().unwrap_or("physics"),
        state.grade.unwrap_or(10)
    );
    println!("\nUser {user_id} selected: {state:?} -> book '{book_id}'");

    // -- 5. Query the retriever -------------------------------------------
    let retriever = Retriever::new(embedder, store).with_top_k(2)?;
    let questions = [
        "What does Newton's second law say about force?",
        "How is momentum defined?",
    ];

    for question in &questions {
        println!("\nQuestion: \"{question}\"");
        let result = retriever.retrieve(&book_id, question).await?;
        if result.is_empty() {
            println!("  (no results)");
            continue;
        }
        for (i, scored) in result.results.iter().enumerate() {
            println!(
                "  {}. [score={:.4}] chunk #{} [{}..{}) | {}",
                i + 1,
                scored.score,
                scored.chunk.chunk_index,
                scored.chunk.start_offset,
                scored.chunk.end_offset,
                &scored.chunk.text[..scored.chunk.text.len().min(60)],
            );
        }
        println!("--- context ---\n{}", result.context);
    }

    println!("\nDone.");
    Ok(())
}
