//! Cosine scoring and result ranking.

use std::cmp::Ordering;

use crate::document::{Chunk, ScoredChunk};

/// Compute cosine similarity between two vectors.
///
/// Norms are recomputed on every call; no backend is trusted to return
/// pre-normalized vectors. Returns 0.0 when either vector has zero
/// magnitude, so callers never see a NaN.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score chunks against a query vector, rank them, and truncate to `top_k`.
///
/// Descending score; equal scores keep ascending `chunk_index` order, so
/// ranking is deterministic.
pub(crate) fn rank(query: &[f32], chunks: Vec<Chunk>, top_k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .into_iter()
        .map(|chunk| {
            let score = cosine(query, &chunk.embedding);
            ScoredChunk { chunk, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: String::new(),
            document_id: "doc".to_string(),
            chunk_index: index,
            start_offset: index * 10,
            end_offset: index * 10 + 10,
            text: format!("chunk {index}"),
            embedding,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, -1.2, 4.5];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let cos = cosine(&[2.0, 1.0], &[-2.0, -1.0]);
        assert!((cos + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_guards_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine(&[0.0], &[0.0]), 0.0);
    }

    #[test]
    fn cosine_stays_in_bounds() {
        let pairs = [
            (vec![1.0, 2.0, 3.0], vec![-3.0, 0.5, 9.0]),
            (vec![0.001, -0.002], vec![1000.0, 2000.0]),
        ];
        for (a, b) in pairs {
            let cos = cosine(&a, &b);
            assert!((-1.0..=1.0).contains(&cos), "cosine out of bounds: {cos}");
        }
    }

    #[test]
    fn rank_breaks_ties_by_chunk_index() {
        // Both chunks score identically against the query; the earlier
        // chunk_index must come first.
        let chunks = vec![chunk(7, vec![1.0, 0.0]), chunk(2, vec![2.0, 0.0])];
        let ranked = rank(&[1.0, 0.0], chunks, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.chunk_index, 2);
        assert_eq!(ranked[1].chunk.chunk_index, 7);
    }

    #[test]
    fn rank_truncates_to_top_k() {
        let chunks = (0..8).map(|i| chunk(i, vec![1.0, i as f32])).collect();
        let ranked = rank(&[1.0, 0.0], chunks, 3);
        assert_eq!(ranked.len(), 3);
    }
}
