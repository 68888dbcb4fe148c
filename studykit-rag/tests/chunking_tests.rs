//! Chunker window, offset, and termination behavior.

use studykit_rag::{Chunker, FixedWindowChunker, RagError};

/// Printable ASCII filler with no whitespace, so trimming never shrinks a
/// window.
fn ascii_text(len: usize) -> String {
    ('a'..='z').cycle().take(len).collect()
}

#[test]
fn worked_example_two_overlapping_windows() {
    let text = ascii_text(3500);
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();

    let chunks = chunker.chunk("doc", &text);

    assert_eq!(chunks.len(), 2);
    assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 3000));
    assert_eq!((chunks[1].start_offset, chunks[1].end_offset), (2700, 3500));
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[1].chunk_index, 1);
    assert_eq!(chunks[0].text.len(), 3000);
    assert_eq!(chunks[1].text.len(), 800);
}

#[test]
fn empty_text_yields_no_chunks() {
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();
    assert!(chunker.chunk("doc", "").is_empty());
}

#[test]
fn text_shorter_than_window_yields_one_chunk() {
    let text = ascii_text(100);
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();

    let chunks = chunker.chunk("doc", &text);

    assert_eq!(chunks.len(), 1);
    assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 100));
}

#[test]
fn trimmed_fragments_at_or_below_minimum_are_dropped() {
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();

    // Exactly at the threshold: dropped. One past it: kept.
    assert!(chunker.chunk("doc", &ascii_text(20)).is_empty());
    assert_eq!(chunker.chunk("doc", &ascii_text(21)).len(), 1);
}

#[test]
fn whitespace_only_text_yields_no_chunks() {
    let text = " ".repeat(5000);
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();
    assert!(chunker.chunk("doc", &text).is_empty());
}

#[test]
fn untrimmed_offsets_are_recorded_for_trimmed_text() {
    // Window content ends with whitespace; the text is trimmed but the
    // offsets still cover the full window.
    let mut text = ascii_text(40);
    text.push_str("     ");
    let chunker = FixedWindowChunker::new(100, 10).unwrap();

    let chunks = chunker.chunk("doc", &text);

    assert_eq!(chunks.len(), 1);
    assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 45));
    assert_eq!(chunks[0].text.len(), 40);
}

#[test]
fn rejects_overlap_not_smaller_than_window() {
    assert!(matches!(
        FixedWindowChunker::new(100, 100),
        Err(RagError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        FixedWindowChunker::new(100, 300),
        Err(RagError::InvalidConfiguration(_))
    ));
}

#[test]
fn rejects_zero_window() {
    assert!(matches!(
        FixedWindowChunker::new(0, 0),
        Err(RagError::InvalidConfiguration(_))
    ));
}

#[test]
fn consecutive_full_windows_overlap_by_exactly_the_configured_amount() {
    let text = ascii_text(10_000);
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();

    let chunks = chunker.chunk("doc", &text);

    assert_eq!(chunks.len(), 4);
    for pair in chunks.windows(2) {
        assert_eq!(pair[0].end_offset - pair[1].start_offset, 300);
    }
}

#[test]
fn starts_increase_and_last_window_reaches_text_end() {
    let chunker = FixedWindowChunker::new(3000, 300).unwrap();
    for len in [21, 100, 2999, 3000, 3001, 3500, 9999, 10_000, 12_345] {
        let text = ascii_text(len);
        let chunks = chunker.chunk("doc", &text);

        assert!(!chunks.is_empty(), "no chunks for len {len}");
        for pair in chunks.windows(2) {
            assert!(pair[0].start_offset < pair[1].start_offset);
        }
        assert_eq!(chunks.last().unwrap().end_offset, len);
    }
}

#[test]
fn iteration_count_stays_within_the_step_bound() {
    for (size, overlap, len) in [(100, 0, 5000), (100, 99, 1000), (3000, 300, 50_000)] {
        let chunker = FixedWindowChunker::new(size, overlap).unwrap();
        let text = ascii_text(len);
        let chunks = chunker.chunk("doc", &text);
        let bound = len.div_ceil(size - overlap);
        assert!(
            chunks.len() <= bound,
            "{} chunks exceeds bound {bound} for ({size}, {overlap}, {len})",
            chunks.len()
        );
    }
}

#[test]
fn offsets_count_characters_not_bytes() {
    // Multibyte text: 30 two-byte characters. Byte slicing would panic or
    // drift; char offsets must come out exact.
    let text = "é".repeat(30);
    let chunker = FixedWindowChunker::new(25, 5)
        .unwrap()
        .with_min_chunk_chars(3);

    let chunks = chunker.chunk("doc", &text);

    assert_eq!(chunks.len(), 2);
    assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 25));
    assert_eq!((chunks[1].start_offset, chunks[1].end_offset), (20, 30));
    assert_eq!(chunks[0].text.chars().count(), 25);
    assert_eq!(chunks[1].text.chars().count(), 10);
}
