//! Sentence-boundary text chunker.
//!
//! Splits cleaned document text into bounded, overlapping spans. A window
//! ends at the nearest sentence-terminal mark (CJK or Latin) found in its
//! back half; otherwise it is cut hard at `chunk_size`. All indexing is
//! over Unicode code points, never bytes — input freely mixes CJK and
//! Latin text whose byte widths differ.

use crate::error::{Error, Result};

/// Sentence-terminal marks accepted as chunk boundaries.
const SENTENCE_ENDS: [char; 6] = ['。', '！', '？', '.', '!', '?'];

/// Split `text` into chunks of at most `chunk_size` characters, with up to
/// `overlap` characters repeated between consecutive chunks.
///
/// Text no longer than `chunk_size` is returned as a single chunk,
/// unmodified. Longer text is covered with no gaps; each non-final window
/// prefers to end just after a sentence-terminal mark, but only when that
/// mark lies strictly past the window's midpoint (avoids degenerate short
/// chunks). Chunks are trimmed and empty results discarded.
///
/// # Errors
///
/// `Error::Configuration` when `chunk_size == 0` or `overlap >= chunk_size`
/// (forward progress would be impossible).
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 {
        return Err(Error::Configuration("chunk_size must be > 0".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::Configuration(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        return Ok(vec![text.to_string()]);
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = start + chunk_size;

        if end < chars.len() {
            // Not the last window: search backward for the nearest sentence
            // end, accepting it only past the window midpoint.
            if let Some(pos) = (start..end).rev().find(|&i| SENTENCE_ENDS.contains(&chars[i])) {
                if pos as f64 > start as f64 + chunk_size as f64 * 0.5 {
                    end = pos + 1;
                }
            }
        }
        let end = end.min(chars.len());

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        // The max is mandatory: when the boundary search moved `end` back
        // by more than `overlap`, the naive advance would land behind the
        // accepted end and loop forever.
        start = (start + chunk_size - overlap).max(end);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 500, 50).unwrap();
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn text_exactly_chunk_size_is_single_chunk() {
        let text = "a".repeat(500);
        let chunks = chunk_text(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let err = chunk_text("anything", 100, 100).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = chunk_text("anything", 0, 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn sentence_aligned_ascii_text_yields_two_chunks() {
        // 600 characters of repeating "A.": the first window ends at the
        // period just before position 500, the second covers the rest.
        let text = "A.".repeat(300);
        let chunks = chunk_text(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].chars().count() <= 500);
        assert!(chunks[0].ends_with('.'));
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total >= 600, "chunks must cover the full text");
    }

    #[test]
    fn long_text_without_sentence_marks_reconstructs_on_hard_cuts() {
        let text = "字".repeat(1000);
        let chunks = chunk_text(&text, 400, 50).unwrap();
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 400);
        }
        // Hard cuts never step behind the accepted end, so the chunks form
        // an exact partition of the input.
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn cjk_sentence_marks_are_boundaries() {
        let mut text = String::new();
        for i in 0..80 {
            text.push_str(&format!("这是第{}句话。", i));
        }
        let chunks = chunk_text(&text, 100, 10).unwrap();
        assert!(chunks.len() > 1);
        // Every non-final chunk ends on a sentence mark because the text is
        // dense with them.
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('。'), "chunk {:?} should end at a sentence mark", chunk);
        }
    }

    #[test]
    fn boundary_is_ignored_before_window_midpoint() {
        // One period early in the window, then unbroken text: the early
        // boundary is rejected and the window is cut hard at chunk_size.
        let text = format!("ab.{}", "c".repeat(400));
        let chunks = chunk_text(&text, 100, 10).unwrap();
        assert_eq!(chunks[0].chars().count(), 100);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "麒麟操作系统支持多种处理器架构。".repeat(60);
        let a = chunk_text(&text, 300, 30).unwrap();
        let b = chunk_text(&text, 300, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chunking_terminates_when_boundary_moves_end_far_back() {
        // Sentence mark just past the midpoint forces end backward by more
        // than the overlap; the advance guard must still make progress.
        let mut text = String::new();
        text.push_str(&"x".repeat(55));
        text.push('.');
        text.push_str(&"y".repeat(400));
        let chunks = chunk_text(&text, 100, 40).unwrap();
        assert!(chunks.len() >= 2);
        let covered: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(covered >= 400);
    }
}
