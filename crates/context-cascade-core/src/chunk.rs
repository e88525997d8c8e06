//! Paragraph-boundary text chunker.
//!
//! Splits document text into [`Chunk`]s of at most `max_chars` characters.
//! Splitting occurs on blank-line paragraph boundaries to keep each chunk
//! coherent. Chunks feed both the keyword search over plain documents and
//! the semantic index.
//!
//! Each chunk carries a SHA-256 hash of its text, which the index builder
//! uses to avoid embedding identical text twice. A chunk is identified by
//! its document name and index.
//!
//! # Algorithm
//!
//! 1. Split text on blank lines (a newline, optional whitespace, a newline).
//! 2. Accumulate paragraphs into a buffer until adding the next paragraph
//!    would exceed `max_chars`.
//! 3. When exceeded, flush the buffer as a chunk and start a new one.
//! 4. If a single paragraph exceeds `max_chars`, hard-split it at the
//!    nearest newline or space boundary.
//!
//! # Example
//!
//! ```rust
//! use context_cascade_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("notes.txt", "Hello world.\n\nSecond paragraph.", 800);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].index, 0);
//! ```

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Chunk size used when indexing documents for semantic search.
pub const DEFAULT_CHUNK_CHARS: usize = 800;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break regex is valid"));

/// A contiguous piece of a document's text.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Name of the document the chunk came from.
    pub document: String,
    pub index: usize,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// Split text into chunks on paragraph boundaries, respecting `max_chars`.
///
/// Indices are contiguous from 0. Empty or whitespace-only text yields no
/// chunks.
pub fn chunk_text(document: &str, text: &str, max_chars: usize) -> Vec<Chunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current_buf = String::new();
    let mut index = 0;

    for para in PARAGRAPH_BREAK.split(text) {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.chars().count()
        } else {
            current_buf.chars().count() + 2 + trimmed.chars().count()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(make_chunk(document, index, &current_buf));
            index += 1;
            current_buf.clear();
        }

        if trimmed.chars().count() > max_chars {
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = hard_split_point(remaining, max_chars);
                let piece = remaining[..split_at].trim();
                if !piece.is_empty() {
                    chunks.push(make_chunk(document, index, piece));
                    index += 1;
                }
                remaining = &remaining[split_at..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        chunks.push(make_chunk(document, index, &current_buf));
    }

    chunks
}

/// Byte index at which to cut `text` so the head holds at most `max_chars`
/// characters, preferring the last newline, then the last space.
fn hard_split_point(text: &str, max_chars: usize) -> usize {
    let limit = match text.char_indices().nth(max_chars) {
        Some((i, _)) => i,
        None => return text.len(),
    };
    let head = &text[..limit];
    let cut = head
        .rfind('\n')
        .or_else(|| head.rfind(' '))
        .map(|pos| pos + 1)
        .unwrap_or(limit);
    if cut == 0 {
        limit
    } else {
        cut
    }
}

/// Create a single [`Chunk`] with its SHA-256 content hash.
fn make_chunk(document: &str, index: usize, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        document: document.to_string(),
        index,
        text: text.to_string(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("doc1", "Hello, world!", 800);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].document, "doc1");
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("doc1", "", 800).is_empty());
        assert!(chunk_text("doc1", "  \n\n  ", 800).is_empty());
    }

    #[test]
    fn test_blank_line_with_spaces_separates_paragraphs() {
        let text = "First paragraph.\n   \nSecond paragraph.";
        let chunks = chunk_text("doc1", text, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "Second paragraph.");
    }

    #[test]
    fn test_paragraphs_accumulate_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text("doc1", text, 800);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("First paragraph."));
        assert!(chunks[0].text.contains("Third paragraph."));
    }

    #[test]
    fn test_indices_contiguous() {
        let text = (0..50)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text("doc1", &text, 40);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i, "Index mismatch at position {}", i);
            assert!(c.text.chars().count() <= 40);
        }
    }

    #[test]
    fn test_oversized_paragraph_hard_split() {
        let text = "word ".repeat(100);
        let chunks = chunk_text("doc1", &text, 32);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= 32);
            assert!(!c.text.starts_with(' '));
        }
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let text = "┌──────────────────┐\n│ Hello world      │\n└──────────────────┘";
        let chunks = chunk_text("doc1", text, 3);
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(!c.text.is_empty());
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let c1 = chunk_text("doc1", text, 5);
        let c2 = chunk_text("doc1", text, 5);
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.hash, b.hash);
            assert_eq!(a.index, b.index);
        }
    }
}
