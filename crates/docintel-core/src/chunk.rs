//! Page-aware recursive character chunker.
//!
//! Splits each extracted PDF page into [`Chunk`]s of at most `chunk_size`
//! characters, with up to `chunk_overlap` characters of trailing context
//! carried from one chunk into the next. Pages are chunked independently
//! so every chunk is attributable to exactly one page.
//!
//! # Algorithm
//!
//! 1. Pick the first separator from `["\n\n", "\n", " ", ""]` that occurs
//!    in the text (`""` means "split between characters").
//! 2. Split on it and drop empty pieces.
//! 3. Greedily merge pieces (re-joined with the separator) while the merged
//!    length stays within `chunk_size`.
//! 4. When a chunk is emitted, drop pieces from its front until what
//!    remains fits within `chunk_overlap`; the remainder seeds the next chunk.
//! 5. Pieces that are themselves too long are split recursively with the
//!    remaining, finer separators.
//!
//! Lengths are counted in characters, never bytes, so multi-byte UTF-8
//! text is never cut inside a code point. Output is deterministic for a
//! fixed input and configuration.
//!
//! # Example
//!
//! ```rust
//! use docintel_core::chunk::{chunk_pages, TextSplitter};
//! use docintel_core::models::PageText;
//!
//! let splitter = TextSplitter::new(1000, 200);
//! let pages = vec![PageText::new(1, "First page."), PageText::new(2, "Second page.")];
//! let chunks = chunk_pages("doc-123", &pages, &splitter);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].page, 2);
//! ```

use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, PageText};

/// Separators tried in order, coarsest first.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character text splitter with overlap.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Create a splitter with the default separators.
    ///
    /// `chunk_overlap` is clamped below `chunk_size`; configuration
    /// validation rejects such values before they get here.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split `text` into trimmed, non-empty pieces.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.as_str();
                finer = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut out = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                out.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            } else {
                out.extend(self.split_with(piece, finer));
            }
        }
        if !fitting.is_empty() {
            out.extend(self.merge(&fitting, separator));
        }
        out
    }

    /// Merge small pieces into chunks, keeping an overlapping tail.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |w: &VecDeque<&str>| if w.is_empty() { 0 } else { sep_len };

            if total + len + joiner(&window) > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);
                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner(&window) > self.chunk_size)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    let dropped = char_len(first) + if window.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(dropped);
                }
            }

            window.push_back(piece);
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Chunk every page of a document.
///
/// Pages whose text is blank after trimming yield no chunks. `chunk_index`
/// is contiguous across the whole document starting at 0; `page_chunk`
/// restarts at 0 on every page.
pub fn chunk_pages(document_id: &str, pages: &[PageText], splitter: &TextSplitter) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        for (page_chunk, text) in splitter.split(&page.text).into_iter().enumerate() {
            let index = chunks.len() as i64;
            chunks.push(make_chunk(
                document_id,
                page.page,
                index,
                page_chunk as i64,
                &text,
            ));
        }
    }
    chunks
}

/// Create a [`Chunk`] with a deterministic id and SHA-256 content hash.
///
/// The id is a UUID v5 of `"{document_id}:{index}"`, so re-chunking the
/// same document yields the same ids.
fn make_chunk(document_id: &str, page: i64, index: i64, page_chunk: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    let name = format!("{}:{}", document_id, index);
    Chunk {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string(),
        document_id: document_id.to_string(),
        page,
        chunk_index: index,
        page_chunk,
        text: text.to_string(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{:03}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::new(1000, 200);
        let out = splitter.split("Hello, world!");
        assert_eq!(out, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_blank_text_no_chunks() {
        let splitter = TextSplitter::new(1000, 200);
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(100, 20);
        let text = words(200);
        let out = splitter.split(&text);
        assert!(out.len() > 1);
        for c in &out {
            assert!(c.chars().count() <= 100, "chunk too long: {}", c.len());
        }
    }

    #[test]
    fn test_zero_overlap_reconstructs_text() {
        let splitter = TextSplitter::new(50, 0);
        let text = words(60);
        let out = splitter.split(&text);
        assert_eq!(out.join(" "), text);
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = TextSplitter::new(60, 20);
        let text = words(40);
        let out = splitter.split(&text);
        assert!(out.len() > 2);
        for pair in out.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "expected '{}' to carry over from '{}'",
                first_word,
                pair[0]
            );
        }
    }

    #[test]
    fn test_overlap_bounds_total_length() {
        let splitter = TextSplitter::new(80, 16);
        let text = words(100);
        let out = splitter.split(&text);
        let total: usize = out.iter().map(|c| c.chars().count()).sum();
        let original = text.chars().count();
        assert!(total >= original);
        assert!(total <= original + out.len() * (16 + 1));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(40, 0);
        let text = "Short paragraph one.\n\nShort paragraph two.\n\nShort paragraph three.";
        let out = splitter.split(text);
        assert_eq!(
            out,
            vec![
                "Short paragraph one.".to_string(),
                "Short paragraph two.".to_string(),
                "Short paragraph three.".to_string(),
            ]
        );
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = TextSplitter::new(10, 0);
        let out = splitter.split(&"x".repeat(35));
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], "x".repeat(10));
        assert_eq!(out[3], "x".repeat(5));
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let splitter = TextSplitter::new(5, 1);
        let out = splitter.split("┌──────────────────┐│ héllo wörld ✓ │");
        assert!(!out.is_empty());
        for c in &out {
            assert!(c.chars().count() <= 5);
        }
    }

    #[test]
    fn test_three_pages_one_chunk_each() {
        let splitter = TextSplitter::new(1000, 200);
        let pages = vec![
            PageText::new(1, "Alpha page talks about apples."),
            PageText::new(2, "Beta page talks about bridges."),
            PageText::new(3, "Gamma page talks about comets."),
        ];
        let chunks = chunk_pages("doc1", &pages, &splitter);
        assert_eq!(chunks.len(), 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.page, i as i64 + 1);
            assert_eq!(c.chunk_index, i as i64);
            assert_eq!(c.page_chunk, 0);
            assert_eq!(c.text, pages[i].text);
        }
    }

    #[test]
    fn test_blank_pages_skipped() {
        let splitter = TextSplitter::new(1000, 200);
        let pages = vec![
            PageText::new(1, "Content."),
            PageText::new(2, "  \n "),
            PageText::new(3, "More content."),
        ];
        let chunks = chunk_pages("doc1", &pages, &splitter);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 3);
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn test_page_chunk_restarts_per_page() {
        let splitter = TextSplitter::new(50, 10);
        let pages = vec![PageText::new(1, words(30)), PageText::new(2, words(30))];
        let chunks = chunk_pages("doc1", &pages, &splitter);
        let first_page2 = chunks.iter().find(|c| c.page == 2).unwrap();
        assert_eq!(first_page2.page_chunk, 0);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64);
        }
    }

    #[test]
    fn test_deterministic() {
        let splitter = TextSplitter::new(40, 10);
        let pages = vec![PageText::new(1, words(50))];
        let c1 = chunk_pages("doc1", &pages, &splitter);
        let c2 = chunk_pages("doc1", &pages, &splitter);
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_ids_differ_across_documents() {
        let splitter = TextSplitter::new(1000, 0);
        let pages = vec![PageText::new(1, "same text")];
        let a = chunk_pages("doc-a", &pages, &splitter);
        let b = chunk_pages("doc-b", &pages, &splitter);
        assert_ne!(a[0].id, b[0].id);
        assert_eq!(a[0].hash, b[0].hash);
    }
}
