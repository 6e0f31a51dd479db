//! Versioned, page-aware text chunker.
//!
//! Splits a document's extracted text into [`ChunkDraft`]s. Pages are
//! delimited by form feeds (`\u{0C}`), as emitted by the extraction layer,
//! and numbered from 1. Within a page, paragraphs (`\n\n`) are greedily
//! packed into windows of at most `max_chars`; a single oversized paragraph
//! is hard-split at the last newline or space before the window edge.
//!
//! The chunking rule is pinned under a version tag: the same tag must never
//! drift, and an unknown tag is a validation error so a future `v2` cannot
//! silently fall back to `v1` output. `v1` has no overlap.

use crate::error::CoreError;
use crate::models::{ChunkDraft, DocumentMeta};

/// Window size for the `v1` tag, in characters.
const V1_MAX_CHARS: usize = 2000;

/// A parsed chunking version tag with its pinned parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingVersion {
    tag: String,
    max_chars: usize,
}

impl ChunkingVersion {
    /// Parse a version tag. Unknown tags fail loudly.
    pub fn parse(tag: &str) -> Result<Self, CoreError> {
        match tag {
            "v1" => Ok(Self {
                tag: tag.to_string(),
                max_chars: V1_MAX_CHARS,
            }),
            other => Err(CoreError::Validation(format!(
                "unknown chunking version: '{}'",
                other
            ))),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Split extracted text into ordered chunk drafts.
///
/// Deterministic: identical `(raw_text, version, meta)` always yields a
/// bit-identical sequence. Empty or whitespace-only input yields an empty
/// sequence (the caller treats that as "needs more text", not an error);
/// any other input yields at least one chunk. Linear in input length.
///
/// `meta.document_type` selects the paragraph separator: `"plano"` text
/// (plan labels, coordinate tables) carries no blank-line structure, so it
/// packs single lines instead of paragraphs.
pub fn chunk_text(
    raw_text: &str,
    version: &ChunkingVersion,
    meta: &DocumentMeta,
) -> Result<Vec<ChunkDraft>, CoreError> {
    let separator = match meta.document_type.as_deref() {
        Some("plano") => "\n",
        _ => "\n\n",
    };

    let mut drafts = Vec::new();
    for (page_idx, page_text) in raw_text.split('\u{0C}').enumerate() {
        let page_number = (page_idx + 1) as u32;
        chunk_page(page_text, page_number, separator, version.max_chars, &mut drafts);
    }
    Ok(drafts)
}

/// Chunk one page's text, appending drafts with contiguous indices from 0.
fn chunk_page(
    page_text: &str,
    page_number: u32,
    separator: &str,
    max_chars: usize,
    out: &mut Vec<ChunkDraft>,
) {
    let mut current_buf = String::new();
    let mut chunk_index: u32 = 0;

    let mut flush = |buf: &mut String, index: &mut u32, out: &mut Vec<ChunkDraft>| {
        if !buf.is_empty() {
            out.push(ChunkDraft {
                page_number,
                chunk_index: *index,
                text: std::mem::take(buf),
            });
            *index += 1;
        }
    };

    for para in page_text.split(separator) {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Flush the window if this paragraph would overflow it.
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + separator.len() + trimmed.len()
        };
        if would_be > max_chars && !current_buf.is_empty() {
            flush(&mut current_buf, &mut chunk_index, out);
        }

        if trimmed.len() > max_chars {
            flush(&mut current_buf, &mut chunk_index, out);
            // Hard split, preferring a newline or space before the edge.
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let limit = floor_char_boundary(remaining, max_chars);
                let actual_split = if limit < remaining.len() {
                    remaining[..limit]
                        .rfind('\n')
                        .or_else(|| remaining[..limit].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(limit)
                } else {
                    limit
                };
                let piece = remaining[..actual_split].trim();
                if !piece.is_empty() {
                    out.push(ChunkDraft {
                        page_number,
                        chunk_index,
                        text: piece.to_string(),
                    });
                    chunk_index += 1;
                }
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str(separator);
            }
            current_buf.push_str(trimmed);
        }
    }

    flush(&mut current_buf, &mut chunk_index, out);
}

/// Largest byte index `<= limit` that falls on a char boundary.
fn floor_char_boundary(s: &str, limit: usize) -> usize {
    if limit >= s.len() {
        return s.len();
    }
    let mut idx = limit;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
