//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits each unit hierarchically: a chunk ends at the last paragraph break
//! that fits, else the last line break, sentence end, or word break, and only
//! as a last resort at the hard character limit. Consecutive chunks of a unit
//! share exactly `chunk_overlap` characters.
//!
//! All sizes are measured in `char`s, never bytes.

use tracing::debug;

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, validate_chunking};
use crate::document::{Chunk, RawUnit};
use crate::error::Result;

/// A strategy for splitting loaded units into retrieval chunks.
pub trait Chunker: Send + Sync {
    /// Split a single unit. `unit_index` is the unit's position in the document.
    ///
    /// Returns an empty `Vec` if the unit has no non-whitespace text.
    fn chunk_unit(&self, unit_index: usize, unit: &RawUnit) -> Vec<Chunk>;

    /// Split every unit, preserving document order.
    fn chunk_units(&self, units: &[RawUnit]) -> Vec<Chunk> {
        units.iter().enumerate().flat_map(|(i, unit)| self.chunk_unit(i, unit)).collect()
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.chunk_units(&units);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP }
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`](crate::RagError::Configuration) if
    /// `chunk_size` is zero or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into `(start, text)` pieces, `start` being a char offset.
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let Some(first) = chars.iter().position(|c| !c.is_whitespace()) else {
            return Vec::new();
        };
        let last = chars.iter().rposition(|c| !c.is_whitespace()).unwrap_or(first);
        let stop = last + 1;

        let mut pieces = Vec::new();
        let mut start = first;
        loop {
            let limit = (start + self.chunk_size).min(stop);
            let end = if limit == stop {
                stop
            } else {
                // Every candidate end lies past the overlap so the next start advances.
                find_break(&chars, start + self.chunk_overlap + 1, limit)
            };

            pieces.push((start, chars[start..end].iter().collect()));
            if end >= stop {
                break;
            }

            start = end - self.chunk_overlap;
            if self.chunk_overlap == 0 {
                while chars[start].is_whitespace() {
                    start += 1;
                }
            }
        }
        pieces
    }
}

/// Boundary kinds in priority order. Each predicate looks at the position
/// just after a candidate end (`chars[..end]` is the chunk).
const BOUNDARIES: [fn(&[char], usize) -> bool; 4] =
    [is_paragraph_end, is_line_end, is_sentence_end, is_word_end];

fn is_paragraph_end(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n'
}

fn is_line_end(chars: &[char], end: usize) -> bool {
    chars[end - 1] == '\n'
}

fn is_sentence_end(chars: &[char], end: usize) -> bool {
    end >= 2 && chars[end - 1].is_whitespace() && matches!(chars[end - 2], '.' | '!' | '?')
}

fn is_word_end(chars: &[char], end: usize) -> bool {
    chars[end - 1].is_whitespace()
}

/// Pick the chunk end in `lower..=limit`: the last position matching the
/// highest-priority boundary that occurs, else `limit` itself.
fn find_break(chars: &[char], lower: usize, limit: usize) -> usize {
    for boundary in BOUNDARIES {
        if let Some(end) = (lower..=limit).rev().find(|&end| boundary(chars, end)) {
            return end;
        }
    }
    limit
}

impl Chunker for RecursiveChunker {
    fn chunk_unit(&self, unit_index: usize, unit: &RawUnit) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split_text(&unit.text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start, text))| Chunk {
                id: format!("{unit_index}-{chunk_index}"),
                text,
                metadata: unit.metadata.clone(),
                unit_index,
                chunk_index,
                start,
            })
            .collect();

        debug!(unit_index, source = %unit.metadata, chunk_count = chunks.len(), "chunked unit");
        chunks
    }
}

/// Split loaded units with the default chunk size (1000) and overlap (200).
pub fn split_documents(units: &[RawUnit]) -> Vec<Chunk> {
    RecursiveChunker::default().chunk_units(units)
}
