//! Data types for raw document units, chunks, and search results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provenance attached to every unit and every chunk derived from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceMetadata {
    /// The path the document was loaded from.
    pub source: String,
    /// 1-based page number, for formats that have pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SourceMetadata {
    /// Metadata for a document without pages.
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), page: None }
    }

    /// Metadata for one page of a paged document.
    pub fn with_page(source: impl Into<String>, page: u32) -> Self {
        Self { source: source.into(), page: Some(page) }
    }
}

impl fmt::Display for SourceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (page {page})", self.source),
            None => f.write_str(&self.source),
        }
    }
}

/// One page or section of a loaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawUnit {
    /// The extracted text.
    pub text: String,
    /// Where the text came from.
    pub metadata: SourceMetadata,
}

impl RawUnit {
    pub fn new(text: impl Into<String>, metadata: SourceMetadata) -> Self {
        Self { text: text.into(), metadata }
    }
}

/// A bounded, contiguous passage of a [`RawUnit`], the atomic retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the form `{unit_index}-{chunk_index}`.
    pub id: String,
    /// The chunk text, a substring of the parent unit's text.
    pub text: String,
    /// Metadata copied unchanged from the parent unit.
    pub metadata: SourceMetadata,
    /// Position of the parent unit in the loaded document.
    pub unit_index: usize,
    /// Position of this chunk within its parent unit.
    pub chunk_index: usize,
    /// Character offset of the chunk inside the parent unit's text.
    pub start: usize,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
