//! Vector index over one document's chunks.
//!
//! [`VectorIndex`] is the search seam the retriever is written against.
//! [`FlatIndex`] is the in-memory implementation: it embeds every chunk in a
//! single batch at build time and answers queries with an exact scan.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::EmbeddingsConfig;
use crate::document::{Chunk, SearchResult};
use crate::embedding::{DistanceMetric, EmbeddingProvider, create_embedding_provider};
use crate::error::{RagError, Result};

/// A read-only nearest-neighbor index bound to the provider that built it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{FlatIndex, VectorIndex};
///
/// let index = FlatIndex::build(chunks, provider).await?;
/// let query = index.embedding_provider().embed("what is ownership?").await?;
/// let results = index.search(&query, 4).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search for the `top_k` chunks most similar to `embedding`.
    ///
    /// Returns exactly `min(top_k, len)` results ordered by descending score.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the indexed vectors.
    fn dimensions(&self) -> usize;

    /// The provider whose vector space this index lives in. Queries against
    /// the index must be embedded with it.
    fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider>;
}

/// One stored vector and its payload. The entry's position is its internal id.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub embedding: Vec<f32>,
    pub chunk: Chunk,
}

/// An exact, in-memory vector index.
///
/// Immutable once built; a changed document is handled by building a new
/// index and replacing the old one.
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    metric: DistanceMetric,
    provider: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for FlatIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("len", &self.entries.len())
            .field("dimensions", &self.dimensions)
            .field("metric", &self.metric)
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl FlatIndex {
    /// Embed all `chunks` in one batch with `provider` and index them.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyIndex`] if `chunks` is empty
    /// - [`RagError::Provider`] if embedding fails, or the provider returns
    ///   the wrong number of vectors or vectors of the wrong dimension
    pub async fn build(chunks: Vec<Chunk>, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if chunks.is_empty() {
            error!("refusing to build an index from zero chunks");
            return Err(RagError::EmptyIndex);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts).await.map_err(|e| {
            error!(provider = provider.name(), error = %e, "embedding failed during index build");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Provider {
                provider: provider.name().to_string(),
                message: format!(
                    "returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ),
            });
        }

        let dimensions = provider.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(RagError::Provider {
                provider: provider.name().to_string(),
                message: format!("returned a {}-d vector, expected {dimensions}-d", bad.len()),
            });
        }

        let entries: Vec<IndexEntry> = embeddings
            .into_iter()
            .zip(chunks)
            .map(|(embedding, chunk)| IndexEntry { embedding, chunk })
            .collect();

        info!(
            provider = provider.name(),
            chunk_count = entries.len(),
            dimensions,
            "built vector index"
        );

        Ok(Self { entries, dimensions, metric: provider.metric(), provider })
    }

    /// Look up an entry by internal id.
    pub fn get(&self, id: usize) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    /// All entries in insertion (document) order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(id, entry)| (id, self.metric.score(&entry.embedding, embedding)))
            .collect();

        // Stable sort: equal scores keep document order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(id, score)| SearchResult { chunk: self.entries[id].chunk.clone(), score })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }
}

/// Build an index over `chunks`, selecting the embedding provider from the
/// environment (`EMBEDDINGS_PROVIDER`, `OPENAI_API_KEY`).
///
/// The configuration is read and the provider constructed before any chunk
/// is embedded, so configuration errors surface first.
pub async fn build_vector_store(chunks: Vec<Chunk>) -> Result<FlatIndex> {
    let config = EmbeddingsConfig::from_env()?;
    let provider = create_embedding_provider(&config)?;
    FlatIndex::build(chunks, provider).await
}
