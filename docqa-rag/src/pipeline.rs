//! Indexing pipeline orchestrator.
//!
//! The [`RagPipeline`] runs the indexing phase for one document
//! (load → chunk → embed → index) with a fixed embedding provider and chunker,
//! and hands back an [`ActiveDocument`] ready to be installed in a session.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{EmbeddingsConfig, RagConfig, RagPipeline, create_embedding_provider};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(create_embedding_provider(&EmbeddingsConfig::from_env()?)?)
//!     .build()?;
//!
//! let document = pipeline.index_document("data/uploaded_docs/handbook.pdf").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::RawUnit;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::FlatIndex;
use crate::loader::load_document;
use crate::retriever::Retriever;
use crate::session::ActiveDocument;

/// The indexing pipeline.
///
/// Construct one via [`RagPipeline::builder()`]. The embedding provider is
/// fixed for the pipeline's lifetime; switching providers means building a
/// new pipeline, which re-embeds everything on the next build.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Load, chunk, embed and index the document at `path`.
    ///
    /// The active document is named after the file name.
    ///
    /// # Errors
    ///
    /// Propagates loader errors ([`RagError::UnsupportedFormat`],
    /// [`RagError::Io`], [`RagError::DocumentLoad`]), [`RagError::EmptyIndex`]
    /// when the document has no text, and provider failures.
    pub async fn index_document(&self, path: impl AsRef<Path>) -> Result<ActiveDocument> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let units = load_document(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "failed to load document");
            e
        })?;
        self.index_units(name, &units).await
    }

    /// Chunk, embed and index already-loaded units under the given name.
    pub async fn index_units(
        &self,
        name: impl Into<String>,
        units: &[RawUnit],
    ) -> Result<ActiveDocument> {
        let name = name.into();

        let chunks = self.chunker.chunk_units(units);
        let chunk_count = chunks.len();
        info!(document = %name, unit_count = units.len(), chunk_count, "chunked document");

        let index = FlatIndex::build(chunks, Arc::clone(&self.embedding_provider)).await?;
        let retriever = Retriever::new(Arc::new(index), self.config.top_k)?;

        info!(document = %name, chunk_count, k = self.config.top_k, "document indexed");
        Ok(ActiveDocument::new(name, retriever))
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider is required. Without an explicit chunker a
/// [`RecursiveChunker`] is built from the config's size and overlap; without
/// a config, [`RagConfig::default()`] is used.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set a custom chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if the embedding provider is
    /// missing or the config's chunking parameters are invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::Configuration("embedding_provider is required".to_string())
        })?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(RagPipeline { config, embedding_provider, chunker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_embedding_provider() {
        let err = RagPipeline::builder().build().err().unwrap();
        assert!(matches!(err, RagError::Configuration(msg) if msg.contains("embedding_provider")));
    }
}
