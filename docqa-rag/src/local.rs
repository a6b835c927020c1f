//! In-process embedding provider running `all-MiniLM-L6-v2` through `fastembed`.
//!
//! This module is only available when the `local` feature is enabled. The
//! model files are fetched into the cache directory on first use; after that
//! no network access or credential is needed.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Output dimensionality of `all-MiniLM-L6-v2`.
const DIMENSIONS: usize = 384;

const PROVIDER: &str = "local";

/// An [`EmbeddingProvider`] that runs a small sentence-embedding model in-process.
///
/// Inference is CPU-bound, so each call runs on Tokio's blocking pool.
/// Output is deterministic for a given model and input.
pub struct LocalEmbeddingProvider {
    model: Arc<Mutex<TextEmbedding>>,
    batch_size: Option<usize>,
}

impl LocalEmbeddingProvider {
    /// Load the default model using fastembed's default cache directory.
    pub fn new() -> Result<Self> {
        Self::with_options(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
    }

    /// Load the default model, caching its files under `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_cache_dir(cache_dir.into()),
        )
    }

    fn with_options(options: InitOptions) -> Result<Self> {
        let model = TextEmbedding::try_new(options.with_show_download_progress(false))
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "failed to load embedding model");
                provider_error(format!("failed to load all-MiniLM-L6-v2: {e}"))
            })?;
        info!(provider = PROVIDER, model = "all-MiniLM-L6-v2", "loaded embedding model");
        Ok(Self { model: Arc::new(Mutex::new(model)), batch_size: None })
    }

    /// Override fastembed's internal batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

fn provider_error(message: impl Into<String>) -> RagError {
    RagError::Provider { provider: PROVIDER.into(), message: message.into() }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| provider_error("model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let batch_size = self.batch_size;
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();

        tokio::task::spawn_blocking(move || {
            let mut guard =
                model.lock().map_err(|_| provider_error("embedding model lock poisoned"))?;
            TextEmbedding::embed(&mut *guard, owned, batch_size).map_err(|e| {
                error!(provider = PROVIDER, error = %e, "inference failed");
                provider_error(format!("inference failed: {e}"))
            })
        })
        .await
        .map_err(|e| provider_error(format!("embedding task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
