//! Embedding provider trait and backend selection.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{EmbeddingsConfig, OPENAI_API_KEY_ENV, ProviderKind};
use crate::error::{RagError, Result};

/// How vectors produced by a provider should be compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity; the score is the cosine itself.
    #[default]
    Cosine,
    /// Euclidean distance; the score is `1 / (1 + distance)`.
    L2,
}

impl DistanceMetric {
    /// Similarity score between two vectors of equal length (higher is closer).
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::L2 => {
                let distance: f32 =
                    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt();
                1.0 / (1.0 + distance)
            }
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (an in-process model, the
/// OpenAI API) behind a unified async interface. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) implementation calls
/// [`embed`](EmbeddingProvider::embed) sequentially; backends that support
/// native batching should override it.
///
/// Vectors from two providers live in different spaces and must never be
/// compared. An index keeps the provider it was built with for that reason.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name for logs and error messages.
    fn name(&self) -> &str;

    /// The metric an index should use for this provider's vectors.
    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }
}

/// Construct the provider selected by `config`.
///
/// Called once per index build; the returned provider is then fixed for the
/// lifetime of that index.
///
/// # Errors
///
/// - [`RagError::MissingCredential`] if `openai` is selected without an API key
/// - [`RagError::Configuration`] if the selected backend was not compiled in
/// - [`RagError::Provider`] if the backend fails to initialize
pub fn create_embedding_provider(config: &EmbeddingsConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Local => local_provider()?,
        ProviderKind::OpenAI => {
            let api_key =
                config.openai_api_key.as_deref().ok_or_else(|| RagError::MissingCredential {
                    provider: ProviderKind::OpenAI.to_string(),
                    variable: OPENAI_API_KEY_ENV.to_string(),
                })?;
            openai_provider(api_key, config.openai_model.as_deref())?
        }
    };

    info!(
        provider = provider.name(),
        dimensions = provider.dimensions(),
        "embedding provider ready"
    );
    Ok(provider)
}

#[cfg(feature = "local")]
fn local_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(crate::local::LocalEmbeddingProvider::new()?))
}

#[cfg(not(feature = "local"))]
fn local_provider() -> Result<Arc<dyn EmbeddingProvider>> {
    Err(feature_disabled(ProviderKind::Local, "local"))
}

#[cfg(feature = "openai")]
fn openai_provider(api_key: &str, model: Option<&str>) -> Result<Arc<dyn EmbeddingProvider>> {
    let mut provider = crate::remote::RemoteEmbeddingProvider::new(api_key)?;
    if let Some(model) = model {
        provider = provider.with_model(model);
    }
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "openai"))]
fn openai_provider(_api_key: &str, _model: Option<&str>) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(feature_disabled(ProviderKind::OpenAI, "openai"))
}

#[cfg(any(not(feature = "local"), not(feature = "openai")))]
fn feature_disabled(kind: ProviderKind, feature: &str) -> RagError {
    RagError::Configuration(format!(
        "EMBEDDINGS_PROVIDER={kind} requires docqa-rag to be built with the `{feature}` feature"
    ))
}
