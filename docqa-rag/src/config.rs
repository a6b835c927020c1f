//! Configuration for chunking, retrieval, and embedding provider selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default number of chunks returned per question.
pub const DEFAULT_TOP_K: usize = 4;
/// Smallest accepted top-K.
pub const MIN_TOP_K: usize = 2;
/// Largest accepted top-K.
pub const MAX_TOP_K: usize = 10;

/// Environment variable selecting the embedding backend.
pub const PROVIDER_ENV: &str = "EMBEDDINGS_PROVIDER";
/// Environment variable holding the OpenAI credential.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable overriding the OpenAI embedding model.
pub const OPENAI_MODEL_ENV: &str = "OPENAI_EMBEDDINGS_MODEL";

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks returned per question.
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks returned per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k` is outside `2..=10`
    pub fn build(self) -> Result<RagConfig> {
        validate_chunking(self.config.chunk_size, self.config.chunk_overlap)?;
        validate_top_k(self.config.top_k)?;
        Ok(self.config)
    }
}

pub(crate) fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Configuration("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Configuration(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

pub(crate) fn validate_top_k(k: usize) -> Result<()> {
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&k) {
        return Err(RagError::Configuration(format!(
            "top_k ({k}) must be between {MIN_TOP_K} and {MAX_TOP_K}"
        )));
    }
    Ok(())
}

/// The embedding backends that can be selected by name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process sentence-embedding model.
    #[default]
    Local,
    /// The OpenAI embeddings API.
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAI => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = RagError;

    /// Parse a provider name. Matching ignores case and surrounding whitespace;
    /// an empty value selects the default.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAI),
            other => Err(RagError::Configuration(format!(
                "unknown {PROVIDER_ENV} '{other}' (expected 'local' or 'openai')"
            ))),
        }
    }
}

/// Embedding provider selection, read once before any indexing work.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EmbeddingsConfig {
    /// Which backend to construct.
    pub provider: ProviderKind,
    /// Credential for the OpenAI backend.
    pub openai_api_key: Option<String>,
    /// Optional OpenAI model override.
    pub openai_model: Option<String>,
}

// Keep the API key out of logs.
impl fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("provider", &self.provider)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_model", &self.openai_model)
            .finish()
    }
}

impl EmbeddingsConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] for an unrecognized provider name.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match lookup(PROVIDER_ENV) {
            Some(name) => name.parse()?,
            None => ProviderKind::default(),
        };

        Ok(Self {
            provider,
            openai_api_key: non_empty(OPENAI_API_KEY_ENV),
            openai_model: non_empty(OPENAI_MODEL_ENV),
        })
    }

    /// Select the local provider.
    pub fn local() -> Self {
        Self::default()
    }

    /// Select the OpenAI provider with the given key.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            openai_api_key: Some(api_key.into()),
            openai_model: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_values() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 4);
        assert_eq!(RagConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn builder_rejects_overlap_not_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }

    #[test]
    fn builder_rejects_top_k_out_of_range() {
        assert!(RagConfig::builder().top_k(1).build().is_err());
        assert!(RagConfig::builder().top_k(11).build().is_err());
        assert!(RagConfig::builder().top_k(2).build().is_ok());
        assert!(RagConfig::builder().top_k(10).build().is_ok());
    }

    #[test]
    fn provider_defaults_to_local() {
        let config = EmbeddingsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.provider, ProviderKind::Local);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn provider_name_is_case_and_whitespace_insensitive() {
        let config =
            EmbeddingsConfig::from_lookup(lookup(&[("EMBEDDINGS_PROVIDER", "  OpenAI ")])).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAI);
    }

    #[test]
    fn unknown_provider_fails_fast() {
        let err = EmbeddingsConfig::from_lookup(lookup(&[("EMBEDDINGS_PROVIDER", "cohere")]))
            .unwrap_err();
        assert!(matches!(err, RagError::Configuration(msg) if msg.contains("cohere")));
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let config = EmbeddingsConfig::from_lookup(lookup(&[
            ("EMBEDDINGS_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "   "),
        ]))
        .unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let rendered = format!("{:?}", EmbeddingsConfig::openai("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
