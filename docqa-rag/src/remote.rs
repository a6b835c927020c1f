//! Remote embedding provider using the OpenAI embeddings API.
//!
//! This module is only available when the `openai` feature is enabled.

use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{OPENAI_API_KEY_ENV, ProviderKind};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI embeddings API endpoint.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The default model for OpenAI embeddings.
const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Inputs sent per request unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// The API rejects requests with more inputs than this.
pub const MAX_BATCH_SIZE: usize = 2048;

const PROVIDER: &str = "openai";

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// Large batches are split into requests of at most
/// [`with_batch_size`](RemoteEmbeddingProvider::with_batch_size) inputs,
/// sent one after another. The provider never retries. Failures surface as
/// [`RagError::Provider`] and abort the build or query in progress; apply a
/// deadline with [`with_timeout`](RemoteEmbeddingProvider::with_timeout).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::remote::RemoteEmbeddingProvider;
///
/// let provider = RemoteEmbeddingProvider::new("sk-...")?
///     .with_timeout(Duration::from_secs(30))?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
    batch_size: usize,
}

impl RemoteEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// Uses the default model (`text-embedding-3-small`) and dimensions (1536).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingCredential`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(missing_key());
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: OPENAI_EMBEDDINGS_URL.into(),
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV).map_err(|_| missing_key())?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// This also updates the value returned by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Point the provider at an OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Cap the number of inputs per request, clamped to `1..=2048`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| provider_error(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn request_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                provider_error(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to read response body");
            provider_error(format!("failed to read response body: {e}"))
        })?;

        if !status.is_success() {
            error!(provider = PROVIDER, %status, "API error");
            return Err(provider_error(format!("API returned {status}: {}", error_detail(body))));
        }

        parse_embeddings(&body, texts.len())
    }
}

/// Split `len` inputs into consecutive ranges of at most `batch_size`.
fn plan_batches(len: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len).step_by(batch_size).map(|start| start..(start + batch_size).min(len)).collect()
}

fn missing_key() -> RagError {
    RagError::MissingCredential {
        provider: ProviderKind::OpenAI.to_string(),
        variable: OPENAI_API_KEY_ENV.to_string(),
    }
}

fn provider_error(message: impl Into<String>) -> RagError {
    RagError::Provider { provider: PROVIDER.into(), message: message.into() }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Decode a successful response body into vectors ordered like the input.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let response: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| provider_error(format!("failed to parse response: {e}")))?;

    let mut data = response.data;
    data.sort_by_key(|d| d.index);
    if data.len() != expected {
        return Err(provider_error(format!(
            "API returned {} embeddings for {expected} inputs",
            data.len()
        )));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

/// Extract the human-readable message from an error body, if it has one.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| provider_error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches = plan_batches(texts.len(), self.batch_size);
        debug!(
            provider = PROVIDER,
            inputs = texts.len(),
            requests = batches.len(),
            model = %self.model,
            "embedding batch"
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for range in batches {
            vectors.extend(self.request_batch(&texts[range]).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
