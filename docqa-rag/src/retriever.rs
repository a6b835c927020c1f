//! Top-K retrieval over a [`VectorIndex`].
//!
//! A [`Retriever`] binds an index to a fixed K. Callers that accept any
//! retriever go through [`retrieve_docs`], which dispatches on the calling
//! conventions a [`DocumentRetriever`] declares instead of probing for them.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::validate_top_k;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// The outcome of a retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "results", rename_all = "snake_case")]
pub enum RetrievalResult {
    /// The query was empty or whitespace; no search was performed.
    NoQuestion,
    /// Chunks ranked by descending similarity to the query.
    Ranked(Vec<SearchResult>),
}

impl RetrievalResult {
    pub fn is_no_question(&self) -> bool {
        matches!(self, Self::NoQuestion)
    }

    /// The ranked results; empty for [`RetrievalResult::NoQuestion`].
    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::NoQuestion => &[],
            Self::Ranked(results) => results,
        }
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            Self::NoQuestion => Vec::new(),
            Self::Ranked(results) => results,
        }
    }

    pub fn len(&self) -> usize {
        self.results().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results().is_empty()
    }
}

/// A calling convention a retriever can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverCapability {
    /// The preferred convention: [`DocumentRetriever::invoke`].
    Invoke,
    /// The older convention: [`DocumentRetriever::get_relevant_documents`].
    Legacy,
}

/// Anything that turns a question into ranked chunks.
///
/// Implementors list the conventions they serve in
/// [`capabilities`](DocumentRetriever::capabilities) and override the
/// matching methods; the defaults report [`RagError::UnsupportedRetriever`].
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Conventions this retriever serves, most preferred first.
    fn capabilities(&self) -> &[RetrieverCapability];

    async fn invoke(&self, _query: &str) -> Result<RetrievalResult> {
        Err(RagError::UnsupportedRetriever)
    }

    async fn get_relevant_documents(&self, _query: &str) -> Result<Vec<SearchResult>> {
        Err(RagError::UnsupportedRetriever)
    }
}

/// Retrieve with whichever convention `retriever` declares, preferring
/// [`RetrieverCapability::Invoke`].
///
/// # Errors
///
/// Returns [`RagError::UnsupportedRetriever`] if the retriever declares
/// neither convention, and otherwise whatever the retriever returns.
pub async fn retrieve_docs(
    retriever: &dyn DocumentRetriever,
    query: &str,
) -> Result<RetrievalResult> {
    let capabilities = retriever.capabilities();
    if capabilities.contains(&RetrieverCapability::Invoke) {
        retriever.invoke(query).await
    } else if capabilities.contains(&RetrieverCapability::Legacy) {
        if query.trim().is_empty() {
            return Ok(RetrievalResult::NoQuestion);
        }
        retriever.get_relevant_documents(query).await.map(RetrievalResult::Ranked)
    } else {
        error!("retriever declares no supported calling convention");
        Err(RagError::UnsupportedRetriever)
    }
}

/// A top-K retriever over one index.
///
/// Queries are embedded with the index's own provider, so the query vector
/// always lives in the same space as the indexed chunks.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    k: usize,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("k", &self.k)
            .field("index_len", &self.index.len())
            .finish()
    }
}

impl Retriever {
    /// Bind `index` to a fixed `k`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `k` is outside `2..=10`.
    pub fn new(index: Arc<dyn VectorIndex>, k: usize) -> Result<Self> {
        validate_top_k(k)?;
        Ok(Self { index, k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Embed `query`, search the index, and return the top `k` chunks.
    ///
    /// An empty or whitespace-only query returns [`RetrievalResult::NoQuestion`]
    /// without touching the provider or the index.
    pub async fn get(&self, query: &str) -> Result<RetrievalResult> {
        if query.trim().is_empty() {
            debug!("empty query, skipping search");
            return Ok(RetrievalResult::NoQuestion);
        }

        let provider = self.index.embedding_provider();
        let embedding = provider.embed(query).await.map_err(|e| {
            error!(provider = provider.name(), error = %e, "query embedding failed");
            e
        })?;

        let results = self.index.search(&embedding, self.k).await.map_err(|e| {
            error!(error = %e, "vector search failed");
            e
        })?;

        info!(k = self.k, result_count = results.len(), "retrieval completed");
        Ok(RetrievalResult::Ranked(results))
    }
}

#[async_trait]
impl DocumentRetriever for Retriever {
    fn capabilities(&self) -> &[RetrieverCapability] {
        &[RetrieverCapability::Invoke, RetrieverCapability::Legacy]
    }

    async fn invoke(&self, query: &str) -> Result<RetrievalResult> {
        self.get(query).await
    }

    async fn get_relevant_documents(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.get(query).await.map(RetrievalResult::into_results)
    }
}

/// Create a retriever returning the top `k` chunks of `index`.
pub fn get_retriever(index: Arc<dyn VectorIndex>, k: usize) -> Result<Retriever> {
    Retriever::new(index, k)
}
