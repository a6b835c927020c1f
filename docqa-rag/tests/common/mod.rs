//! Shared test doubles: a deterministic bag-of-words embedder and a
//! search-counting index wrapper.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, FlatIndex, SearchResult, VectorIndex};

/// Hashes lower-cased words into a fixed number of buckets and L2-normalizes.
///
/// Texts sharing words get high cosine similarity, which is enough to test
/// ranking without a real model.
pub struct BagOfWordsEmbedder {
    name: String,
    dimensions: usize,
    embedded_texts: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn new(name: &str, dimensions: usize) -> Self {
        Self { name: name.to_string(), dimensions, embedded_texts: AtomicUsize::new(0) }
    }

    /// Total number of texts embedded so far (batch members count individually).
    pub fn embedded_texts(&self) -> usize {
        self.embedded_texts.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x100000001b3));
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        self.embedded_texts.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wraps a [`FlatIndex`] and counts `search` calls.
pub struct CountingIndex {
    inner: FlatIndex,
    searches: AtomicUsize,
}

impl CountingIndex {
    pub fn new(inner: FlatIndex) -> Self {
        Self { inner, searches: AtomicUsize::new(0) }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for CountingIndex {
    async fn search(&self, embedding: &[f32], top_k: usize) -> docqa_rag::Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(embedding, top_k).await
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        self.inner.embedding_provider()
    }
}

pub const PARAGRAPH_ONE: &str = "Rust is a systems programming language focused on safety, \
     speed, and concurrency without a garbage collector.";
pub const PARAGRAPH_TWO: &str = "Photosynthesis converts sunlight, water and carbon dioxide \
     into glucose inside the chloroplasts of green leaves.";
pub const PARAGRAPH_THREE: &str = "The Treaty of Westphalia ended the Thirty Years War in \
     1648 and reshaped European diplomacy for centuries.";

/// Three paragraphs with disjoint vocabularies, separated by blank lines.
pub fn three_paragraphs() -> String {
    format!("{PARAGRAPH_ONE}\n\n{PARAGRAPH_TWO}\n\n{PARAGRAPH_THREE}\n")
}
