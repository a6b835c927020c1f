//! The default build indexes a document with the provider chosen by the
//! environment, which is the local model when `EMBEDDINGS_PROVIDER` is unset.
//!
//! The first run downloads `all-MiniLM-L6-v2` into the fastembed cache.

#![cfg(feature = "local")]

mod common;

use common::{PARAGRAPH_ONE, PARAGRAPH_THREE, PARAGRAPH_TWO};
use docqa_rag::config::PROVIDER_ENV;
use docqa_rag::{
    RawUnit, SourceMetadata, VectorIndex, build_vector_store, get_retriever, split_documents,
};
use std::sync::Arc;

#[tokio::test]
async fn default_config_builds_a_local_vector_store() {
    let selected = std::env::var(PROVIDER_ENV).unwrap_or_default();
    if !selected.trim().is_empty() && !selected.trim().eq_ignore_ascii_case("local") {
        eprintln!("{PROVIDER_ENV} selects another provider; skipping");
        return;
    }

    let units: Vec<RawUnit> = [PARAGRAPH_ONE, PARAGRAPH_TWO, PARAGRAPH_THREE]
        .into_iter()
        .map(|p| RawUnit::new(p, SourceMetadata::new("handbook.txt")))
        .collect();
    let index = build_vector_store(split_documents(&units)).await.unwrap();

    assert_eq!(index.embedding_provider().name(), "local");
    assert_eq!(index.dimensions(), 384);
    assert_eq!(index.len(), 3);

    let retriever = get_retriever(Arc::new(index), 2).unwrap();
    let results = retriever.get("How do green leaves make glucose?").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.results()[0].chunk.text, PARAGRAPH_TWO);
}
