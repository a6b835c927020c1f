//! Grounded question answering over a single uploaded document.
//!
//! This crate implements the retrieval core:
//! - loading `.pdf`, `.txt` and `.docx` files into page-level units
//! - recursive, overlap-preserving chunking
//! - pluggable embedding providers (in-process model or OpenAI)
//! - an exact in-memory vector index and a top-K retriever
//! - an extractive answer composer and per-user session state
//!
//! The entry points mirror the indexing and query phases:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::*;
//!
//! let units = load_document("handbook.txt")?;
//! let chunks = split_documents(&units);
//! let index = build_vector_store(chunks).await?;
//! let retriever = get_retriever(Arc::new(index), 4)?;
//! let results = retrieve_docs(&retriever, "What is the refund policy?").await?;
//! let answer = build_rag_answer("What is the refund policy?", results.into_results());
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Enables                                              |
//! |----------|------------------------------------------------------|
//! | `pdf`    | PDF loading via `lopdf` (default)                    |
//! | `docx`   | DOCX loading via `docx-rs` (default)                 |
//! | `local`  | [`LocalEmbeddingProvider`] via `fastembed` (default) |
//! | `openai` | [`RemoteEmbeddingProvider`] via `reqwest`            |
//! | `full`   | all of the above                                     |

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod session;

#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "openai")]
pub mod remote;

pub use answer::{
    AnswerComposer, ExtractiveComposer, NO_CONTEXT_ANSWER, NO_QUESTION_ANSWER, RagAnswer,
    SourceCitation, build_rag_answer,
};
pub use chunking::{Chunker, RecursiveChunker, split_documents};
pub use config::{EmbeddingsConfig, ProviderKind, RagConfig, RagConfigBuilder};
pub use document::{Chunk, RawUnit, SearchResult, SourceMetadata};
pub use embedding::{DistanceMetric, EmbeddingProvider, create_embedding_provider};
pub use error::{RagError, Result};
pub use index::{FlatIndex, IndexEntry, VectorIndex, build_vector_store};
pub use loader::{DocumentFormat, load_document};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use retriever::{
    DocumentRetriever, RetrievalResult, Retriever, RetrieverCapability, get_retriever,
    retrieve_docs,
};
pub use session::{ActiveDocument, ChatMessage, ChatRole, SessionState};

#[cfg(feature = "local")]
pub use local::LocalEmbeddingProvider;
#[cfg(feature = "openai")]
pub use remote::RemoteEmbeddingProvider;
