//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing or querying a document.
#[derive(Debug, Error)]
pub enum RagError {
    /// The file extension does not map to a supported loader.
    #[error("Unsupported file type: '{extension}' (expected .pdf, .txt or .docx)")]
    UnsupportedFormat {
        /// The extension that was rejected (empty when the path has none).
        extension: String,
    },

    /// The file exists but its content could not be extracted.
    #[error("Failed to load document '{path}': {message}")]
    DocumentLoad {
        /// The path of the document.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// Invalid pipeline or provider configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider was selected but the credential it needs is absent.
    #[error("{variable} not set but EMBEDDINGS_PROVIDER={provider}")]
    MissingCredential {
        /// The selected provider name.
        provider: String,
        /// The environment variable that should hold the credential.
        variable: String,
    },

    /// An embedding backend failed (network, auth, malformed response).
    #[error("Embedding error ({provider}): {message}")]
    Provider {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Index construction was attempted with zero chunks.
    #[error("No content to index: the document produced zero chunks")]
    EmptyIndex,

    /// A query vector does not match the dimensionality of the index.
    #[error("Dimension mismatch: index holds {expected}-d vectors, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the indexed vectors.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// The retriever declares neither the preferred nor the legacy calling convention.
    #[error("Retriever supports neither invoke nor get_relevant_documents")]
    UnsupportedRetriever,

    /// A question was asked before any document was indexed in the session.
    #[error("No document has been indexed in this session")]
    NoActiveDocument,

    /// An I/O error while reading a document.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for document Q&A operations.
pub type Result<T> = std::result::Result<T, RagError>;
