use thiserror::Error;

/// Error taxonomy for the retrieval path.
///
/// Nothing in the retrieval path catches and continues: retrieved passages
/// feed a language-model prompt, and a silently empty context produces a
/// plausible but ungrounded answer. Every failure surfaces to the caller.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Required credential or connection target missing or invalid at
    /// startup. Raised before any network call is attempted.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied parameter rejected up front (e.g. `k == 0`).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Embedding provider call failed: network, auth, rate limit, or a
    /// malformed response body.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// Vector store unreachable or refused the connection.
    #[error("vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// The named search index does not exist in the store.
    #[error("search index not found: {0}")]
    IndexNotFound(String),

    /// Query vector length disagrees with the index's configured
    /// dimensionality. Vectors are never truncated or padded to fit.
    #[error("dimension mismatch: index expects {expected} dimensions, query vector has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An outbound call exceeded its deadline. Distinct from hard failures
    /// so callers can tell "no answer yet" from "definitely failed".
    #[error("timed out: {0}")]
    Timeout(String),
}

impl RetrievalError {
    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::Configuration(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::EmbeddingService(err.to_string())
    }

    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::StoreUnavailable(err.to_string())
    }
}
