//! Embedding generation.
//!
//! Turns free text into a fixed-length vector. The trait is the seam the
//! retrieval pipeline depends on; the `openai` module provides the
//! OpenAI-compatible HTTP implementation.

mod openai;

pub use openai::OpenAiEmbedder;

use async_trait::async_trait;

use crate::core::errors::RetrievalError;

/// Text-to-vector embedding provider.
///
/// Deterministic for a fixed model version and input. Stateless beyond the
/// network call.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text. Empty text is permitted; the provider decides
    /// what a degenerate embedding looks like.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}
