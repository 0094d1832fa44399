//! Query-side vector similarity retrieval for RAG pipelines.
//!
//! The flow is an explicit ordered sequence of typed calls:
//! question → [`Embedder`] → query vector → [`VectorStore`] search →
//! ranked results → [`Retriever`] post-filter → [`ContextFormatter`] →
//! context string for the (external) prompt stage.
//!
//! Indexing, ingestion, prompt templating, and the model call itself are
//! out of scope; this crate owns only the retrieval contract.

pub mod core;
pub mod embedding;
pub mod logging;
pub mod retrieval;
pub mod store;

pub use crate::core::config::RetrievalConfig;
pub use crate::core::errors::RetrievalError;
pub use embedding::{Embedder, OpenAiEmbedder};
pub use retrieval::{ContextFormatter, FormatterConfig, Retriever, RetrieverConfig, SimilaritySearch};
pub use store::{
    DocumentRecord, HttpVectorStore, SearchFilter, SearchResult, SqliteVectorStore, VectorStore,
};
