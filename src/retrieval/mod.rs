//! Query-side retrieval pipeline.
//!
//! `SimilaritySearch` is the minimal primitive (embed, then search);
//! `Retriever` adapts it for prompt assembly (over-fetch, post-filter,
//! fixed result count); `ContextFormatter` renders the survivors into a
//! context block.

mod formatter;
mod retriever;
mod search;

pub use formatter::{ContextFormatter, FormatterConfig};
pub use retriever::{Retriever, RetrieverConfig};
pub use search::SimilaritySearch;
