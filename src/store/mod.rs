//! Vector store handles.
//!
//! A store handle is a configured connection to one collection and one
//! search index of (vector, passage, metadata) records. The records are
//! owned by the store and read-only from this crate's perspective; the
//! handle exposes the query side only.

mod http;
mod sqlite;

pub use http::HttpVectorStore;
pub use sqlite::SqliteVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::RetrievalError;

/// A stored passage with its identifier and optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier.
    pub id: String,
    /// The text payload injected into prompts downstream.
    pub content: String,
    /// Optional metadata (JSON object).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One similarity hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: DocumentRecord,
    /// Relevance score, higher = more relevant (cosine similarity).
    pub score: f32,
}

/// Equality predicate on a document metadata field, applied by the store
/// after the similarity ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilter {
    pub field: String,
    pub value: serde_json::Value,
}

impl SearchFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Query-side contract of an external vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest-neighbor lookup: up to `k` results ordered by non-increasing
    /// relevance score. Equal scores keep the store's native iteration
    /// order, which the store may not guarantee across versions.
    ///
    /// The query vector's length must match the index's configured
    /// dimensionality; mismatches fail with
    /// [`RetrievalError::DimensionMismatch`], never silent truncation.
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filters: &[SearchFilter],
    ) -> Result<Vec<SearchResult>, RetrievalError>;

    /// Same lookup, surfacing raw (document, score) pairs for callers that
    /// want relevance values without the result wrapper.
    async fn search_with_score(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<(DocumentRecord, f32)>, RetrievalError> {
        let hits = self.search(vector, k, &[]).await?;
        Ok(hits.into_iter().map(|hit| (hit.document, hit.score)).collect())
    }
}

/// Keep only the hits whose metadata satisfies every filter.
///
/// Shared by in-process stores; remote stores apply filters server-side.
pub(crate) fn apply_filters(hits: &mut Vec<SearchResult>, filters: &[SearchFilter]) {
    if filters.is_empty() {
        return;
    }
    hits.retain(|hit| {
        let metadata = match &hit.document.metadata {
            Some(serde_json::Value::Object(map)) => map,
            _ => return false,
        };
        filters
            .iter()
            .all(|filter| metadata.get(&filter.field) == Some(&filter.value))
    });
}
