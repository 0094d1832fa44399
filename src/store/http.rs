//! Remote vector-search service client.
//!
//! Speaks a small JSON protocol against a hosted store: one POST per query
//! carrying the vector, the result cap, and any metadata filters. The
//! service owns indexing and storage; this handle only issues searches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::core::config::RetrievalConfig;
use crate::core::errors::RetrievalError;
use super::{SearchFilter, SearchResult, VectorStore};

#[derive(Clone)]
pub struct HttpVectorStore {
    base_url: String,
    api_key: Option<String>,
    collection: String,
    index_name: String,
    client: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    expected_dimension: Option<usize>,
    #[serde(default)]
    got_dimension: Option<usize>,
}

impl HttpVectorStore {
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(RetrievalError::config)?;

        Ok(Self {
            base_url: config.store_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
            collection: config.collection.clone(),
            index_name: config.index_name.clone(),
            client,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/collections/{}/indexes/{}/search",
            self.base_url, self.collection, self.index_name
        )
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RetrievalError {
        if err.is_timeout() {
            RetrievalError::Timeout(format!("store search against {}", self.base_url))
        } else {
            RetrievalError::store(err)
        }
    }

    /// Translate a non-success response into the error taxonomy. The
    /// service reports structured codes; anything unrecognized degrades to
    /// `StoreUnavailable` with the raw detail attached.
    fn map_status_error(&self, status: StatusCode, body: &str) -> RetrievalError {
        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
            match parsed.code.as_deref() {
                Some("index_not_found") => {
                    return RetrievalError::IndexNotFound(self.index_name.clone());
                }
                Some("dimension_mismatch") => {
                    if let (Some(expected), Some(got)) =
                        (parsed.expected_dimension, parsed.got_dimension)
                    {
                        return RetrievalError::DimensionMismatch { expected, got };
                    }
                }
                _ => {}
            }
            return RetrievalError::StoreUnavailable(format!("{}: {}", status, parsed.error));
        }
        if status == StatusCode::NOT_FOUND {
            return RetrievalError::IndexNotFound(self.index_name.clone());
        }
        RetrievalError::StoreUnavailable(format!("{}: {}", status, body))
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        filters: &[SearchFilter],
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let body = json!({
            "vector": vector,
            "k": k,
            "filters": filters,
        });

        let mut request = self.client.post(self.search_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(self.map_status_error(status, &detail));
        }

        let payload: SearchResponse = res
            .json()
            .await
            .map_err(|e| RetrievalError::StoreUnavailable(format!("malformed response: {}", e)))?;

        tracing::debug!(
            collection = %self.collection,
            index = %self.index_name,
            hits = payload.hits.len(),
            "store search complete"
        );
        Ok(payload.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> HttpVectorStore {
        let config = RetrievalConfig::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "RAGQUERY_STORE_URL" => Some("http://localhost:6644/".to_string()),
            _ => None,
        })
        .unwrap();
        HttpVectorStore::new(&config).unwrap()
    }

    #[test]
    fn search_url_strips_trailing_slash() {
        let store = test_store();
        assert_eq!(
            store.search_url(),
            "http://localhost:6644/collections/langchain.vectorSearch/indexes/default/search"
        );
    }

    #[test]
    fn structured_index_error_maps_to_index_not_found() {
        let store = test_store();
        let err = store.map_status_error(
            StatusCode::NOT_FOUND,
            r#"{"error": "no such index", "code": "index_not_found"}"#,
        );
        assert!(matches!(err, RetrievalError::IndexNotFound(name) if name == "default"));
    }

    #[test]
    fn structured_dimension_error_carries_both_sizes() {
        let store = test_store();
        let err = store.map_status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "bad vector", "code": "dimension_mismatch", "expected_dimension": 1536, "got_dimension": 3}"#,
        );
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch { expected: 1536, got: 3 }
        ));
    }

    #[test]
    fn bare_404_maps_to_index_not_found() {
        let store = test_store();
        let err = store.map_status_error(StatusCode::NOT_FOUND, "not found");
        assert!(matches!(err, RetrievalError::IndexNotFound(_)));
    }

    #[test]
    fn other_statuses_map_to_store_unavailable() {
        let store = test_store();
        let err = store.map_status_error(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
        assert!(matches!(err, RetrievalError::StoreUnavailable(_)));
    }
}
