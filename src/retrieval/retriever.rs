use serde::{Deserialize, Serialize};

use crate::core::config::RetrievalConfig;
use crate::core::errors::RetrievalError;
use crate::store::{SearchFilter, SearchResult};
use super::search::SimilaritySearch;

/// Retriever tuning.
///
/// `fetch_k` and `keep_top` are independent knobs: the store ranks a wide
/// candidate pool, then a cheap deterministic post-filter keeps the head of
/// it. The wide pool matters when filters encode criteria the vector
/// metric alone does not capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Candidate pool width requested from the store.
    pub fetch_k: usize,
    /// Results surviving the post-filter stage.
    pub keep_top: usize,
    /// Metadata predicates applied by the store before ranking is cut.
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            fetch_k: 100,
            keep_top: 1,
            filters: Vec::new(),
        }
    }
}

impl From<&RetrievalConfig> for RetrieverConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            fetch_k: config.fetch_k,
            keep_top: config.keep_top,
            filters: Vec::new(),
        }
    }
}

/// Adapts [`SimilaritySearch`] into the shape a prompt-assembly stage
/// expects: fixed result count, deterministic ordering.
#[derive(Clone)]
pub struct Retriever {
    search: SimilaritySearch,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(search: SimilaritySearch, config: RetrieverConfig) -> Result<Self, RetrievalError> {
        if config.fetch_k == 0 {
            return Err(RetrievalError::Configuration(
                "fetch_k must be >= 1".to_string(),
            ));
        }
        if config.keep_top == 0 || config.keep_top > config.fetch_k {
            return Err(RetrievalError::Configuration(format!(
                "keep_top must be in 1..={} (got {})",
                config.fetch_k, config.keep_top
            )));
        }
        Ok(Self { search, config })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Fetch a wide ranked pool and keep its head. Returns between 0 and
    /// `keep_top` results; errors from the search path propagate unchanged.
    pub async fn retrieve(&self, text: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        let mut hits = self
            .search
            .query_filtered(text, self.config.fetch_k, &self.config.filters)
            .await?;
        hits.truncate(self.config.keep_top);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::embedding::Embedder;
    use crate::store::{DocumentRecord, VectorStore};
    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            Ok(vec![1.0, 0.0])
        }
    }

    /// Store with 100 documents whose scores descend from 1.0.
    struct PoolStore;

    #[async_trait]
    impl VectorStore for PoolStore {
        async fn search(
            &self,
            _vector: &[f32],
            k: usize,
            _filters: &[SearchFilter],
        ) -> Result<Vec<SearchResult>, RetrievalError> {
            let hits = (0..100.min(k))
                .map(|i| SearchResult {
                    document: DocumentRecord {
                        id: format!("d{}", i),
                        content: format!("passage {}", i),
                        metadata: None,
                    },
                    score: 1.0 - i as f32 / 100.0,
                })
                .collect();
            Ok(hits)
        }
    }

    struct EmptyStore;

    #[async_trait]
    impl VectorStore for EmptyStore {
        async fn search(
            &self,
            _vector: &[f32],
            _k: usize,
            _filters: &[SearchFilter],
        ) -> Result<Vec<SearchResult>, RetrievalError> {
            Ok(vec![])
        }
    }

    fn search_over(store: Arc<dyn VectorStore>) -> SimilaritySearch {
        SimilaritySearch::new(Arc::new(FixedEmbedder), store)
    }

    #[tokio::test]
    async fn overfetch_then_keep_one_returns_the_maximum() {
        let retriever = Retriever::new(
            search_over(Arc::new(PoolStore)),
            RetrieverConfig::default(),
        )
        .unwrap();

        let hits = retriever.retrieve("question").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, "d0");
        assert!((hits[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn empty_store_yields_zero_results() {
        let retriever = Retriever::new(
            search_over(Arc::new(EmptyStore)),
            RetrieverConfig::default(),
        )
        .unwrap();

        let hits = retriever.retrieve("question").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn keep_top_is_independent_of_fetch_k() {
        let retriever = Retriever::new(
            search_over(Arc::new(PoolStore)),
            RetrieverConfig {
                fetch_k: 50,
                keep_top: 5,
                filters: Vec::new(),
            },
        )
        .unwrap();

        let hits = retriever.retrieve("question").await.unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let search = search_over(Arc::new(EmptyStore));
        assert!(Retriever::new(
            search.clone(),
            RetrieverConfig {
                fetch_k: 10,
                keep_top: 0,
                filters: Vec::new(),
            },
        )
        .is_err());
        assert!(Retriever::new(
            search,
            RetrieverConfig {
                fetch_k: 10,
                keep_top: 11,
                filters: Vec::new(),
            },
        )
        .is_err());
    }
}
