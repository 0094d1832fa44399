use std::sync::Arc;

use crate::core::errors::RetrievalError;
use crate::embedding::Embedder;
use crate::store::{SearchFilter, SearchResult, VectorStore};

/// The minimal retrieval primitive: embed the query text, then run a
/// nearest-neighbor search with the resulting vector.
///
/// No caching and no retry; each call is independent and idempotent
/// against an unchanged store. The search cannot start before the
/// embedding completes.
#[derive(Clone)]
pub struct SimilaritySearch {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl SimilaritySearch {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Up to `k` results ordered by descending relevance, exactly as the
    /// store returned them.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchResult>, RetrievalError> {
        self.query_filtered(text, k, &[]).await
    }

    /// Same as [`query`](Self::query) with metadata filters passed through
    /// to the store.
    pub async fn query_filtered(
        &self,
        text: &str,
        k: usize,
        filters: &[SearchFilter],
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        if k == 0 {
            return Err(RetrievalError::InvalidRequest(
                "result cap k must be >= 1".to_string(),
            ));
        }

        let vector = self.embedder.embed(text).await?;
        let hits = self.store.search(&vector, k, filters).await?;

        tracing::debug!(k, hits = hits.len(), "similarity query complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::store::DocumentRecord;
    use super::*;

    /// Embedder that counts calls and returns a fixed vector.
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RetrievalError::EmbeddingService("provider down".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }
    }

    struct StaticStore {
        hits: Vec<SearchResult>,
    }

    #[async_trait]
    impl VectorStore for StaticStore {
        async fn search(
            &self,
            _vector: &[f32],
            k: usize,
            _filters: &[SearchFilter],
        ) -> Result<Vec<SearchResult>, RetrievalError> {
            let mut hits = self.hits.clone();
            hits.truncate(k);
            Ok(hits)
        }
    }

    fn hit(id: &str, score: f32) -> SearchResult {
        SearchResult {
            document: DocumentRecord {
                id: id.to_string(),
                content: id.to_string(),
                metadata: None,
            },
            score,
        }
    }

    #[tokio::test]
    async fn zero_k_rejected_before_any_call() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let search = SimilaritySearch::new(
            embedder.clone(),
            Arc::new(StaticStore { hits: vec![] }),
        );

        let err = search.query("anything", 0).await.unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidRequest(_)));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn embedding_failure_propagates_unchanged() {
        let search = SimilaritySearch::new(
            Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
                fail: true,
            }),
            Arc::new(StaticStore {
                hits: vec![hit("d1", 0.9)],
            }),
        );

        let err = search.query("anything", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmbeddingService(_)));
    }

    #[tokio::test]
    async fn results_pass_through_in_store_order() {
        let search = SimilaritySearch::new(
            Arc::new(CountingEmbedder {
                calls: AtomicUsize::new(0),
                fail: false,
            }),
            Arc::new(StaticStore {
                hits: vec![hit("a", 0.9), hit("b", 0.5), hit("c", 0.1)],
            }),
        );

        let hits = search.query("question", 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
