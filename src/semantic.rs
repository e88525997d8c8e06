//! Semantic search adapter.
//!
//! The last search strategy of the cascade: embed the raw query, ask the
//! vector index for the nearest chunks. Both calls together are bounded by
//! a timeout. Any failure or timeout is logged and reported as an empty
//! result so that the cascade moves on to the corpus dump.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use context_cascade_core::embedding::Embedder;
use context_cascade_core::error::RetrievalError;
use context_cascade_core::index::{VectorIndex, VectorMatch};

pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    timeout: Duration,
}

impl SemanticSearch {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
            timeout,
        }
    }

    /// Embed `query` and search the index, failing on error or timeout.
    pub async fn try_search(&self, query: &str) -> Result<Vec<VectorMatch>, RetrievalError> {
        let work = async {
            let query_vec = self
                .embedder
                .embed_one(query)
                .await
                .map_err(|e| RetrievalError::ExternalService(format!("embedding failed: {:#}", e)))?;
            self.index
                .vector_search(&query_vec, self.top_k)
                .await
                .map_err(|e| RetrievalError::ExternalService(format!("vector search failed: {:#}", e)))
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::ExternalService(format!(
                "semantic search timed out after {:?}",
                self.timeout
            ))),
        }
    }

    /// Like [`try_search`](Self::try_search), with failures mapped to no
    /// matches.
    pub async fn search(&self, query: &str) -> Vec<VectorMatch> {
        match self.try_search(query).await {
            Ok(matches) => {
                debug!(matches = matches.len(), "Semantic search finished");
                matches
            }
            Err(e) => {
                warn!(error = %e, "Semantic search unavailable, continuing without it");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct SlowEmbedder;

    #[async_trait]
    impl Embedder for SlowEmbedder {
        fn model_name(&self) -> &str {
            "slow"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    struct UnitEmbedder;

    #[async_trait]
    impl Embedder for UnitEmbedder {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    struct FixedIndex;

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn vector_search(&self, _query_vec: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
            let mut hits = vec![
                VectorMatch {
                    text: "best".into(),
                    score: 0.9,
                    metadata: Value::Null,
                },
                VectorMatch {
                    text: "next".into(),
                    score: 0.4,
                    metadata: Value::Null,
                },
            ];
            hits.truncate(k);
            Ok(hits)
        }
        async fn len(&self) -> Result<usize> {
            Ok(2)
        }
    }

    #[tokio::test]
    async fn test_search_returns_index_matches() {
        let search = SemanticSearch::new(
            Arc::new(UnitEmbedder),
            Arc::new(FixedIndex),
            1,
            Duration::from_secs(1),
        );
        let hits = search.search("anything").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "best");
    }

    #[tokio::test]
    async fn test_timeout_yields_empty() {
        let search = SemanticSearch::new(
            Arc::new(SlowEmbedder),
            Arc::new(FixedIndex),
            5,
            Duration::from_millis(50),
        );
        assert!(matches!(
            search.try_search("q").await,
            Err(RetrievalError::ExternalService(_))
        ));
        assert!(search.search("q").await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_embedder_yields_empty() {
        let search = SemanticSearch::new(
            Arc::new(crate::embedding::DisabledEmbedder),
            Arc::new(FixedIndex),
            5,
            Duration::from_secs(1),
        );
        assert!(search.search("q").await.is_empty());
    }
}
