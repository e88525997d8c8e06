//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the similarity-search seam of the cascade:
//! the engine embeds the query through an [`Embedder`](crate::embedding::Embedder)
//! and asks the index for the nearest chunks. Backends are pluggable; the
//! crate ships a brute-force [`memory::InMemoryVectorIndex`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A chunk returned from vector search.
#[derive(Debug, Clone, Serialize)]
pub struct VectorMatch {
    pub text: String,
    /// Cosine similarity to the query vector.
    pub score: f32,
    /// Backend-specific provenance, e.g. `{"document": ..., "chunk_index": ...}`.
    pub metadata: serde_json::Value,
}

/// Abstract similarity-search backend.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` matches for `query_vec`, best first.
    async fn vector_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<VectorMatch>>;

    /// Number of indexed vectors.
    async fn len(&self) -> Result<usize>;
}
