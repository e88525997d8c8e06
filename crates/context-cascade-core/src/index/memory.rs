//! In-memory [`VectorIndex`] implementation.
//!
//! Vectors live in a `HashMap` keyed by `(document, chunk index)` behind
//! `std::sync::RwLock`, so re-inserting a chunk replaces it in constant
//! time. Search is brute-force cosine similarity over every stored vector.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::chunk::Chunk;
use crate::embedding::cosine_similarity;

use super::{VectorIndex, VectorMatch};

type ChunkKey = (String, usize);

struct StoredVector {
    text: String,
    hash: String,
    vector: Vec<f32>,
}

/// Brute-force in-memory vector index.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    vectors: RwLock<HashMap<ChunkKey, StoredVector>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk and its embedding. Re-inserting a chunk with the same
    /// document and index replaces the earlier entry.
    pub fn insert(&self, chunk: &Chunk, vector: Vec<f32>) -> Result<()> {
        let mut vectors = self
            .vectors
            .write()
            .map_err(|_| anyhow!("vector index lock poisoned"))?;
        vectors.insert(
            (chunk.document.clone(), chunk.index),
            StoredVector {
                text: chunk.text.clone(),
                hash: chunk.hash.clone(),
                vector,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn vector_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<VectorMatch>> {
        let vectors = self
            .vectors
            .read()
            .map_err(|_| anyhow!("vector index lock poisoned"))?;
        let mut scored: Vec<(f32, &ChunkKey, &StoredVector)> = vectors
            .iter()
            .map(|(key, sv)| (cosine_similarity(query_vec, &sv.vector), key, sv))
            .collect();
        // Map iteration order is arbitrary; ties fall back to document order.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, (document, chunk_index), sv)| VectorMatch {
                text: sv.text.clone(),
                score,
                metadata: json!({
                    "document": document,
                    "chunk_index": chunk_index,
                    "hash": sv.hash,
                }),
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        let vectors = self
            .vectors
            .read()
            .map_err(|_| anyhow!("vector index lock poisoned"))?;
        Ok(vectors.len())
    }
}
