//! Semantic index construction.
//!
//! Splits every document into paragraph chunks of at most
//! [`DEFAULT_CHUNK_CHARS`] characters, embeds them in batches and loads the
//! vectors into an [`InMemoryVectorIndex`]. Chunks whose text hash was
//! already embedded reuse that vector instead of calling the provider again.

use anyhow::{bail, Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::info;

use context_cascade_core::chunk::{chunk_text, Chunk, DEFAULT_CHUNK_CHARS};
use context_cascade_core::embedding::Embedder;
use context_cascade_core::index::memory::InMemoryVectorIndex;
use context_cascade_core::models::Document;

/// Build an in-memory index over `docs`.
pub async fn build_index(
    docs: &[Document],
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<InMemoryVectorIndex> {
    let chunks: Vec<Chunk> = docs
        .iter()
        .flat_map(|doc| chunk_text(&doc.name, &doc.text, DEFAULT_CHUNK_CHARS))
        .collect();

    let mut pending: Vec<&Chunk> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for chunk in &chunks {
        if seen.insert(chunk.hash.as_str()) {
            pending.push(chunk);
        }
    }

    let mut vectors: HashMap<String, Vec<f32>> = HashMap::with_capacity(pending.len());
    for batch in pending.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embedded = embedder
            .embed(&texts)
            .await
            .with_context(|| format!("Failed to embed a batch of {} chunks", texts.len()))?;
        if embedded.len() != batch.len() {
            bail!(
                "Embedder returned {} vectors for {} chunks",
                embedded.len(),
                batch.len()
            );
        }
        for (chunk, vector) in batch.iter().zip(embedded) {
            vectors.insert(chunk.hash.clone(), vector);
        }
    }

    let index = InMemoryVectorIndex::new();
    for chunk in &chunks {
        if let Some(vector) = vectors.get(&chunk.hash) {
            index.insert(chunk, vector.clone())?;
        }
    }

    info!(
        documents = docs.len(),
        chunks = chunks.len(),
        embedded = vectors.len(),
        model = embedder.model_name(),
        "Built semantic index"
    );
    Ok(index)
}
