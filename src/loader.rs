//! Corpus snapshots and the analysis cache.
//!
//! A [`CorpusSnapshot`] is the immutable view one retrieval call works on:
//! every readable document, classified, sorted by name. Reads run
//! concurrently (bounded by `corpus.read_concurrency`); a document that
//! cannot be read is logged, recorded in [`CorpusSnapshot::skipped`] and
//! left out, and the scan carries on.
//!
//! [`AnalysisCache`] memoizes [`analyze_document`] by `(name, mtime)`. A
//! document whose modification time changed misses the cache and replaces
//! the stale entry.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use context_cascade_core::analysis::analyze_document;
use context_cascade_core::error::RetrievalError;
use context_cascade_core::models::{Document, DocumentAnalysis};

use crate::corpus::Corpus;

/// A document left out of a snapshot, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Every readable document of a corpus at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot {
    /// Sorted by name.
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedDocument>,
}

impl CorpusSnapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// List and read the whole corpus.
///
/// Only a failed listing is an error; individual read failures become
/// [`SkippedDocument`] entries.
pub async fn load_snapshot(
    corpus: &dyn Corpus,
    concurrency: usize,
) -> Result<CorpusSnapshot, RetrievalError> {
    let listing = corpus
        .list_documents()
        .await
        .map_err(|e| RetrievalError::IoFailure {
            name: "corpus listing".to_string(),
            reason: format!("{:#}", e),
        })?;

    let reads: Vec<_> = stream::iter(listing)
        .map(|info| async move {
            let result = corpus.read_document(&info.name).await;
            (info, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut snapshot = CorpusSnapshot::default();
    for (info, result) in reads {
        match result {
            Ok(text) => snapshot.documents.push(Document::new(info, text)),
            Err(e) => {
                let err = RetrievalError::IoFailure {
                    name: info.name.clone(),
                    reason: format!("{:#}", e),
                };
                warn!(document = %info.name, error = %err, "Skipping unreadable document");
                snapshot.skipped.push(SkippedDocument {
                    name: info.name,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    snapshot.documents.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot.skipped.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(
        documents = snapshot.documents.len(),
        skipped = snapshot.skipped.len(),
        "Loaded corpus snapshot"
    );
    Ok(snapshot)
}

/// Parsed analyses keyed by document name, valid for one mtime.
#[derive(Default)]
pub struct AnalysisCache {
    entries: RwLock<HashMap<String, (i64, Arc<DocumentAnalysis>)>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached analysis of `doc`, computing and storing it on a miss.
    pub fn get_or_analyze(&self, doc: &Document) -> Arc<DocumentAnalysis> {
        if let Ok(entries) = self.entries.read() {
            if let Some((mtime, analysis)) = entries.get(&doc.name) {
                if *mtime == doc.modified_at {
                    debug!(document = %doc.name, "Analysis cache hit");
                    return Arc::clone(analysis);
                }
            }
        }

        let analysis = Arc::new(analyze_document(doc));
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(doc.name.clone(), (doc.modified_at, Arc::clone(&analysis)));
        }
        analysis
    }

    /// Drop the entry for `name`. Returns whether one existed.
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(name).is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
