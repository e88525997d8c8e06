//! Retrieval orchestrator.
//!
//! [`ContextEngine::resolve_context`] classifies a query and walks a fixed
//! cascade of strategies, returning the first non-empty context:
//!
//! | # | Strategy | Runs for | Falls through when |
//! |---|----------|----------|--------------------|
//! | 1 | [`SourceStrategy::Count`] | `Count` intent | never |
//! | 2 | [`SourceStrategy::DocumentAnalysis`] | `DocumentReference`, `TopicAnalysis` | the named document does not exist |
//! | 3 | [`SourceStrategy::FileMetadata`] | file/upload/transcript vocabulary | no filename matches |
//! | 4 | [`SourceStrategy::AuthorQuotes`] | author/quote vocabulary | no quotes section exists |
//! | 5 | [`SourceStrategy::KeywordSearch`] | any intent but `None` | all three keyword passes miss |
//! | 6 | [`SourceStrategy::Semantic`] | any intent but `None`, when configured | error, timeout or no hits |
//! | 7 | [`SourceStrategy::CorpusDump`] | always | never |
//!
//! A `None` intent goes straight to the dump. Outputs of different
//! strategies are never combined, and the winning context is capped at
//! `retrieval.max_context_chars`.
//!
//! Every call works on a fresh [`CorpusSnapshot`], so edits to the corpus
//! are visible on the next query without any invalidation. Parsed analyses
//! are cached by `(name, mtime)` when `retrieval.cache_analyses` is set.

use anyhow::Result;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use context_cascade_core::analysis::analyze_document;
use context_cascade_core::count::{count_in_documents, count_occurrences};
use context_cascade_core::error::RetrievalError;
use context_cascade_core::index::VectorMatch;
use context_cascade_core::intent::{classify_intent, search_terms, QueryIntent};
use context_cascade_core::models::{
    CountReport, Document, DocumentAnalysis, DocumentInfo, DocumentType, RetrievalResult,
    SourceStrategy, StructuralUnits, TermCount,
};
use context_cascade_core::parse::extract_author_quotes_section;
use context_cascade_core::render::{
    render_analysis, render_chunks, render_count, render_dump, render_file_metadata,
    render_sections, render_semantic, truncate_context,
};
use context_cascade_core::resolve::{filter_documents, find_by_name, resolve_target};
use context_cascade_core::search::{keyword_search, KeywordHits};
use context_cascade_core::topics::sample_blocks;

use crate::config::{Config, EmbeddingConfig, RetrievalConfig};
use crate::corpus::{Corpus, FsCorpus};
use crate::embedding::create_embedder;
use crate::index::build_index;
use crate::loader::{load_snapshot, AnalysisCache, CorpusSnapshot};
use crate::semantic::SemanticSearch;

const DEFAULT_READ_CONCURRENCY: usize = 8;

/// Most documents described by the file metadata strategy.
const MAX_FILE_MATCHES: usize = 3;

/// Strategies in priority order.
const CASCADE: &[SourceStrategy] = &[
    SourceStrategy::Count,
    SourceStrategy::DocumentAnalysis,
    SourceStrategy::FileMetadata,
    SourceStrategy::AuthorQuotes,
    SourceStrategy::KeywordSearch,
    SourceStrategy::Semantic,
    SourceStrategy::CorpusDump,
];

static FILE_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:files?|uploads?|uploaded|transcripts?|index(?:ed)?)\b")
        .expect("file vocabulary regex is valid")
});

static QUOTE_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:authors?|quotes?|quotations?)\b")
        .expect("quote vocabulary regex is valid")
});

/// Query tokens that describe a file extension rather than a name.
const EXTENSION_WORDS: &[&str] = &["txt", "md", "markdown"];

pub struct ContextEngine {
    corpus: Arc<dyn Corpus>,
    retrieval: RetrievalConfig,
    read_concurrency: usize,
    semantic: Option<SemanticSearch>,
    cache: Option<AnalysisCache>,
}

impl ContextEngine {
    pub fn new(corpus: Arc<dyn Corpus>, retrieval: RetrievalConfig) -> Self {
        let cache = retrieval.cache_analyses.then(AnalysisCache::new);
        Self {
            corpus,
            retrieval,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            semantic: None,
            cache,
        }
    }

    pub fn with_read_concurrency(mut self, read_concurrency: usize) -> Self {
        self.read_concurrency = read_concurrency.max(1);
        self
    }

    /// Enable the semantic search strategy.
    pub fn with_semantic(mut self, semantic: SemanticSearch) -> Self {
        self.semantic = Some(semantic);
        self
    }

    /// Build an engine over the configured directory.
    ///
    /// When an embedding provider is enabled the whole corpus is embedded
    /// up front. If that fails the engine still starts, without the
    /// semantic strategy.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let corpus = Arc::new(FsCorpus::new(&config.corpus)?);
        let mut engine = Self::new(corpus, config.retrieval.clone())
            .with_read_concurrency(config.corpus.read_concurrency);

        if config.embedding.is_enabled() {
            let built = engine.build_semantic(&config.embedding).await;
            match built {
                Ok(semantic) => engine.semantic = Some(semantic),
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!(
                        provider = %config.embedding.provider,
                        error = %reason,
                        "Semantic index unavailable, continuing without it"
                    );
                }
            }
        }
        Ok(engine)
    }

    async fn build_semantic(&self, config: &EmbeddingConfig) -> Result<SemanticSearch> {
        let embedder = create_embedder(config)?;
        let snapshot = self.snapshot().await?;
        let index = build_index(&snapshot.documents, embedder.as_ref(), config.batch_size).await?;
        Ok(SemanticSearch::new(
            embedder,
            Arc::new(index),
            self.retrieval.semantic_top_k,
            Duration::from_secs(self.retrieval.semantic_timeout_secs),
        ))
    }

    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    /// Read the current corpus.
    pub async fn snapshot(&self) -> Result<CorpusSnapshot, RetrievalError> {
        load_snapshot(self.corpus.as_ref(), self.read_concurrency).await
    }

    /// Resolve the context for `query`. Never fails.
    pub async fn resolve_context(&self, query: &str) -> RetrievalResult {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Corpus unavailable");
                return RetrievalResult::no_context();
            }
        };
        if snapshot.is_empty() {
            debug!("Corpus is empty");
            return RetrievalResult::no_context();
        }

        let intent = classify_intent(query);
        debug!(intent = intent.name(), "Classified query");

        for &strategy in CASCADE {
            if !applies(strategy, &intent) {
                continue;
            }
            let context = self
                .attempt(strategy, query, &intent, &snapshot.documents)
                .await
                .filter(|text| !is_empty_context(text));
            match context {
                Some(text) => {
                    let (context_text, truncated) =
                        truncate_context(&text, self.retrieval.max_context_chars);
                    info!(
                        strategy = %strategy,
                        chars = context_text.chars().count(),
                        truncated,
                        "Resolved context"
                    );
                    return RetrievalResult {
                        context_text,
                        source_strategy: strategy,
                        truncated,
                    };
                }
                None => debug!(strategy = %strategy, "No context, falling through"),
            }
        }

        RetrievalResult::no_context()
    }

    async fn attempt(
        &self,
        strategy: SourceStrategy,
        query: &str,
        intent: &QueryIntent,
        docs: &[Document],
    ) -> Option<String> {
        match strategy {
            SourceStrategy::Count => match intent {
                QueryIntent::Count {
                    term,
                    document_filter,
                    episode_filter,
                } => Some(count_context(
                    docs,
                    term,
                    document_filter.as_deref(),
                    *episode_filter,
                )),
                _ => None,
            },
            SourceStrategy::DocumentAnalysis => match intent {
                QueryIntent::DocumentReference {
                    document_name,
                    episode_number,
                }
                | QueryIntent::TopicAnalysis {
                    document_name,
                    episode_number,
                } => self.analysis_context(docs, query, document_name.as_deref(), *episode_number),
                _ => None,
            },
            SourceStrategy::FileMetadata => file_metadata_context(docs, query),
            SourceStrategy::AuthorQuotes => self.author_quotes_context(docs, query),
            SourceStrategy::KeywordSearch => match keyword_search(docs, query) {
                KeywordHits::Headings(matches) => Some(render_sections(&matches)),
                KeywordHits::Chunks(matches) | KeywordHits::Loose(matches) => {
                    Some(render_chunks(&matches))
                }
                KeywordHits::None => None,
            },
            SourceStrategy::Semantic => {
                let semantic = self.semantic.as_ref()?;
                Some(render_semantic(&semantic.search(query).await))
            }
            SourceStrategy::CorpusDump => {
                Some(render_dump(docs, self.retrieval.max_context_chars))
            }
            SourceStrategy::NoContext => None,
        }
    }

    fn analysis_context(
        &self,
        docs: &[Document],
        query: &str,
        name: Option<&str>,
        episode: Option<u32>,
    ) -> Option<String> {
        let doc = match resolve_target(docs, name, episode, query) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(error = %e, "No analysis target");
                return None;
            }
        };
        let analysis = self.analyze(doc);
        let sample = match &analysis.units {
            StructuralUnits::TimeBlocks(blocks) => sample_blocks(
                blocks.len(),
                self.retrieval.extra_samples,
                self.retrieval.sample_seed,
            ),
            _ => Vec::new(),
        };
        Some(render_analysis(doc, &analysis, &sample))
    }

    fn author_quotes_context(&self, docs: &[Document], query: &str) -> Option<String> {
        if !QUOTE_VOCAB.is_match(query) {
            return None;
        }
        let reference = self
            .retrieval
            .reference_document
            .as_deref()
            .and_then(|name| find_by_name(docs, name));

        reference
            .into_iter()
            .chain(docs.iter().filter(|doc| doc.doc_type == DocumentType::Markdown))
            .find_map(|doc| extract_author_quotes_section(&doc.text))
            .map(str::to_string)
    }

    fn analyze(&self, doc: &Document) -> Arc<DocumentAnalysis> {
        match &self.cache {
            Some(cache) => cache.get_or_analyze(doc),
            None => Arc::new(analyze_document(doc)),
        }
    }

    /// Count `term` across the corpus, optionally narrowed to documents
    /// whose name contains `document_filter` and/or carries the episode
    /// token of `episode_filter`.
    pub async fn count_term(
        &self,
        term: &str,
        document_filter: Option<&str>,
        episode_filter: Option<u32>,
    ) -> Result<CountReport, RetrievalError> {
        if term.trim().is_empty() {
            return Err(RetrievalError::MalformedQuery(
                "count term is empty".to_string(),
            ));
        }
        let snapshot = self.snapshot().await?;
        let candidates = filter_documents(&snapshot.documents, document_filter, episode_filter);
        if candidates.is_empty() && (document_filter.is_some() || episode_filter.is_some()) {
            return Err(RetrievalError::not_found(
                describe_scope(document_filter, episode_filter).unwrap_or_default(),
            ));
        }
        Ok(count_in_documents(candidates, term))
    }

    /// Analyze the document named `name` (exact, then partial match), or
    /// the one carrying the episode token when the name matches nothing.
    pub async fn analyze_document(
        &self,
        name: &str,
        episode: Option<u32>,
    ) -> Result<DocumentAnalysis, RetrievalError> {
        let name = Some(name.trim()).filter(|n| !n.is_empty());
        if name.is_none() && episode.is_none() {
            return Err(RetrievalError::MalformedQuery(
                "a document name or episode is required".to_string(),
            ));
        }
        let snapshot = self.snapshot().await?;
        let doc = resolve_target(&snapshot.documents, name, episode, "")?;
        Ok(self.analyze(doc).as_ref().clone())
    }

    /// Nearest indexed chunks for `query`, without the cascade around it.
    pub async fn semantic_search(&self, query: &str) -> Result<Vec<VectorMatch>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::MalformedQuery(
                "search query is empty".to_string(),
            ));
        }
        let semantic = self.semantic.as_ref().ok_or_else(|| {
            RetrievalError::ExternalService("semantic search is not configured".to_string())
        })?;
        semantic.try_search(query).await
    }

    /// Listing entries of the corpus, sorted by name.
    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>, RetrievalError> {
        let mut listing =
            self.corpus
                .list_documents()
                .await
                .map_err(|e| RetrievalError::IoFailure {
                    name: "corpus listing".to_string(),
                    reason: format!("{:#}", e),
                })?;
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    /// Forget the cached analysis of `name`.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache
            .as_ref()
            .map(|cache| cache.invalidate(name))
            .unwrap_or(false)
    }
}

/// Whether `strategy` is tried at all for `intent`.
fn applies(strategy: SourceStrategy, intent: &QueryIntent) -> bool {
    match strategy {
        SourceStrategy::Count => matches!(intent, QueryIntent::Count { .. }),
        SourceStrategy::DocumentAnalysis => matches!(
            intent,
            QueryIntent::DocumentReference { .. } | QueryIntent::TopicAnalysis { .. }
        ),
        SourceStrategy::CorpusDump => true,
        SourceStrategy::NoContext => false,
        _ => !matches!(intent, QueryIntent::None),
    }
}

fn is_empty_context(text: &str) -> bool {
    text.trim().is_empty()
}

fn describe_scope(document: Option<&str>, episode: Option<u32>) -> Option<String> {
    match (document, episode) {
        (Some(name), Some(ep)) => Some(format!("\"{}\" (episode {})", name, ep)),
        (Some(name), None) => Some(format!("\"{}\"", name)),
        (None, Some(ep)) => Some(format!("episode {}", ep)),
        (None, None) => None,
    }
}

fn count_context(
    docs: &[Document],
    term: &str,
    document_filter: Option<&str>,
    episode_filter: Option<u32>,
) -> String {
    let candidates = filter_documents(docs, document_filter, episode_filter);
    debug!(candidates = candidates.len(), term, "Counting term");
    let report = count_in_documents(candidates, term);
    render_count(&report, describe_scope(document_filter, episode_filter).as_deref())
}

/// Stats and a preview of every document whose name contains a query word.
fn file_metadata_context(docs: &[Document], query: &str) -> Option<String> {
    if !FILE_VOCAB.is_match(query) {
        return None;
    }
    let terms = search_terms(query);
    let name_tokens: Vec<&str> = terms
        .iter()
        .map(String::as_str)
        .filter(|t| !t.contains(' '))
        .filter(|t| !FILE_VOCAB.is_match(t) && !EXTENSION_WORDS.contains(t))
        .collect();
    if name_tokens.is_empty() {
        return None;
    }

    let rendered: Vec<String> = docs
        .iter()
        .filter(|doc| {
            let name = doc.name.to_lowercase();
            name_tokens.iter().any(|t| name.contains(t))
        })
        .take(MAX_FILE_MATCHES)
        .map(|doc| {
            let counts: Vec<TermCount> = terms
                .iter()
                .map(|t| TermCount {
                    term: t.clone(),
                    count: count_occurrences(&doc.text, t),
                })
                .filter(|tc| tc.count > 0)
                .collect();
            render_file_metadata(doc, &counts)
        })
        .collect();

    (!rendered.is_empty()).then(|| rendered.join("\n"))
}
