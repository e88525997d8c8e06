//! Core data models used throughout context-cascade.
//!
//! These types represent the documents, structural units, term statistics,
//! and retrieval results that flow through the context-resolution pipeline.

use serde::Serialize;
use std::fmt;

/// Structural shape of a document, decided by [`crate::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Transcript,
    Markdown,
    Plain,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Transcript => "transcript",
            DocumentType::Markdown => "markdown",
            DocumentType::Plain => "plain",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing entry produced by a corpus accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    /// File name, unique within the corpus.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time (Unix seconds).
    pub modified_at: i64,
}

/// A fully read and classified document.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub doc_type: DocumentType,
    pub size: u64,
    pub modified_at: i64,
    pub text: String,
}

impl Document {
    /// Classify `text` and build a document from a listing entry.
    pub fn new(info: DocumentInfo, text: String) -> Self {
        let doc_type = crate::classify::classify_document(&info.name, &text);
        Self {
            name: info.name,
            doc_type,
            size: info.size,
            modified_at: info.modified_at,
            text,
        }
    }
}

/// A transcript segment anchored to one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBlock {
    /// Timestamp as written in the source, e.g. `0:12:34`.
    pub timestamp: String,
    /// Non-empty lines, in source order.
    pub lines: Vec<String>,
}

impl TimeBlock {
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// A markdown section opened by a `#` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    /// Heading marker count, `1..=6`.
    pub level: u8,
    pub content: Vec<String>,
    /// Index of the nearest preceding section with a smaller level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

/// Structural units of a parsed document.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "units", rename_all = "snake_case")]
pub enum StructuralUnits {
    TimeBlocks(Vec<TimeBlock>),
    Sections(Vec<Section>),
    None,
}

impl StructuralUnits {
    pub fn len(&self) -> usize {
        match self {
            StructuralUnits::TimeBlocks(blocks) => blocks.len(),
            StructuralUnits::Sections(sections) => sections.len(),
            StructuralUnits::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A term and its occurrence count within one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// A significant transcript block, summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub title: String,
    pub timestamp: String,
    pub summary: String,
}

/// A salient markdown excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPoint {
    pub title: String,
    pub content: String,
}

/// Result of analyzing a single document.
///
/// `topics` is populated for transcripts; `key_points`, `authors` and
/// `quotes` for markdown.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub name: String,
    pub doc_type: DocumentType,
    pub size: u64,
    pub modified_at: i64,
    pub line_count: usize,
    pub word_count: usize,
    pub units: StructuralUnits,
    pub top_terms: Vec<TermCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Topic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<KeyPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,
}

/// Per-file occurrence count for a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub file: String,
    pub count: usize,
    /// Up to five trimmed lines containing the term.
    pub examples: Vec<String>,
}

/// Aggregated occurrence count of a term across the candidate documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountReport {
    pub term: String,
    pub total_count: usize,
    /// Files with at least one occurrence, highest count first.
    pub per_file: Vec<FileCount>,
}

/// The cascade state that produced a [`RetrievalResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    Count,
    DocumentAnalysis,
    FileMetadata,
    AuthorQuotes,
    KeywordSearch,
    Semantic,
    CorpusDump,
    NoContext,
}

impl SourceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStrategy::Count => "count",
            SourceStrategy::DocumentAnalysis => "document_analysis",
            SourceStrategy::FileMetadata => "file_metadata",
            SourceStrategy::AuthorQuotes => "author_quotes",
            SourceStrategy::KeywordSearch => "keyword_search",
            SourceStrategy::Semantic => "semantic",
            SourceStrategy::CorpusDump => "corpus_dump",
            SourceStrategy::NoContext => "no_context",
        }
    }
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The sole output of the retrieval engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalResult {
    pub context_text: String,
    pub source_strategy: SourceStrategy,
    pub truncated: bool,
}

impl RetrievalResult {
    /// Result for a corpus with nothing to offer.
    pub fn no_context() -> Self {
        Self {
            context_text: String::new(),
            source_strategy: SourceStrategy::NoContext,
            truncated: false,
        }
    }

    pub fn has_context(&self) -> bool {
        self.source_strategy != SourceStrategy::NoContext && !self.context_text.is_empty()
    }
}
