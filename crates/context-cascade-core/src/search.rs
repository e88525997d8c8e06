//! Keyword search over the whole corpus.
//!
//! Three passes, each tried only when the previous found nothing:
//!
//! 1. **Headings.** Markdown sections whose title contains a search term
//!    are returned whole.
//! 2. **Chunks.** Every document is cut into search units (transcript
//!    blocks, markdown sections, or blank-line paragraphs for everything
//!    else). Units are ranked by the number of distinct search terms they
//!    contain and the best [`MAX_CHUNK_MATCHES`] are kept.
//! 3. **Loose chunks.** As 2, with two-letter terms and a much shorter
//!    stopword list, capped at [`MAX_LOOSE_MATCHES`].
//!
//! Ranking is a stable sort, so equally good units stay in corpus order.

use serde::Serialize;

use crate::chunk::{chunk_text, DEFAULT_CHUNK_CHARS};
use crate::intent::{loose_terms, search_terms};
use crate::models::{Document, DocumentType};
use crate::parse::{parse_markdown, parse_transcript};

pub const MAX_SECTION_MATCHES: usize = 15;
pub const MAX_CHUNK_MATCHES: usize = 15;
pub const MAX_LOOSE_MATCHES: usize = 10;

/// A markdown section whose heading contains a search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionMatch {
    pub document: String,
    pub title: String,
    pub level: u8,
    pub content: Vec<String>,
}

/// A search unit containing at least one search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMatch {
    pub document: String,
    pub text: String,
    /// Number of distinct terms found in `text`.
    pub matched_terms: usize,
}

/// Outcome of [`keyword_search`], tagged by the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pass", content = "matches", rename_all = "snake_case")]
pub enum KeywordHits {
    Headings(Vec<SectionMatch>),
    Chunks(Vec<ChunkMatch>),
    Loose(Vec<ChunkMatch>),
    None,
}

impl KeywordHits {
    pub fn is_empty(&self) -> bool {
        match self {
            KeywordHits::Headings(m) => m.is_empty(),
            KeywordHits::Chunks(m) | KeywordHits::Loose(m) => m.is_empty(),
            KeywordHits::None => true,
        }
    }
}

/// Run the three keyword passes for `query` over `docs`.
pub fn keyword_search(docs: &[Document], query: &str) -> KeywordHits {
    let terms = search_terms(query);
    if !terms.is_empty() {
        let headings = heading_matches(docs, &terms);
        if !headings.is_empty() {
            return KeywordHits::Headings(headings);
        }
        let chunks = chunk_matches(docs, &terms, MAX_CHUNK_MATCHES);
        if !chunks.is_empty() {
            return KeywordHits::Chunks(chunks);
        }
    }

    let loose = loose_terms(query);
    if !loose.is_empty() {
        let chunks = chunk_matches(docs, &loose, MAX_LOOSE_MATCHES);
        if !chunks.is_empty() {
            return KeywordHits::Loose(chunks);
        }
    }

    KeywordHits::None
}

/// Markdown sections whose title contains any of `terms`.
pub fn heading_matches(docs: &[Document], terms: &[String]) -> Vec<SectionMatch> {
    docs.iter()
        .filter(|doc| doc.doc_type == DocumentType::Markdown)
        .flat_map(|doc| {
            parse_markdown(&doc.text)
                .into_iter()
                .filter(|section| {
                    let title = section.title.to_lowercase();
                    terms.iter().any(|t| title.contains(t.as_str()))
                })
                .map(|section| SectionMatch {
                    document: doc.name.clone(),
                    title: section.title,
                    level: section.level,
                    content: section.content,
                })
        })
        .take(MAX_SECTION_MATCHES)
        .collect()
}

/// Search units of one document.
///
/// Structured documents without any structural unit fall back to
/// paragraphs.
pub fn search_units(doc: &Document) -> Vec<String> {
    let units: Vec<String> = match doc.doc_type {
        DocumentType::Transcript => parse_transcript(&doc.text)
            .into_iter()
            .map(|block| format!("[{}] {}", block.timestamp, block.text()))
            .collect(),
        DocumentType::Markdown => parse_markdown(&doc.text)
            .into_iter()
            .map(|section| format!("{}\n{}", section.title, section.content.join("\n")))
            .collect(),
        DocumentType::Plain => Vec::new(),
    };
    if !units.is_empty() {
        return units;
    }
    chunk_text(&doc.name, &doc.text, DEFAULT_CHUNK_CHARS)
        .into_iter()
        .map(|chunk| chunk.text)
        .collect()
}

/// Units containing any of `terms`, best first, at most `cap`.
pub fn chunk_matches(docs: &[Document], terms: &[String], cap: usize) -> Vec<ChunkMatch> {
    let mut matches: Vec<ChunkMatch> = docs
        .iter()
        .flat_map(|doc| {
            search_units(doc).into_iter().filter_map(|text| {
                let lower = text.to_lowercase();
                let matched_terms = terms.iter().filter(|t| lower.contains(t.as_str())).count();
                (matched_terms > 0).then(|| ChunkMatch {
                    document: doc.name.clone(),
                    text,
                    matched_terms,
                })
            })
        })
        .collect();
    matches.sort_by(|a, b| b.matched_terms.cmp(&a.matched_terms));
    matches.truncate(cap);
    matches
}
