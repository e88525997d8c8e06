//! Single-document analysis.
//!
//! Parses a [`Document`] according to its type and derives term statistics:
//!
//! | Type | Units | Top terms | Extras |
//! |------|-------|-----------|--------|
//! | transcript | time blocks | 25, filler words dropped | ranked topics |
//! | markdown | sections | 20 | authors, quotes, key points |
//! | plain | none | 20 | none |

use crate::models::{Document, DocumentAnalysis, DocumentType, StructuralUnits};
use crate::parse::{extract_authors, extract_quotes, parse_markdown, parse_transcript, text_stats};
use crate::terms::{StopList, TermFrequency, KEY_POINT_TOP_TERMS, TEXT_TOP_TERMS, TRANSCRIPT_TOP_TERMS};
use crate::topics::{extract_key_points, rank_topics};

pub fn analyze_document(doc: &Document) -> DocumentAnalysis {
    let (line_count, word_count) = text_stats(&doc.text);
    let mut analysis = DocumentAnalysis {
        name: doc.name.clone(),
        doc_type: doc.doc_type,
        size: doc.size,
        modified_at: doc.modified_at,
        line_count,
        word_count,
        units: StructuralUnits::None,
        top_terms: Vec::new(),
        topics: Vec::new(),
        key_points: Vec::new(),
        authors: Vec::new(),
        quotes: Vec::new(),
    };

    match doc.doc_type {
        DocumentType::Transcript => {
            let blocks = parse_transcript(&doc.text);
            let top_terms =
                TermFrequency::from_text(&doc.text, StopList::Transcript).top(TRANSCRIPT_TOP_TERMS);
            analysis.topics = rank_topics(&blocks, &top_terms);
            analysis.top_terms = top_terms;
            analysis.units = StructuralUnits::TimeBlocks(blocks);
        }
        DocumentType::Markdown => {
            let sections = parse_markdown(&doc.text);
            let top_terms = TermFrequency::from_text(&doc.text, StopList::Base).top(TEXT_TOP_TERMS);
            let boost = &top_terms[..top_terms.len().min(KEY_POINT_TOP_TERMS)];
            analysis.key_points = extract_key_points(&sections, boost);
            analysis.authors = extract_authors(&doc.text);
            analysis.quotes = extract_quotes(&doc.text);
            analysis.top_terms = top_terms;
            analysis.units = StructuralUnits::Sections(sections);
        }
        DocumentType::Plain => {
            analysis.top_terms =
                TermFrequency::from_text(&doc.text, StopList::Base).top(TEXT_TOP_TERMS);
        }
    }

    analysis
}
