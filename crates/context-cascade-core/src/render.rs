//! Plain-text rendering of cascade outputs.
//!
//! Every strategy produces a string in a fixed layout; the downstream
//! prompt embeds it verbatim. The engine applies [`truncate_context`] to
//! whatever a strategy returns, so renderers do not bound their own size
//! except for the corpus dump, which shares the budget between documents.

use crate::index::VectorMatch;
use crate::models::{CountReport, Document, DocumentAnalysis, DocumentType, StructuralUnits, TermCount};
use crate::search::{ChunkMatch, SectionMatch};

/// Characters shown in a file preview.
pub const PREVIEW_CHARS: usize = 500;
/// Characters shown per representative transcript excerpt.
pub const EXCERPT_CHARS: usize = 300;
/// Top terms listed in a document header.
const HEADER_TERMS: usize = 10;

/// First `max_chars` characters of `text`, plus `...` when cut.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Bound `text` to `max_chars` characters.
///
/// The cut prefers the last line break in the kept half or better, then
/// the last whitespace, and only then splits a word. Returns the kept text
/// and whether anything was dropped.
pub fn truncate_context(text: &str, max_chars: usize) -> (String, bool) {
    let limit = match text.char_indices().nth(max_chars) {
        Some((i, _)) => i,
        None => return (text.to_string(), false),
    };
    let head = &text[..limit];
    let cut = match head.rfind('\n') {
        Some(pos) if pos >= limit / 2 => pos,
        _ => head.rfind(char::is_whitespace).filter(|&pos| pos > 0).unwrap_or(limit),
    };
    (head[..cut].trim_end().to_string(), true)
}

/// Format a Unix timestamp as ISO 8601 (`YYYY-MM-DDTHH:MM:SSZ`).
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Count breakdown: total, per-file counts, examples from the top file.
pub fn render_count(report: &CountReport, scope: Option<&str>) -> String {
    let mut out = format!("Term count for \"{}\"", report.term);
    if let Some(scope) = scope {
        out.push_str(&format!(" in {}", scope));
    }
    out.push_str(&format!("\nTotal occurrences: {}\n", report.total_count));

    if report.per_file.is_empty() {
        out.push_str("\nNo occurrences found in the searched documents.\n");
        return out;
    }

    out.push_str("\nOccurrences by file:\n");
    for file in &report.per_file {
        out.push_str(&format!("- {}: {}\n", file.file, file.count));
    }

    if let Some(top) = report.per_file.first() {
        out.push_str(&format!("\nExample lines from {}:\n", top.file));
        for line in &top.examples {
            out.push_str(&format!("- {}\n", line));
        }
    }
    out
}

fn render_header(analysis: &DocumentAnalysis) -> String {
    let mut out = format!(
        "Document: {} ({}, {} bytes, {} lines, {} words)\n",
        analysis.name,
        analysis.doc_type,
        analysis.size,
        analysis.line_count,
        analysis.word_count
    );
    if !analysis.top_terms.is_empty() {
        out.push_str(&format!(
            "Top terms: {}\n",
            format_terms(&analysis.top_terms[..analysis.top_terms.len().min(HEADER_TERMS)])
        ));
    }
    out
}

fn format_terms(terms: &[TermCount]) -> String {
    terms
        .iter()
        .map(|t| format!("{} ({})", t.term, t.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structured rendering of one analyzed document.
///
/// `sample` holds the indices of the transcript blocks to quote as
/// representative excerpts; it is ignored for other types.
pub fn render_analysis(doc: &Document, analysis: &DocumentAnalysis, sample: &[usize]) -> String {
    let mut out = render_header(analysis);

    match &analysis.units {
        StructuralUnits::TimeBlocks(blocks) => {
            if !analysis.topics.is_empty() {
                out.push_str("\nMain topics:\n");
                for topic in &analysis.topics {
                    out.push_str(&format!(
                        "- [{}] {}: {}\n",
                        topic.timestamp, topic.title, topic.summary
                    ));
                }
            }
            let excerpts: Vec<String> = sample
                .iter()
                .filter_map(|&i| blocks.get(i))
                .map(|block| format!("[{}] {}", block.timestamp, ellipsize(&block.text(), EXCERPT_CHARS)))
                .collect();
            if !excerpts.is_empty() {
                out.push_str("\nRepresentative excerpts:\n");
                out.push_str(&excerpts.join("\n"));
                out.push('\n');
            }
        }
        StructuralUnits::Sections(sections) => {
            if !analysis.authors.is_empty() {
                out.push_str("\nAuthors:\n");
                for author in &analysis.authors {
                    out.push_str(&format!("- {}\n", author));
                }
            }
            if !analysis.quotes.is_empty() {
                out.push_str("\nQuotes:\n");
                for quote in &analysis.quotes {
                    out.push_str(&format!("- \"{}\"\n", quote));
                }
            }
            if !analysis.key_points.is_empty() {
                out.push_str("\nKey points:\n");
                for point in &analysis.key_points {
                    out.push_str(&format!("- [{}] {}\n", point.title, point.content));
                }
            }
            out.push_str("\nSection outline:\n");
            for section in sections {
                let indent = "  ".repeat(section.level.saturating_sub(1) as usize);
                out.push_str(&format!("{}- {}\n", indent, section.title));
            }
        }
        StructuralUnits::None => {}
    }

    if analysis.doc_type == DocumentType::Plain || analysis.units.is_empty() {
        out.push_str(&format!("\nPreview:\n{}\n", ellipsize(doc.text.trim(), PREVIEW_CHARS)));
    }
    out
}

/// Basic file stats, the occurrence counts of `terms` and a preview.
pub fn render_file_metadata(doc: &Document, terms: &[TermCount]) -> String {
    let (lines, words) = crate::parse::text_stats(&doc.text);
    let mut out = format!(
        "File: {}\nType: {}\nSize: {} bytes\nModified: {}\nLines: {}\nWords: {}\n",
        doc.name,
        doc.doc_type,
        doc.size,
        format_ts_iso(doc.modified_at),
        lines,
        words
    );
    if !terms.is_empty() {
        out.push_str("Term occurrences:\n");
        for term in terms {
            out.push_str(&format!("- {}: {}\n", term.term, term.count));
        }
    }
    out.push_str(&format!("Preview:\n{}\n", ellipsize(&doc.text, PREVIEW_CHARS)));
    out
}

/// Whole sections whose heading matched, grouped under their file.
pub fn render_sections(matches: &[SectionMatch]) -> String {
    matches
        .iter()
        .map(|m| {
            format!(
                "From {}:\n{} {}\n{}",
                m.document,
                "#".repeat(m.level.max(1) as usize),
                m.title,
                m.content.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_chunks(matches: &[ChunkMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("From {}:\n{}", m.document, m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `[Score: 0.87] text` per match, skipping negative scores.
pub fn render_semantic(matches: &[VectorMatch]) -> String {
    matches
        .iter()
        .filter(|m| m.score >= 0.0)
        .map(|m| format!("[Score: {:.2}] {}", m.score, m.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Every document between `=== name ===` markers.
///
/// Each document gets an equal share of `max_chars` so that all of them
/// appear in the output, however large the first few are.
pub fn render_dump(docs: &[Document], max_chars: usize) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let share = (max_chars / docs.len()).max(1);
    docs.iter()
        .map(|doc| {
            let marker = format!("=== {} ===\n", doc.name);
            let body_budget = share.saturating_sub(marker.chars().count() + 2).max(1);
            let (body, _) = truncate_context(doc.text.trim(), body_budget);
            format!("{}{}", marker, body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentInfo, FileCount};

    fn doc(name: &str, text: &str) -> Document {
        Document::new(
            DocumentInfo {
                name: name.into(),
                size: text.len() as u64,
                modified_at: 0,
            },
            text.into(),
        )
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("exactly10!", 10), "exactly10!");
        assert_eq!(ellipsize("abcdefghijk", 10), "abcdefghij...");
        assert_eq!(ellipsize("ééééé", 2), "éé...");
    }

    #[test]
    fn test_truncate_prefers_line_boundary() {
        let text = "first line here\nsecond line here\nthird";
        let (out, cut) = truncate_context(text, 30);
        assert!(cut);
        assert_eq!(out, "first line here");
    }

    #[test]
    fn test_truncate_falls_back_to_whitespace() {
        let (out, cut) = truncate_context("alpha beta gamma delta", 13);
        assert!(cut);
        assert_eq!(out, "alpha beta");
    }

    #[test]
    fn test_truncate_noop_and_multibyte() {
        assert_eq!(truncate_context("fits", 10), ("fits".to_string(), false));
        let (out, cut) = truncate_context("😀😀😀😀", 2);
        assert!(cut);
        assert_eq!(out, "😀😀");
    }

    #[test]
    fn test_format_ts_iso() {
        assert_eq!(format_ts_iso(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_render_count() {
        let report = CountReport {
            term: "cocktail".into(),
            total_count: 7,
            per_file: vec![FileCount {
                file: "E013.txt".into(),
                count: 7,
                examples: vec!["a cocktail".into()],
            }],
        };
        let out = render_count(&report, Some("episode 13"));
        assert!(out.starts_with("Term count for \"cocktail\" in episode 13\nTotal occurrences: 7\n"));
        assert!(out.contains("- E013.txt: 7\n"));
        assert!(out.contains("Example lines from E013.txt:\n- a cocktail\n"));
    }

    #[test]
    fn test_render_zero_count() {
        let report = CountReport {
            term: "beer".into(),
            total_count: 0,
            per_file: Vec::new(),
        };
        let out = render_count(&report, None);
        assert!(out.contains("Total occurrences: 0"));
        assert!(out.contains("No occurrences"));
    }

    #[test]
    fn test_render_semantic_skips_negative() {
        let matches = vec![
            VectorMatch {
                text: "good".into(),
                score: 0.873,
                metadata: serde_json::Value::Null,
            },
            VectorMatch {
                text: "bad".into(),
                score: -0.2,
                metadata: serde_json::Value::Null,
            },
        ];
        assert_eq!(render_semantic(&matches), "[Score: 0.87] good");
    }

    #[test]
    fn test_render_dump_keeps_every_document() {
        let docs = vec![
            doc("big.txt", &"word ".repeat(2000)),
            doc("small.txt", "tiny tail"),
        ];
        let out = render_dump(&docs, 400);
        assert!(out.contains("=== big.txt ==="));
        assert!(out.contains("=== small.txt ===\ntiny tail"));
        assert!(out.chars().count() <= 400);
    }
}
