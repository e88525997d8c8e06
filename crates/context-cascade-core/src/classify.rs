//! Document classifier.
//!
//! Assigns a [`DocumentType`] from a filename and a content sample using an
//! ordered rule table; the first matching rule wins and anything left over
//! is [`DocumentType::Plain`].
//!
//! Transcripts are tested before markdown: a timestamp marker is a stronger
//! structural signal than a heading marker when both happen to match.

use crate::models::DocumentType;
use crate::parse::{HEADING_LINE, TIMESTAMP};

/// A classification rule: the type it assigns and its predicate over
/// `(filename, content)`.
pub type ClassifierRule = (DocumentType, fn(&str, &str) -> bool);

/// Rules in evaluation order.
pub const RULES: &[ClassifierRule] = &[
    (DocumentType::Transcript, looks_like_transcript),
    (DocumentType::Markdown, looks_like_markdown),
];

/// Classify a document. Never fails; unclassifiable content is plain text.
pub fn classify_document(name: &str, content: &str) -> DocumentType {
    RULES
        .iter()
        .find(|(_, matches)| matches(name, content))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::Plain)
}

/// Filename mentions "transcript", or the content carries a `[h:mm:ss]` token.
pub fn looks_like_transcript(name: &str, content: &str) -> bool {
    name.to_lowercase().contains("transcript") || TIMESTAMP.is_match(content)
}

/// `.md` extension, or at least one `#`-prefixed heading line.
pub fn looks_like_markdown(name: &str, content: &str) -> bool {
    name.to_lowercase().ends_with(".md") || HEADING_LINE.is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_by_name() {
        assert_eq!(
            classify_document("Diggnation E013_Transcript.txt", "hello"),
            DocumentType::Transcript
        );
    }

    #[test]
    fn test_transcript_by_timestamp() {
        assert_eq!(
            classify_document("notes.txt", "intro\n[0:01:15] Kevin: welcome back"),
            DocumentType::Transcript
        );
    }

    #[test]
    fn test_transcript_wins_over_markdown() {
        let content = "# Show notes\n[1:02:03] we start here";
        assert_eq!(classify_document("notes.md", content), DocumentType::Transcript);
    }

    #[test]
    fn test_markdown_by_extension() {
        assert_eq!(classify_document("plan.MD", "no headings"), DocumentType::Markdown);
    }

    #[test]
    fn test_markdown_by_heading() {
        assert_eq!(
            classify_document("plan.txt", "intro\n## Goals\n- ship it"),
            DocumentType::Markdown
        );
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        assert_eq!(classify_document("tags.txt", "#rust #async"), DocumentType::Plain);
    }

    #[test]
    fn test_plain_default() {
        assert_eq!(classify_document("readme.txt", ""), DocumentType::Plain);
    }

    #[test]
    fn test_rules_in_isolation() {
        assert!(looks_like_transcript("a.txt", "[12:00:01]"));
        assert!(!looks_like_transcript("a.txt", "[12:00]"));
        assert!(looks_like_markdown("a.txt", "# Title"));
        assert!(!looks_like_markdown("a.txt", "not # a heading"));
    }
}
