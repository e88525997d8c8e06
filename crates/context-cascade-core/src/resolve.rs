//! Document target resolution.
//!
//! Transcript filenames carry their episode as `E` plus a three-digit,
//! zero-padded number (`Diggnation E013_transcript.txt`). Episode matching
//! is a case-sensitive substring test on that token.

use crate::error::RetrievalError;
use crate::models::{Document, DocumentType};

/// Filename token for an episode number: `13` becomes `E013`.
pub fn episode_token(episode: u32) -> String {
    format!("E{:03}", episode)
}

pub fn matches_episode(name: &str, episode: u32) -> bool {
    name.contains(&episode_token(episode))
}

/// Narrow `docs` by a case-insensitive name fragment and/or an episode.
/// With neither filter every document is a candidate.
pub fn filter_documents<'a>(
    docs: &'a [Document],
    name: Option<&str>,
    episode: Option<u32>,
) -> Vec<&'a Document> {
    let name = name.map(|n| n.trim().to_lowercase());
    docs.iter()
        .filter(|doc| match &name {
            Some(fragment) => doc.name.to_lowercase().contains(fragment.as_str()),
            None => true,
        })
        .filter(|doc| episode.map_or(true, |ep| matches_episode(&doc.name, ep)))
        .collect()
}

/// Exact case-insensitive name match, else the first partial match.
pub fn find_by_name<'a>(docs: &'a [Document], name: &str) -> Option<&'a Document> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    docs.iter()
        .find(|doc| doc.name.to_lowercase() == wanted)
        .or_else(|| {
            docs.iter()
                .find(|doc| doc.name.to_lowercase().contains(wanted.as_str()))
        })
}

pub fn find_by_episode(docs: &[Document], episode: u32) -> Option<&Document> {
    docs.iter().find(|doc| matches_episode(&doc.name, episode))
}

/// Pick a document from query vocabulary alone.
///
/// "gtm", "author" or "quote" prefer the first markdown file; "transcript"
/// or "episode" prefer the first transcript; otherwise, or when no file of
/// the preferred type exists, the first document.
pub fn pick_by_heuristic<'a>(docs: &'a [Document], query: &str) -> Option<&'a Document> {
    let lower = query.to_lowercase();
    let preferred = if ["gtm", "author", "quote"].iter().any(|w| lower.contains(w)) {
        Some(DocumentType::Markdown)
    } else if ["transcript", "episode"].iter().any(|w| lower.contains(w)) {
        Some(DocumentType::Transcript)
    } else {
        None
    };

    preferred
        .and_then(|doc_type| docs.iter().find(|doc| doc.doc_type == doc_type))
        .or_else(|| docs.first())
}

/// Resolve the single document a query is about.
///
/// An explicit name or episode that matches nothing is `NotFound`; the
/// heuristics only apply when the query named neither.
pub fn resolve_target<'a>(
    docs: &'a [Document],
    name: Option<&str>,
    episode: Option<u32>,
    query: &str,
) -> Result<&'a Document, RetrievalError> {
    if name.is_none() && episode.is_none() {
        return pick_by_heuristic(docs, query).ok_or_else(|| RetrievalError::not_found("any document"));
    }

    name.and_then(|n| find_by_name(docs, n))
        .or_else(|| episode.and_then(|ep| find_by_episode(docs, ep)))
        .ok_or_else(|| {
            let reference = match (name, episode) {
                (Some(n), Some(ep)) => format!("{n:?} or episode {ep}"),
                (Some(n), None) => format!("{n:?}"),
                (None, Some(ep)) => format!("episode {ep}"),
                (None, None) => String::new(),
            };
            RetrievalError::not_found(reference)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentInfo;

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

    fn corpus() -> Vec<Document> {
        vec![
            doc("Diggnation E013_transcript.txt", "[0:00:01] hi"),
            doc("Diggnation E131_transcript.txt", "[0:00:01] hello"),
            doc("gtm-plan.md", "# Plan\n- ship"),
            doc("notes.txt", "plain words"),
        ]
    }

    #[test]
    fn test_episode_token() {
        assert_eq!(episode_token(13), "E013");
        assert_eq!(episode_token(7), "E007");
        assert_eq!(episode_token(1234), "E1234");
    }

    #[test]
    fn test_episode_match_is_case_sensitive() {
        assert!(matches_episode("Show E013.txt", 13));
        assert!(!matches_episode("show e013.txt", 13));
        assert!(!matches_episode("Show E131.txt", 13));
    }

    #[test]
    fn test_filter_documents() {
        let docs = corpus();
        assert_eq!(filter_documents(&docs, None, None).len(), 4);
        assert_eq!(filter_documents(&docs, None, Some(13)).len(), 1);
        assert_eq!(filter_documents(&docs, Some("DIGGNATION"), None).len(), 2);
        assert!(filter_documents(&docs, Some("notes"), Some(13)).is_empty());
    }

    #[test]
    fn test_find_by_name_prefers_exact() {
        let docs = vec![doc("plan.md.bak", "x"), doc("plan.md", "y")];
        assert_eq!(find_by_name(&docs, "PLAN.md").unwrap().name, "plan.md");
        assert_eq!(find_by_name(&docs, "bak").unwrap().name, "plan.md.bak");
        assert!(find_by_name(&docs, " ").is_none());
    }

    #[test]
    fn test_heuristics() {
        let docs = corpus();
        assert_eq!(pick_by_heuristic(&docs, "the GTM strategy").unwrap().name, "gtm-plan.md");
        assert_eq!(
            pick_by_heuristic(&docs, "what was that episode about").unwrap().doc_type,
            DocumentType::Transcript
        );
        assert_eq!(
            pick_by_heuristic(&docs, "anything").unwrap().name,
            "Diggnation E013_transcript.txt"
        );
        assert!(pick_by_heuristic(&[], "anything").is_none());
    }

    #[test]
    fn test_resolve_target() {
        let docs = corpus();
        assert_eq!(
            resolve_target(&docs, None, Some(131), "q").unwrap().name,
            "Diggnation E131_transcript.txt"
        );
        assert_eq!(
            resolve_target(&docs, Some("missing.txt"), Some(13), "q").unwrap().name,
            "Diggnation E013_transcript.txt"
        );
        assert!(matches!(
            resolve_target(&docs, None, Some(99), "transcript"),
            Err(RetrievalError::NotFound { .. })
        ));
        assert!(resolve_target(&[], None, None, "q").is_err());
    }
}
