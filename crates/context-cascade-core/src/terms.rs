//! Term frequency statistics.
//!
//! Text is lowercased and split into runs of three or more ASCII letters;
//! tokens on the active [`StopList`] are discarded. A [`TermFrequency`]
//! keeps first-occurrence order so that ranking ties resolve the same way
//! on every run.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::TermCount;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,}\b").expect("word regex is valid"));

/// Top-term cap for transcript topic scoring.
pub const TRANSCRIPT_TOP_TERMS: usize = 25;
/// Top-term cap for generic text.
pub const TEXT_TOP_TERMS: usize = 20;
/// Top-term cap when boosting markdown key points.
pub const KEY_POINT_TOP_TERMS: usize = 15;

const BASE_STOPWORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "you", "have", "are", "what", "was", "from",
    "they", "your", "but", "not", "its", "our", "were", "has",
];

/// Conversational filler that carries no topic signal in transcripts.
pub const FILLER_WORDS: &[&str] = &["yeah", "like", "just", "know", "right", "think"];

const QUERY_STOPWORDS: &[&str] = &[
    "how", "many", "much", "times", "does", "did", "can", "could", "would", "should", "tell",
    "about", "show", "list", "give", "please", "find", "any", "all", "some", "there", "their",
    "them", "then", "than", "who", "whom", "when", "where", "which", "why", "into", "over",
    "also", "been", "being", "will", "shall", "may", "might", "must", "mentioned", "mention",
    "said", "say", "says", "is", "me", "my", "of", "in", "on", "to", "a", "an", "do", "it",
];

const LOOSE_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "is", "it", "at", "be",
];

/// Which stopword list to filter with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopList {
    /// Common English function words.
    Base,
    /// Base list plus [`FILLER_WORDS`].
    Transcript,
    /// Base list plus question scaffolding ("how", "many", "tell", ...).
    Query,
    /// A short list used when loosening keyword search.
    Loose,
}

impl StopList {
    pub fn contains(&self, word: &str) -> bool {
        match self {
            StopList::Base => BASE_STOPWORDS.contains(&word),
            StopList::Transcript => BASE_STOPWORDS.contains(&word) || FILLER_WORDS.contains(&word),
            StopList::Query => BASE_STOPWORDS.contains(&word) || QUERY_STOPWORDS.contains(&word),
            StopList::Loose => LOOSE_STOPWORDS.contains(&word),
        }
    }
}

/// Lowercased tokens of three or more ASCII letters, stopwords included.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Occurrence counts of non-stopword terms within one text.
#[derive(Debug, Clone, Default)]
pub struct TermFrequency {
    entries: Vec<TermCount>,
    index: HashMap<String, usize>,
}

impl TermFrequency {
    pub fn from_text(text: &str, stoplist: StopList) -> Self {
        let mut freq = TermFrequency::default();
        for token in tokenize(text) {
            if stoplist.contains(&token) {
                continue;
            }
            match freq.index.get(&token) {
                Some(&i) => freq.entries[i].count += 1,
                None => {
                    freq.index.insert(token.clone(), freq.entries.len());
                    freq.entries.push(TermCount {
                        term: token,
                        count: 1,
                    });
                }
            }
        }
        freq
    }

    pub fn get(&self, term: &str) -> usize {
        self.index
            .get(term)
            .map(|&i| self.entries[i].count)
            .unwrap_or(0)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `cap` most frequent terms; ties keep first-occurrence order.
    pub fn top(&self, cap: usize) -> Vec<TermCount> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(cap);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_filters_short_and_non_ascii_runs() {
        let tokens = tokenize("The cat's CRADLE, a 42nd go-between!");
        assert_eq!(tokens, vec!["the", "cat", "cradle", "between"]);
    }

    #[test]
    fn test_frequency_skips_stopwords() {
        let freq = TermFrequency::from_text("the cocktail and the cocktail bar", StopList::Base);
        assert_eq!(freq.get("cocktail"), 2);
        assert_eq!(freq.get("bar"), 1);
        assert_eq!(freq.get("the"), 0);
        assert_eq!(freq.len(), 2);
    }

    #[test]
    fn test_transcript_list_drops_filler() {
        let text = "yeah yeah like right think know beer";
        let base = TermFrequency::from_text(text, StopList::Base);
        let transcript = TermFrequency::from_text(text, StopList::Transcript);
        assert_eq!(base.get("yeah"), 2);
        assert_eq!(transcript.get("yeah"), 0);
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_top_ties_keep_first_occurrence() {
        let freq = TermFrequency::from_text("zebra apple mango apple zebra mango kiwi", StopList::Base);
        let top: Vec<String> = freq.top(3).into_iter().map(|t| t.term).collect();
        assert_eq!(top, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_top_respects_cap() {
        let text: String = ('a'..='z').map(|c| format!("{c}{c}{c} ")).collect();
        let freq = TermFrequency::from_text(&text, StopList::Base);
        assert_eq!(freq.top(TEXT_TOP_TERMS).len(), TEXT_TOP_TERMS);
    }

    #[test]
    fn test_stoplists() {
        assert!(StopList::Query.contains("how"));
        assert!(StopList::Query.contains("the"));
        assert!(!StopList::Base.contains("how"));
        assert!(StopList::Loose.contains("of"));
        assert!(!StopList::Loose.contains("with"));
    }
}
