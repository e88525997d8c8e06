//! Query intent classifier.
//!
//! A query is reduced once to [`QueryFeatures`] (episode number, document
//! reference, normalized text) and then run through [`RULES`], an ordered
//! table of `(name, rule)` pairs. The first rule that yields an intent wins,
//! so count phrasing always beats topic vocabulary.
//!
//! | Order | Intent | Trigger |
//! |-------|--------|---------|
//! | 1 | [`QueryIntent::Count`] | "how many times is X mentioned", "count occurrences of X", ... |
//! | 2 | [`QueryIntent::DocumentReference`] | a quoted/file name or an episode number |
//! | 3 | [`QueryIntent::TopicAnalysis`] | topic or document vocabulary |
//! | 4 | [`QueryIntent::KeywordSearch`] | any search term survives stopword filtering |
//! | - | [`QueryIntent::None`] | nothing matched |

use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::LazyLock;

use crate::terms::StopList;

/// The classified purpose of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum QueryIntent {
    Count {
        term: String,
        document_filter: Option<String>,
        episode_filter: Option<u32>,
    },
    DocumentReference {
        document_name: Option<String>,
        episode_number: Option<u32>,
    },
    TopicAnalysis {
        document_name: Option<String>,
        episode_number: Option<u32>,
    },
    KeywordSearch {
        terms: Vec<String>,
    },
    None,
}

impl QueryIntent {
    pub fn name(&self) -> &'static str {
        match self {
            QueryIntent::Count { .. } => "count",
            QueryIntent::DocumentReference { .. } => "document_reference",
            QueryIntent::TopicAnalysis { .. } => "topic_analysis",
            QueryIntent::KeywordSearch { .. } => "keyword_search",
            QueryIntent::None => "none",
        }
    }
}

/// Everything the rules look at, extracted once per query.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    pub raw: String,
    pub lower: String,
    pub count_term: Option<String>,
    pub episode: Option<u32>,
    pub document: Option<String>,
}

impl QueryFeatures {
    pub fn extract(query: &str) -> Self {
        let raw = query.trim().to_string();
        let count_match = count_term_match(&raw);
        let episode = episode_outside(&raw, count_match.as_ref().map(|(_, span)| span.clone()));
        let count_term = count_match.map(|(term, _)| term);
        let document = extract_document_reference(&raw, count_term.as_deref());
        Self {
            lower: raw.to_lowercase(),
            raw,
            count_term,
            episode,
            document,
        }
    }
}

/// An intent rule: its name and the extractor run over the features.
pub type IntentRule = (&'static str, fn(&QueryFeatures) -> Option<QueryIntent>);

/// Rules in evaluation order.
pub const RULES: &[IntentRule] = &[
    ("count", count_rule),
    ("document_reference", document_reference_rule),
    ("topic_analysis", topic_rule),
    ("keyword_search", keyword_rule),
];

/// Count phrasings; each captures the term in the `term` group.
static COUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)\bhow\s+many\s+times\s+(?:do|does|did)\s+(?:\w+\s+){1,3}?(?:say|said|mention|mentioned|use|used)\s+(?:the\s+)?(?:(?:word|term|phrase)\s+)?["“']?(?P<term>[^"“”'?]+?)["”']?\s*(?:\?|$|\s+(?:in|on|during|throughout|across)\b)"#,
        r#"(?i)\bhow\s+many\s+times\s+(?:(?:is|are|was|were|does|did|do|has|have)\s+)?(?:the\s+)?(?:(?:word|term|phrase|name)\s+)?["“']?(?P<term>[^"“”'?]+?)["”']?\s+(?:(?:been|being|get|gets|got)\s+)?(?:mentioned|mention|said|say|says|used|appear|appears|appeared|occur|occurs|occurred|come\s+up|comes\s+up|came\s+up|show\s+up|shows\s+up|showed\s+up)\b"#,
        r#"(?i)\bhow\s+(?:often|frequently)\s+(?:is|are|was|were|does|did|do)\s+(?:the\s+)?(?:(?:word|term|phrase)\s+)?["“']?(?P<term>[^"“”'?]+?)["”']?\s+(?:mentioned|said|used|appear|appears|come\s+up|comes\s+up|brought\s+up)\b"#,
        r#"(?i)\bhow\s+many\s+(?:mentions|occurrences|instances|references|uses)\s+(?:of|to)\s+(?:the\s+)?(?:(?:word|term|phrase)\s+)?["“']?(?P<term>[^"“”'?]+?)["”']?\s*(?:\?|$|\s+(?:are|is|were|in|on|across|throughout|there)\b)"#,
        r#"(?i)\bcount\s+(?:the\s+|all\s+)?(?:number\s+of\s+)?(?:occurrences|mentions|instances|times|uses)\s+(?:of\s+)?(?:the\s+)?(?:(?:word|term|phrase)\s+)?["“']?(?P<term>[^"“”'?]+?)["”']?\s*(?:[?.!]?\s*$|\s+(?:in|on|across|throughout)\b)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("count regex is valid"))
    .collect()
});

static EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:episode|ep\.?)\s*#?\s*(\d{1,4})\b|\be(\d{1,4})\b")
        .expect("episode regex is valid")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|“([^”]+)”"#).expect("quoted regex is valid"));

static FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[\w][\w.-]*\.(?:txt|md|markdown)\b").expect("filename regex is valid")
});

static NAMED_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:in|from|of)\s+(?:the\s+|my\s+|this\s+|that\s+)?(?:file|document|doc|transcript|notes)\s+(?:called\s+|named\s+|titled\s+)?["“']?(?P<name>[\w][\w.-]*)"#)
        .expect("named document regex is valid")
});

static TOPIC_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:topics?|discuss(?:ed|es|ing|ion)?|summar(?:y|ies|ize|ise|ized|ised)|what\s+happened|talk(?:ed)?\s+about|main\s+points|key\s+points|overview|highlights?|episode|transcript|gtm|that\s+episode)\b")
        .expect("topic vocabulary regex is valid")
});

static QUERY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("query token regex is valid"));

/// Classify a query. Never fails; anything unrecognized is `None`.
pub fn classify_intent(query: &str) -> QueryIntent {
    if query.trim().is_empty() {
        return QueryIntent::None;
    }
    let features = QueryFeatures::extract(query);
    RULES
        .iter()
        .find_map(|(_, rule)| rule(&features))
        .unwrap_or(QueryIntent::None)
}

pub fn count_rule(f: &QueryFeatures) -> Option<QueryIntent> {
    let term = f.count_term.clone()?;
    Some(QueryIntent::Count {
        term,
        document_filter: f.document.clone(),
        episode_filter: f.episode,
    })
}

pub fn document_reference_rule(f: &QueryFeatures) -> Option<QueryIntent> {
    if f.document.is_none() && f.episode.is_none() {
        return None;
    }
    Some(QueryIntent::DocumentReference {
        document_name: f.document.clone(),
        episode_number: f.episode,
    })
}

pub fn topic_rule(f: &QueryFeatures) -> Option<QueryIntent> {
    TOPIC_VOCAB.is_match(&f.lower).then_some(QueryIntent::TopicAnalysis {
        document_name: f.document.clone(),
        episode_number: f.episode,
    })
}

pub fn keyword_rule(f: &QueryFeatures) -> Option<QueryIntent> {
    let terms = search_terms(&f.raw);
    (!terms.is_empty()).then_some(QueryIntent::KeywordSearch { terms })
}

/// The term of a count phrasing, trimmed of surrounding punctuation.
pub fn extract_count_term(query: &str) -> Option<String> {
    count_term_match(query).map(|(term, _)| term)
}

/// The count term and the byte span it was captured from.
fn count_term_match(query: &str) -> Option<(String, Range<usize>)> {
    COUNT_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(query)?;
        let group = caps.name("term")?;
        let term = group
            .as_str()
            .trim()
            .trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!'))
            .trim();
        (!term.is_empty()).then(|| (term.to_string(), group.range()))
    })
}

/// `episode 13`, `ep. 13`, `episode #13` or `e13`.
pub fn extract_episode(query: &str) -> Option<u32> {
    episode_outside(query, None)
}

/// The first episode reference that does not overlap `skip`.
fn episode_outside(query: &str, skip: Option<Range<usize>>) -> Option<u32> {
    EPISODE
        .captures_iter(query)
        .filter(|caps| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            skip.as_ref()
                .map_or(true, |s| whole.end <= s.start || whole.start >= s.end)
        })
        .find_map(|caps| caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok())
}

/// A quoted name (other than the count term), a filename-like token, or
/// "in the file/transcript/document NAME".
pub fn extract_document_reference(query: &str, count_term: Option<&str>) -> Option<String> {
    let is_term = |s: &str| count_term.is_some_and(|t| t.eq_ignore_ascii_case(s.trim()));

    let quoted = QUOTED.captures_iter(query).find_map(|caps| {
        let text = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
        (!text.is_empty() && !is_term(text)).then(|| text.to_string())
    });
    if quoted.is_some() {
        return quoted;
    }

    if let Some(m) = FILENAME.find(query) {
        return Some(m.as_str().to_string());
    }

    NAMED_DOCUMENT.captures_iter(query).find_map(|caps| {
        let name = caps.name("name")?.as_str();
        let lower = name.to_lowercase();
        let generic = StopList::Query.contains(&lower)
            || lower.starts_with("episode")
            || lower == "ep"
            || lower.chars().all(|c| c.is_ascii_digit());
        (!generic && !is_term(name)).then(|| name.to_string())
    })
}

fn query_tokens(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    QUERY_TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Single words longer than two characters plus adjacent bigrams, after
/// query stopword filtering; deduplicated, words first.
pub fn search_terms(query: &str) -> Vec<String> {
    let tokens = query_tokens(query);
    let keep = |t: &str| t.len() > 2 && !StopList::Query.contains(t);

    let mut terms: Vec<String> = Vec::new();
    for token in tokens.iter().filter(|t| keep(t)) {
        if !terms.contains(token) {
            terms.push(token.clone());
        }
    }
    for pair in tokens.windows(2) {
        if keep(&pair[0]) && keep(&pair[1]) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if !terms.contains(&bigram) {
                terms.push(bigram);
            }
        }
    }
    terms
}

/// Words of two or more characters minus a short stopword list.
pub fn loose_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in query_tokens(query) {
        if token.len() >= 2 && !StopList::Loose.contains(&token) && !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}
