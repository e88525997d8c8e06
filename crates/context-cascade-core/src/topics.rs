//! Topic and key-point extraction.
//!
//! # Transcript topics
//!
//! 1. Score every time block: the sum of the counts of each top term that
//!    occurs (as a substring) in the block's lowercased text.
//! 2. Rank blocks by score, highest first. The sort is stable, so equal
//!    scores keep source order.
//! 3. Keep the best [`MAX_TOPICS`] and put them back in chronological order.
//!    Ranking decides selection, never presentation.
//! 4. Title each kept block with up to three non-filler top terms it
//!    contains, and summarize it to [`TOPIC_SUMMARY_CHARS`].
//!
//! # Markdown key points
//!
//! A section whose title carries a signal keyword contributes its content;
//! every bullet line contributes itself verbatim.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::models::{KeyPoint, Section, TermCount, TimeBlock, Topic};
use crate::render::ellipsize;
use crate::terms::FILLER_WORDS;

/// Number of significant blocks kept per transcript.
pub const MAX_TOPICS: usize = 8;
/// Summary length for a topic.
pub const TOPIC_SUMMARY_CHARS: usize = 120;
/// Content length for a keyword-titled key point.
pub const KEY_POINT_CHARS: usize = 200;
/// Upper bound on the representative block sample.
pub const MAX_SAMPLES: usize = 15;

const TITLE_TERMS: usize = 3;

static SIGNAL_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)strategic|plan|phase|goal|action|gtm|market|author|quote|relevant")
        .expect("signal title regex is valid")
});

static BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[•✅📊📢🎥🎤🧩👑📰🎉💬🏠🧠✍🗣]\x{FE0F}?|[-*])\s+")
        .expect("bullet regex is valid")
});

/// Significance score of one block against the document's top terms.
pub fn block_significance(block: &TimeBlock, top_terms: &[TermCount]) -> usize {
    let text = block.text().to_lowercase();
    top_terms
        .iter()
        .filter(|t| text.contains(t.term.as_str()))
        .map(|t| t.count)
        .sum()
}

/// Select and summarize the most significant transcript blocks.
pub fn rank_topics(blocks: &[TimeBlock], top_terms: &[TermCount]) -> Vec<Topic> {
    let mut scored: Vec<(usize, usize)> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| (i, block_significance(block, top_terms)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let mut selected: Vec<usize> = scored.into_iter().take(MAX_TOPICS).map(|(i, _)| i).collect();
    selected.sort_unstable();

    let mut topics = Vec::with_capacity(selected.len());
    for i in selected {
        let block = &blocks[i];
        let text = block.text();
        let lower = text.to_lowercase();

        let title_terms: Vec<&str> = top_terms
            .iter()
            .map(|t| t.term.as_str())
            .filter(|term| lower.contains(term) && !FILLER_WORDS.contains(term))
            .take(TITLE_TERMS)
            .collect();
        if title_terms.is_empty() {
            continue;
        }

        topics.push(Topic {
            title: capitalize(&title_terms.join(", ")),
            timestamp: block.timestamp.clone(),
            summary: ellipsize(&text, TOPIC_SUMMARY_CHARS),
        });
    }
    topics
}

/// Collect key points from markdown sections.
///
/// Sections whose title contains one of `boost_terms` are listed first;
/// otherwise section order is kept.
pub fn extract_key_points(sections: &[Section], boost_terms: &[TermCount]) -> Vec<KeyPoint> {
    let mut grouped: Vec<(bool, Vec<KeyPoint>)> = Vec::new();

    for section in sections {
        let mut points = Vec::new();
        if SIGNAL_TITLE.is_match(&section.title) {
            points.push(KeyPoint {
                title: section.title.clone(),
                content: ellipsize(&section.content.join(" "), KEY_POINT_CHARS),
            });
        }
        for line in &section.content {
            if BULLET.is_match(line) {
                points.push(KeyPoint {
                    title: section.title.clone(),
                    content: line.clone(),
                });
            }
        }
        if points.is_empty() {
            continue;
        }
        let title = section.title.to_lowercase();
        let boosted = boost_terms.iter().any(|t| title.contains(t.term.as_str()));
        grouped.push((boosted, points));
    }

    grouped.sort_by_key(|(boosted, _)| !boosted);
    grouped.into_iter().flat_map(|(_, points)| points).collect()
}

/// Indices of a representative, chronological sample of `count` blocks.
///
/// Always includes the blocks at 0%, 25%, 50%, 75% and 100% of the
/// sequence, then adds up to `extra` positions drawn from a PRNG seeded
/// with `seed`. The same seed always produces the same sample.
pub fn sample_blocks(count: usize, extra: usize, seed: u64) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }

    let last = count - 1;
    let mut picks: BTreeSet<usize> = [0usize, 25, 50, 75, 100]
        .iter()
        .map(|pct| last * pct / 100)
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..extra {
        if picks.len() >= MAX_SAMPLES {
            break;
        }
        picks.insert(rng.gen_range(0..count));
    }

    picks.into_iter().take(MAX_SAMPLES).collect()
}

/// Upper-case the first character, leaving the rest as written.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
