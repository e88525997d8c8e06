//! Structural parsers.
//!
//! - Transcripts are split into [`TimeBlock`]s, one per `[h:mm:ss]` marker.
//! - Markdown is split into a flat, ordered list of [`Section`]s whose
//!   nesting is implied by heading level.
//! - Plain text has no structural units.
//!
//! Markdown documents can also be scanned for emphasized quotes and author
//! names, independently of sectioning.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{Section, TimeBlock};

/// A transcript timestamp token; group 1 is the bare `h:mm:ss` value.
pub static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+:\d+:\d+)\]").expect("timestamp regex is valid"));

/// Any line starting with one or more `#` followed by a space or tab.
pub static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]").expect("heading line regex is valid"));

/// A single markdown heading line of level 1-6.
static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("markdown heading regex is valid"));

static QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\*\*.*?\*\*|\*.*?\*|".*?"|“.*?”"#).expect("quote regex is valid")
});

static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*\n]+?)(?:,|\*\*)|\bby\s+([A-Z][a-zA-Z]*(?:[ \t]+[A-Z][a-zA-Z]*)*)")
        .expect("author regex is valid")
});

static AUTHOR_QUOTES_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^#{1,6}[ \t]+.*relevant\s+author\s+quotes.*$")
        .expect("author quotes heading regex is valid")
});

static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*\r?$").expect("horizontal rule regex is valid"));

const MIN_QUOTE_CHARS: usize = 10;
const MAX_QUOTES: usize = 10;

/// Split a transcript into time blocks.
///
/// A timestamp line closes the open block and starts a new one whose first
/// line is whatever remains once the token is removed. Text before the
/// first timestamp is ignored, and blocks that never received a line are
/// dropped.
pub fn parse_transcript(text: &str) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<TimeBlock> = None;

    for line in text.lines() {
        if let Some(caps) = TIMESTAMP.captures(line) {
            if let Some(block) = current.take() {
                if !block.lines.is_empty() {
                    blocks.push(block);
                }
            }
            let residual = line.replacen(&caps[0], "", 1);
            let residual = residual.trim();
            let mut lines = Vec::new();
            if !residual.is_empty() {
                lines.push(residual.to_string());
            }
            current = Some(TimeBlock {
                timestamp: caps[1].to_string(),
                lines,
            });
        } else if let Some(block) = current.as_mut() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                block.lines.push(trimmed.to_string());
            }
        }
    }

    if let Some(block) = current {
        if !block.lines.is_empty() {
            blocks.push(block);
        }
    }

    blocks
}

/// Split markdown into sections.
///
/// Sections without any content line are dropped, as is text before the
/// first heading. `parent` points at the nearest earlier emitted section
/// with a smaller level.
pub fn parse_markdown(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some(caps) = MARKDOWN_HEADING.captures(line) {
            if let Some(section) = current.take() {
                if !section.content.is_empty() {
                    sections.push(section);
                }
            }
            current = Some(Section {
                title: caps[2].trim().to_string(),
                level: caps[1].len() as u8,
                content: Vec::new(),
                parent: None,
            });
        } else if let Some(section) = current.as_mut() {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                section.content.push(trimmed.to_string());
            }
        }
    }

    if let Some(section) = current {
        if !section.content.is_empty() {
            sections.push(section);
        }
    }

    for i in 0..sections.len() {
        let level = sections[i].level;
        sections[i].parent = (0..i).rev().find(|&j| sections[j].level < level);
    }

    sections
}

/// Extract emphasized or quoted passages longer than ten characters.
///
/// Markers are stripped, duplicates removed, and the first ten kept.
pub fn extract_quotes(text: &str) -> Vec<String> {
    let flattened = text.replace('\n', " ");
    let mut quotes: Vec<String> = Vec::new();

    for m in QUOTE.find_iter(&flattened) {
        let quote = m
            .as_str()
            .replace("**", "")
            .replace(&['*', '"', '“', '”'][..], "")
            .trim()
            .to_string();
        if quote.chars().count() > MIN_QUOTE_CHARS && !quotes.contains(&quote) {
            quotes.push(quote);
            if quotes.len() == MAX_QUOTES {
                break;
            }
        }
    }

    quotes
}

/// Extract author names: bolded names and capitalized phrases after "by".
pub fn extract_authors(text: &str) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    for caps in AUTHOR.captures_iter(text) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        if !name.is_empty() && !authors.iter().any(|a| a == name) {
            authors.push(name.to_string());
        }
    }
    authors
}

/// The body of a "Relevant Author Quotes" section, verbatim but trimmed.
///
/// The section runs from the line after its heading up to the next `---`
/// rule, or to the end of the text when no rule follows. Returns `None`
/// when the heading is missing or the body is blank.
pub fn extract_author_quotes_section(text: &str) -> Option<&str> {
    let heading = AUTHOR_QUOTES_HEADING.find(text)?;
    let rest = &text[heading.end()..];
    let body = match HORIZONTAL_RULE.find(rest) {
        Some(rule) => &rest[..rule.start()],
        None => rest,
    };
    let body = body.trim();
    (!body.is_empty()).then_some(body)
}

/// Line and whitespace-separated word counts.
pub fn text_stats(text: &str) -> (usize, usize) {
    (text.lines().count(), text.split_whitespace().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "Diggnation episode 13\n\
        \n\
        [0:00:05] Kevin: Welcome to the show\n\
        Alex: thanks\n\
        \n\
        [0:01:10]\n\
        [0:02:00] Alex: cocktail time\n\
        more talk\n\
        [0:03:30] Kevin: goodbye\n";

    #[test]
    fn test_transcript_blocks() {
        let blocks = parse_transcript(TRANSCRIPT);
        let stamps: Vec<&str> = blocks.iter().map(|b| b.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["0:00:05", "0:02:00", "0:03:30"]);
        assert_eq!(blocks[0].lines, vec!["Kevin: Welcome to the show", "Alex: thanks"]);
        assert_eq!(blocks[1].text(), "Alex: cocktail time more talk");
    }

    #[test]
    fn test_transcript_line_accounting() {
        let blocks = parse_transcript(TRANSCRIPT);
        let total: usize = blocks.iter().map(|b| b.lines.len()).sum();

        let mut expected = 0;
        let mut seen_stamp = false;
        for line in TRANSCRIPT.lines() {
            if let Some(m) = TIMESTAMP.find(line) {
                seen_stamp = true;
                let residual = format!("{}{}", &line[..m.start()], &line[m.end()..]);
                if !residual.trim().is_empty() {
                    expected += 1;
                }
            } else if seen_stamp && !line.trim().is_empty() {
                expected += 1;
            }
        }
        assert_eq!(total, expected);
    }

    #[test]
    fn test_transcript_without_timestamps() {
        assert!(parse_transcript("just words\nno markers").is_empty());
    }

    #[test]
    fn test_markdown_levels() {
        let md = "# One\nbody\n## Two\nbody\n## Three\nbody\n# Four\nbody\n";
        let sections = parse_markdown(md);
        let levels: Vec<u8> = sections.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![1, 2, 2, 1]);
        assert_eq!(sections[1].parent, Some(0));
        assert_eq!(sections[2].parent, Some(0));
        assert_eq!(sections[3].parent, None);
    }

    #[test]
    fn test_markdown_drops_empty_sections() {
        let md = "preamble\n# Empty\n## Filled\n- item\n####### not a heading\n";
        let sections = parse_markdown(md);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Filled");
        assert_eq!(sections[0].content, vec!["- item", "####### not a heading"]);
    }

    #[test]
    fn test_extract_quotes() {
        let text = "**Belonging is a practice** and *short*\n\"We are what we repeatedly do\" \"We are what we repeatedly do\"";
        let quotes = extract_quotes(text);
        assert_eq!(
            quotes,
            vec!["Belonging is a practice", "We are what we repeatedly do"]
        );
    }

    #[test]
    fn test_extract_quotes_caps_at_ten() {
        let text: String = (0..15)
            .map(|i| format!("\"quotation number {}\" ", i))
            .collect();
        assert_eq!(extract_quotes(&text).len(), 10);
    }

    #[test]
    fn test_extract_authors() {
        let text = "**Casper ter Kuile**, The Power of Ritual\nA book by Will Storr about stories.\n**Casper ter Kuile** again";
        assert_eq!(extract_authors(text), vec!["Casper ter Kuile", "Will Storr"]);
    }

    #[test]
    fn test_author_quotes_section() {
        let md = "# Plan\nintro\n\n## Relevant Author Quotes\n\n**Will Storr**, The Science of Storytelling\n> \"Stories are made of change\"\n\n---\n\n## Next\nmore\n";
        assert_eq!(
            extract_author_quotes_section(md),
            Some("**Will Storr**, The Science of Storytelling\n> \"Stories are made of change\"")
        );
    }

    #[test]
    fn test_author_quotes_section_crlf() {
        let md = "## Relevant Author Quotes\r\n- \"Talk to users.\" (PG)\r\n---\r\n## Channels\r\nPodcasts\r\n";
        assert_eq!(
            extract_author_quotes_section(md),
            Some("- \"Talk to users.\" (PG)")
        );
    }

    #[test]
    fn test_author_quotes_section_without_rule_or_heading() {
        assert_eq!(
            extract_author_quotes_section("### relevant author quotes\n- one\n"),
            Some("- one")
        );
        assert_eq!(extract_author_quotes_section("## Quotes\n- one\n---\n"), None);
        assert_eq!(extract_author_quotes_section("## Relevant Author Quotes\n---\n"), None);
    }

    #[test]
    fn test_text_stats() {
        assert_eq!(text_stats("one two\nthree\n"), (2, 3));
    }
}
