//! Term occurrence counting.
//!
//! Matching is a case-insensitive substring scan that resumes after each
//! hit, so occurrences never overlap: "aaaa" holds "aa" twice, not three
//! times.

use crate::models::{CountReport, Document, FileCount};

/// Example lines kept per file.
pub const MAX_EXAMPLES: usize = 5;

/// Non-overlapping, case-insensitive occurrences of `term` in `text`.
///
/// A blank term never matches.
pub fn count_occurrences(text: &str, term: &str) -> usize {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(needle.as_str()).count()
}

/// The first [`MAX_EXAMPLES`] trimmed lines that contain `term`.
pub fn example_lines(text: &str, term: &str) -> Vec<String> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    text.lines()
        .filter(|line| line.to_lowercase().contains(needle.as_str()))
        .map(|line| line.trim().to_string())
        .take(MAX_EXAMPLES)
        .collect()
}

/// Count `term` across `docs`.
///
/// Only files with at least one occurrence are listed, highest count
/// first, ties by file name.
pub fn count_in_documents<'a, I>(docs: I, term: &str) -> CountReport
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut per_file: Vec<FileCount> = docs
        .into_iter()
        .filter_map(|doc| {
            let count = count_occurrences(&doc.text, term);
            (count > 0).then(|| FileCount {
                file: doc.name.clone(),
                count,
                examples: example_lines(&doc.text, term),
            })
        })
        .collect();
    per_file.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.file.cmp(&b.file)));

    CountReport {
        term: term.trim().to_string(),
        total_count: per_file.iter().map(|f| f.count).sum(),
        per_file,
    }
}
