//! CLI front-ends for the engine's query operations.
//!
//! Human-readable output goes to stdout; `--json` prints the serialized
//! result instead so the commands can be scripted.

use anyhow::{Context, Result};
use serde::Serialize;

use context_cascade_core::render::render_count;

use crate::config::Config;
use crate::engine::ContextEngine;

/// Run the resolve command: print the context chosen for `query`.
pub async fn run_resolve(engine: &ContextEngine, query: &str, json: bool) -> Result<()> {
    let result = engine.resolve_context(query).await;

    if json {
        return print_json(&result);
    }
    if !result.has_context() {
        println!("No context.");
        return Ok(());
    }
    println!("{}", result.context_text);
    eprintln!(
        "[strategy: {}{}]",
        result.source_strategy,
        if result.truncated { ", truncated" } else { "" }
    );
    Ok(())
}

/// Run the count command.
pub async fn run_count(
    engine: &ContextEngine,
    term: &str,
    document: Option<&str>,
    episode: Option<u32>,
    json: bool,
) -> Result<()> {
    let report = engine
        .count_term(term, document, episode)
        .await
        .with_context(|| format!("Failed to count \"{}\"", term.trim()))?;

    if json {
        return print_json(&report);
    }
    let scope = match (document, episode) {
        (Some(d), _) => Some(d.to_string()),
        (None, Some(ep)) => Some(format!("episode {}", ep)),
        (None, None) => None,
    };
    print!("{}", render_count(&report, scope.as_deref()));
    Ok(())
}

/// Run the analyze command: print the document analysis as JSON.
pub async fn run_analyze(engine: &ContextEngine, name: &str, episode: Option<u32>) -> Result<()> {
    let analysis = engine
        .analyze_document(name, episode)
        .await
        .with_context(|| format!("Failed to analyze {:?}", name))?;
    print_json(&analysis)
}

/// Run the search command: print the nearest indexed chunks for `query`.
pub async fn run_search(engine: &ContextEngine, query: &str, json: bool) -> Result<()> {
    let matches = engine
        .semantic_search(query)
        .await
        .context("Semantic search failed")?;

    if json {
        return print_json(&matches);
    }
    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, m) in matches.iter().enumerate() {
        let document = m.metadata["document"].as_str().unwrap_or("?");
        println!("{}. [{:.3}] {}", i + 1, m.score, document);
        println!("   {}", excerpt(&m.text, 200));
        println!();
    }
    Ok(())
}

/// First `max_chars` characters of `text` on one line.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// Run the prompt command: resolve `query` and print the system prompt a
/// chat model would receive.
pub async fn run_prompt(engine: &ContextEngine, config: &Config, query: &str) -> Result<()> {
    let result = engine.resolve_context(query).await;
    let prompt = crate::prompt::assemble(&config.prompt, &result)?;
    println!("{}", prompt);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_flattens_and_cuts() {
        assert_eq!(excerpt("one\n\ntwo   three", 50), "one two three");
        assert_eq!(excerpt("abcdefgh", 3), "abc...");
    }
}
