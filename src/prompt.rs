//! System prompt assembly.
//!
//! The downstream chat model receives one system message built from three
//! parts, each present only when non-empty:
//!
//! ```text
//! <system_prompt>
//!
//! Custom Instructions:
//! <saved instructions>
//!
//! Relevant Context:
//! <resolved context>
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use context_cascade_core::models::RetrievalResult;

use crate::config::PromptConfig;

/// Read saved custom instructions. A missing or blank file means none.
pub fn load_instructions(path: Option<&Path>) -> Result<Option<String>> {
    let path = match path {
        Some(p) if p.exists() => p,
        _ => return Ok(None),
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instructions: {}", path.display()))?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

pub fn build_system_prompt(
    system_prompt: &str,
    instructions: Option<&str>,
    result: &RetrievalResult,
) -> String {
    let mut prompt = system_prompt.to_string();
    if let Some(instructions) = instructions.filter(|i| !i.trim().is_empty()) {
        prompt.push_str("\n\nCustom Instructions:\n");
        prompt.push_str(instructions);
    }
    if result.has_context() {
        prompt.push_str("\n\nRelevant Context:\n");
        prompt.push_str(&result.context_text);
    }
    prompt
}

/// Assemble the prompt from configuration and a resolved context.
pub fn assemble(config: &PromptConfig, result: &RetrievalResult) -> Result<String> {
    let instructions = load_instructions(config.instructions_path.as_deref())?;
    Ok(build_system_prompt(
        &config.system_prompt,
        instructions.as_deref(),
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_cascade_core::models::SourceStrategy;
    use tempfile::TempDir;

    fn context(text: &str) -> RetrievalResult {
        RetrievalResult {
            context_text: text.to_string(),
            source_strategy: SourceStrategy::KeywordSearch,
            truncated: false,
        }
    }

    #[test]
    fn test_full_prompt() {
        let prompt = build_system_prompt("Base.", Some("Be brief."), &context("facts"));
        assert_eq!(
            prompt,
            "Base.\n\nCustom Instructions:\nBe brief.\n\nRelevant Context:\nfacts"
        );
    }

    #[test]
    fn test_prompt_without_context_or_instructions() {
        let prompt = build_system_prompt("Base.", None, &RetrievalResult::no_context());
        assert_eq!(prompt, "Base.");
        let prompt = build_system_prompt("Base.", Some("  "), &context("facts"));
        assert_eq!(prompt, "Base.\n\nRelevant Context:\nfacts");
    }

    #[test]
    fn test_load_instructions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latest.txt");
        assert_eq!(load_instructions(Some(&path)).unwrap(), None);
        std::fs::write(&path, "  Answer in French.\n").unwrap();
        assert_eq!(
            load_instructions(Some(&path)).unwrap().as_deref(),
            Some("Answer in French.")
        );
        assert_eq!(load_instructions(None).unwrap(), None);
    }
}
