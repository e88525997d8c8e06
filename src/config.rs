//! Configuration parsing and validation.
//!
//! Context Cascade is configured via a TOML file (default:
//! `config/cascade.toml`). Only `[corpus]` is required; every other section
//! falls back to its defaults.
//!
//! # Example
//!
//! ```toml
//! [corpus]
//! root = "./knowledge-base"
//! include_globs = ["**/*.md", "**/*.txt"]
//! read_concurrency = 8
//!
//! [retrieval]
//! max_context_chars = 16000
//! semantic_top_k = 5
//! semantic_timeout_secs = 10
//! sample_seed = 42
//! extra_samples = 5
//! reference_document = "gtm-plan.md"
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! dims = 1536
//!
//! [prompt]
//! instructions_path = "./knowledge-base/instructions/latest.txt"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Documents read concurrently while building a snapshot.
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.markdown".to_string(),
        "**/*.txt".to_string(),
    ]
}
fn default_read_concurrency() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Hard cap on the context handed to the prompt.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,
    #[serde(default = "default_semantic_timeout_secs")]
    pub semantic_timeout_secs: u64,
    /// Seed for the extra transcript excerpt positions.
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,
    #[serde(default = "default_extra_samples")]
    pub extra_samples: usize,
    /// Document holding the "Relevant Author Quotes" section.
    #[serde(default)]
    pub reference_document: Option<String>,
    #[serde(default = "default_cache_analyses")]
    pub cache_analyses: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            semantic_top_k: default_semantic_top_k(),
            semantic_timeout_secs: default_semantic_timeout_secs(),
            sample_seed: default_sample_seed(),
            extra_samples: default_extra_samples(),
            reference_document: None,
            cache_analyses: default_cache_analyses(),
        }
    }
}

fn default_max_context_chars() -> usize {
    16_000
}
fn default_semantic_top_k() -> usize {
    5
}
fn default_semantic_timeout_secs() -> u64 {
    10
}
fn default_sample_seed() -> u64 {
    42
}
fn default_extra_samples() -> usize {
    5
}
fn default_cache_analyses() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Saved custom instructions; a missing file means none.
    #[serde(default)]
    pub instructions_path: Option<PathBuf>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            instructions_path: None,
        }
    }
}

fn default_system_prompt() -> String {
    "You are a helpful AI assistant.".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.corpus.read_concurrency == 0 {
        bail!("corpus.read_concurrency must be > 0");
    }

    if config.retrieval.max_context_chars == 0 {
        bail!("retrieval.max_context_chars must be > 0");
    }
    if config.retrieval.semantic_top_k < 1 {
        bail!("retrieval.semantic_top_k must be >= 1");
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cascade.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let (_dir, path) = write_config("[corpus]\nroot = \"./kb\"\n");
        let config = load_config(&path).unwrap();
        assert_eq!(config.corpus.root, PathBuf::from("./kb"));
        assert_eq!(config.corpus.include_globs.len(), 3);
        assert_eq!(config.retrieval.max_context_chars, 16_000);
        assert_eq!(config.retrieval.semantic_top_k, 5);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.prompt.system_prompt, "You are a helpful AI assistant.");
    }

    #[test]
    fn test_missing_corpus_section_fails() {
        let (_dir, path) = write_config("[retrieval]\nmax_context_chars = 10\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_zero_context_budget_rejected() {
        let (_dir, path) =
            write_config("[corpus]\nroot = \"kb\"\n[retrieval]\nmax_context_chars = 0\n");
        let err = load_config(&path).unwrap_err().to_string();
        assert!(err.contains("max_context_chars"));
    }

    #[test]
    fn test_enabled_provider_needs_model_and_dims() {
        let (_dir, path) = write_config("[corpus]\nroot = \"kb\"\n[embedding]\nprovider = \"openai\"\n");
        assert!(load_config(&path).unwrap_err().to_string().contains("dims"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let (_dir, path) = write_config("[corpus]\nroot = \"kb\"\n[embedding]\nprovider = \"magic\"\n");
        assert!(load_config(&path).unwrap_err().to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/cascade.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
