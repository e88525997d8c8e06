use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn cascade_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cascade"))
}

fn setup_test_env(with_documents: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let corpus_dir = root.join("corpus");
    fs::create_dir_all(&corpus_dir).unwrap();

    if with_documents {
        fs::write(
            corpus_dir.join("Diggnation E013_transcript.txt"),
            "[0:00:05]\nWelcome back, today we talk about a cocktail.\n[0:02:10]\nThis cocktail, that cocktail, every cocktail is a good cocktail.\n[0:05:45]\nCocktail hour, cocktail time.\n",
        )
        .unwrap();
        fs::write(
            corpus_dir.join("gtm-notes.md"),
            "# GTM Notes\n\n## Relevant Author Quotes\n\n- \"Talk to your users.\" (Paul Graham)\n\n---\n\n## Channels\nPodcasts.\n",
        )
        .unwrap();
        fs::write(corpus_dir.join("skip.meta.json"), "{}").unwrap();
    }

    fs::write(
        root.join("instructions.txt"),
        "Answer in one paragraph.\n",
    )
    .unwrap();

    let config_path = root.join("cascade.toml");
    fs::write(
        &config_path,
        format!(
            r#"[corpus]
root = "{}/corpus"

[retrieval]
max_context_chars = 4000

[prompt]
instructions_path = "{}/instructions.txt"
"#,
            root.display(),
            root.display()
        ),
    )
    .unwrap();

    (tmp, config_path)
}

fn run_cascade(config: &Path, args: &[&str]) -> Output {
    Command::new(cascade_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run cascade")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_docs_lists_corpus() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["docs"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("2 documents"));
    assert!(out.contains("Diggnation E013_transcript.txt"));
    assert!(out.contains("transcript"));
    assert!(out.contains("gtm-notes.md"));
    assert!(!out.contains("skip.meta.json"));
}

#[test]
fn test_resolve_count_query_json() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(
        &config,
        &[
            "resolve",
            "How many times is cocktail mentioned in episode 13?",
            "--json",
        ],
    );
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["source_strategy"], "count");
    assert_eq!(result["truncated"], false);
    assert!(result["context_text"]
        .as_str()
        .unwrap()
        .contains("Total occurrences: 7"));
}

#[test]
fn test_count_command_json() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["count", "cocktail", "--episode", "13", "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["total_count"], 7);
    assert_eq!(report["per_file"].as_array().unwrap().len(), 1);
}

#[test]
fn test_count_unknown_episode_fails() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["count", "cocktail", "--episode", "99"]);
    assert!(!output.status.success());
}

#[test]
fn test_analyze_command() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["analyze", "gtm-notes"]);
    assert!(output.status.success());
    let analysis: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(analysis["name"], "gtm-notes.md");
    assert_eq!(analysis["doc_type"], "markdown");
}

#[test]
fn test_prompt_includes_instructions_and_context() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["prompt", "list the authors and quotes"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("You are a helpful AI assistant."));
    assert!(out.contains("Custom Instructions:\nAnswer in one paragraph."));
    assert!(out.contains("Relevant Context:\n- \"Talk to your users.\" (Paul Graham)"));
}

#[test]
fn test_search_without_embeddings_fails() {
    let (_tmp, config) = setup_test_env(true);
    let output = run_cascade(&config, &["search", "growth channels"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not configured"));
}

#[test]
fn test_resolve_empty_corpus() {
    let (_tmp, config) = setup_test_env(false);
    let output = run_cascade(&config, &["resolve", "anything at all"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "No context.");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run_cascade(&tmp.path().join("nope.toml"), &["docs"]);
    assert!(!output.status.success());
}
