//! Corpus overview.
//!
//! Lists every document the engine would see: name, detected type, size and
//! age. Documents that could not be read are listed separately with the
//! reason. Used by `cascade docs` to check that the include/exclude globs
//! pick up the intended files.

use anyhow::Result;

use crate::engine::ContextEngine;

/// Run the docs command: snapshot the corpus and print a table.
pub async fn run_docs(engine: &ContextEngine) -> Result<()> {
    let snapshot = engine.snapshot().await?;

    if snapshot.is_empty() && snapshot.skipped.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    let total_bytes: u64 = snapshot.documents.iter().map(|d| d.size).sum();
    println!(
        "{} document{} ({})",
        snapshot.documents.len(),
        if snapshot.documents.len() == 1 { "" } else { "s" },
        format_bytes(total_bytes)
    );
    println!(
        "Semantic search: {}",
        if engine.has_semantic() { "enabled" } else { "disabled" }
    );
    println!();
    println!(
        "  {:<48} {:<10} {:>10}   {}",
        "NAME", "TYPE", "SIZE", "MODIFIED"
    );
    println!("  {}", "-".repeat(86));
    for doc in &snapshot.documents {
        println!(
            "  {:<48} {:<10} {:>10}   {}",
            doc.name,
            doc.doc_type.as_str(),
            format_bytes(doc.size),
            format_ts_relative(doc.modified_at)
        );
    }

    if !snapshot.skipped.is_empty() {
        println!();
        println!("  Skipped:");
        for skipped in &snapshot.skipped {
            println!("  {:<48} {}", skipped.name, skipped.reason);
        }
    }
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_short(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_short(ts)
    }
}

fn format_ts_short(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
