//! Corpus accessors.
//!
//! The [`Corpus`] trait is the engine's only view of the documents it
//! searches: a listing of names with size and modification time, and a way
//! to read one document's text. It carries no business logic.
//!
//! Two implementations ship with the crate:
//!
//! - [`FsCorpus`] walks a directory tree, applying include and exclude
//!   globs relative to the root. Sidecar metadata files (`*.meta.json`),
//!   `.git`, `target` and `node_modules` are always excluded.
//! - [`MemoryCorpus`] holds documents in memory, for embedding the engine
//!   and for tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;
use walkdir::WalkDir;

use context_cascade_core::models::DocumentInfo;

use crate::config::CorpusConfig;

/// Read-only access to a document collection.
#[async_trait]
pub trait Corpus: Send + Sync {
    /// All documents, sorted by name.
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>>;

    /// The full text of one document.
    async fn read_document(&self, name: &str) -> Result<String>;
}

/// Filesystem-backed corpus rooted at a directory.
///
/// Document names are paths relative to the root, with `/` separators.
pub struct FsCorpus {
    root: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
    follow_symlinks: bool,
}

impl FsCorpus {
    pub fn new(config: &CorpusConfig) -> Result<Self> {
        let include = build_globset(&config.include_globs)?;

        let mut excludes = vec![
            "**/.git/**".to_string(),
            "**/target/**".to_string(),
            "**/node_modules/**".to_string(),
            "**/*.meta.json".to_string(),
        ];
        excludes.extend(config.exclude_globs.iter().cloned());
        let exclude = build_globset(&excludes)?;

        Ok(Self {
            root: config.root.clone(),
            include,
            exclude,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Corpus name of `path`, or `None` when the globs leave it out.
    fn document_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let name = relative.to_string_lossy().replace('\\', "/");
        (self.include.is_match(&name) && !self.exclude.is_match(&name)).then_some(name)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            bail!("Document name escapes the corpus root: {}", name);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Corpus for FsCorpus {
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        if !self.root.exists() {
            bail!("Corpus root does not exist: {}", self.root.display());
        }

        // Entries that cannot be walked or stat'ed are still listed, with
        // zero size; their read fails and the loader records them as skipped.
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(self.follow_symlinks) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to walk corpus entry");
                    if let Some(name) = e.path().and_then(|p| self.document_name(p)) {
                        docs.push(unreadable(name));
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = self.document_name(entry.path()) else {
                continue;
            };

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(document = %name, error = %e, "Failed to stat corpus entry");
                    docs.push(unreadable(name));
                    continue;
                }
            };
            let modified_at = metadata
                .modified()
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64;

            docs.push(DocumentInfo {
                name,
                size: metadata.len(),
                modified_at,
            });
        }

        docs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(docs)
    }

    async fn read_document(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn unreadable(name: String) -> DocumentInfo {
    DocumentInfo {
        name,
        size: 0,
        modified_at: 0,
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

/// In-memory corpus.
#[derive(Default)]
pub struct MemoryCorpus {
    docs: RwLock<BTreeMap<String, (i64, String)>>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub fn insert(&self, name: &str, modified_at: i64, text: &str) -> Result<()> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| anyhow::anyhow!("corpus lock poisoned"))?;
        docs.insert(name.to_string(), (modified_at, text.to_string()));
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| anyhow::anyhow!("corpus lock poisoned"))?;
        Ok(docs.remove(name).is_some())
    }
}

#[async_trait]
impl Corpus for MemoryCorpus {
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let docs = self
            .docs
            .read()
            .map_err(|_| anyhow::anyhow!("corpus lock poisoned"))?;
        Ok(docs
            .iter()
            .map(|(name, (modified_at, text))| DocumentInfo {
                name: name.clone(),
                size: text.len() as u64,
                modified_at: *modified_at,
            })
            .collect())
    }

    async fn read_document(&self, name: &str) -> Result<String> {
        let docs = self
            .docs
            .read()
            .map_err(|_| anyhow::anyhow!("corpus lock poisoned"))?;
        docs.get(name)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| anyhow::anyhow!("No such document: {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fs_config(root: &Path) -> CorpusConfig {
        CorpusConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.md".into(), "**/*.txt".into(), "**/*.json".into()],
            exclude_globs: vec!["drafts/**".into()],
            follow_symlinks: false,
            read_concurrency: 4,
        }
    }

    #[tokio::test]
    async fn test_fs_listing_is_filtered_and_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        std::fs::write(tmp.path().join("b.txt"), "bee").unwrap();
        std::fs::write(tmp.path().join("a.md"), "# A").unwrap();
        std::fs::write(tmp.path().join("a.md.meta.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("image.png"), "png").unwrap();
        std::fs::write(tmp.path().join("drafts/c.txt"), "draft").unwrap();

        let corpus = FsCorpus::new(&fs_config(tmp.path())).unwrap();
        let docs = corpus.list_documents().await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.md", "b.txt"]);
        assert_eq!(docs[1].size, 3);
        assert_eq!(corpus.read_document("b.txt").await.unwrap(), "bee");
    }

    #[tokio::test]
    async fn test_fs_rejects_escaping_names() {
        let tmp = TempDir::new().unwrap();
        let corpus = FsCorpus::new(&fs_config(tmp.path())).unwrap();
        assert!(corpus.read_document("../secret.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_fs_missing_root() {
        let corpus = FsCorpus::new(&fs_config(Path::new("/nonexistent/kb"))).unwrap();
        assert!(corpus.list_documents().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fs_dangling_symlink_is_listed_not_fatal() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "cocktail cocktail").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), tmp.path().join("dangling.txt"))
            .unwrap();

        let config = CorpusConfig {
            follow_symlinks: true,
            ..fs_config(tmp.path())
        };
        let corpus = FsCorpus::new(&config).unwrap();
        let docs = corpus.list_documents().await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["dangling.txt", "notes.txt"]);
        assert!(corpus.read_document("dangling.txt").await.is_err());
        assert_eq!(
            corpus.read_document("notes.txt").await.unwrap(),
            "cocktail cocktail"
        );
    }

    #[tokio::test]
    async fn test_memory_corpus() {
        let corpus = MemoryCorpus::new();
        corpus.insert("z.txt", 5, "zed").unwrap();
        corpus.insert("a.txt", 1, "ay").unwrap();
        let names: Vec<String> = corpus
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "z.txt"]);
        assert!(corpus.remove("a.txt").unwrap());
        assert!(corpus.read_document("a.txt").await.is_err());
    }
}
