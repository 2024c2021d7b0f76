use std::collections::HashMap;
use std::path::{Path, PathBuf};

use obsidian_fs::{get_at_path, is_hidden, is_markdown_file};
use tokio::fs;

use crate::note::MarkdownNote;

/// Frontmatter key owned by this tool.
pub const GITHUB_KEY: &str = "github";

/// Two notes that claim the same repository id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub id: String,
    /// The note the index now points at (later in scan order)
    pub kept: PathBuf,
    pub discarded: PathBuf,
}

/// Maps GitHub repository ids to the project notes tracking them.
///
/// Built fresh on every run by reading each note's `github.id`.
#[derive(Debug, Default)]
pub struct NoteIndex {
    notes: HashMap<String, PathBuf>,
    duplicates: Vec<DuplicateId>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` recursively and index every note with a `github.id`.
    ///
    /// Notes that cannot be read or parsed are logged and skipped. A missing
    /// root produces an empty index.
    pub async fn build(root: &Path) -> Result<Self, std::io::Error> {
        let mut index = Self::new();

        if !fs::try_exists(root).await? {
            tracing::debug!("Project folder {} does not exist yet", root.display());
            return Ok(index);
        }

        let mut files = get_all_markdown_files(root).await?;
        files.sort();
        tracing::debug!("Found {} markdown files in {}", files.len(), root.display());

        for file_path in files {
            match note_repo_id(&file_path).await {
                Ok(Some(id)) => index.insert(id, file_path),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping {}: {}", file_path.display(), e),
            }
        }

        for duplicate in &index.duplicates {
            tracing::warn!(
                "Both {} and {} track repo {}; using {}",
                duplicate.discarded.display(),
                duplicate.kept.display(),
                duplicate.id,
                duplicate.kept.display()
            );
        }

        Ok(index)
    }

    /// Record a note for `id`. A later insert for the same id wins and the
    /// collision is remembered in [`duplicates`](Self::duplicates).
    pub fn insert(&mut self, id: String, path: PathBuf) {
        if let Some(previous) = self.notes.insert(id.clone(), path.clone()) {
            if previous != path {
                self.duplicates.push(DuplicateId {
                    id,
                    kept: path,
                    discarded: previous,
                });
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Path> {
        self.notes.get(id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.notes.iter().map(|(id, path)| (id.as_str(), path.as_path()))
    }

    pub fn duplicates(&self) -> &[DuplicateId] {
        &self.duplicates
    }
}

/// Read the repository id a note tracks, if any.
async fn note_repo_id(path: &Path) -> Result<Option<String>, crate::note::NoteError> {
    let note = MarkdownNote::load(path).await?;
    Ok(note
        .frontmatter()
        .and_then(|fm| get_at_path(fm, &[GITHUB_KEY, "id"]))
        .and_then(|id| id.as_str())
        .map(str::to_string))
}

/// Recursively get all markdown files in a directory.
///
/// Only a failure to read `dir` itself is an error; subdirectories that
/// cannot be read are logged and left out.
async fn get_all_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_name = entry.file_name();

        // Skip hidden directories (.obsidian, .git, .trash, etc.)
        if is_hidden(&file_name.to_string_lossy()) {
            continue;
        }

        let file_type = entry.file_type().await?;
        if file_type.is_dir() {
            match Box::pin(get_all_markdown_files(&path)).await {
                Ok(sub_files) => files.extend(sub_files),
                Err(e) => tracing::warn!("Skipping folder {}: {}", path.display(), e),
            }
        } else if file_type.is_file() && is_markdown_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}
