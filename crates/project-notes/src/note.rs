//! A markdown note on disk: optional frontmatter plus body text.

use std::path::{Path, PathBuf};

use obsidian_fs::{build_note_with_frontmatter, parse_frontmatter, Frontmatter, FrontmatterError};
use rand::Rng;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("Note not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Note already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Invalid frontmatter in {}: {source}", .path.display())]
    InvalidFrontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NoteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            NoteError::NotFound(path.to_path_buf())
        } else {
            NoteError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// One note, held in memory for a single load-mutate-save cycle.
///
/// Only the frontmatter is meant to be rewritten; the body is carried
/// through byte-for-byte unless a caller replaces it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownNote {
    path: PathBuf,
    frontmatter: Option<Frontmatter>,
    body: String,
}

impl MarkdownNote {
    /// A note that only exists in memory until [`save`](Self::save) or
    /// [`create`](Self::create) is called.
    pub fn new(
        path: impl Into<PathBuf>,
        frontmatter: Option<Frontmatter>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            frontmatter,
            body: body.into(),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, NoteError> {
        let path = path.into();
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|e| NoteError::io(&path, e))?;

        let parsed = parse_frontmatter(&raw).map_err(|source| NoteError::InvalidFrontmatter {
            path: path.clone(),
            source,
        })?;
        let body = parsed.content.to_string();

        Ok(Self {
            path,
            frontmatter: parsed.frontmatter,
            body,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frontmatter(&self) -> Option<&Frontmatter> {
        self.frontmatter.as_ref()
    }

    pub fn set_frontmatter(&mut self, frontmatter: Option<Frontmatter>) {
        self.frontmatter = frontmatter;
    }

    /// Transform the frontmatter. An absent block is handed to `update_fn`
    /// as an empty map; returning `None` removes the block.
    pub fn update_frontmatter<F>(&mut self, update_fn: F)
    where
        F: FnOnce(Frontmatter) -> Option<Frontmatter>,
    {
        let current = self.frontmatter.take().unwrap_or_default();
        self.frontmatter = update_fn(current);
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn update_body<F>(&mut self, update_fn: F)
    where
        F: FnOnce(&str) -> String,
    {
        self.body = update_fn(&self.body);
    }

    /// Render the note as it will be written to disk.
    pub fn to_markdown(&self) -> Result<String, NoteError> {
        build_note_with_frontmatter(self.frontmatter.as_ref(), &self.body).map_err(|source| {
            NoteError::InvalidFrontmatter {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Write the note, replacing whatever is at its path.
    pub async fn save(&self) -> Result<(), NoteError> {
        let content = self.to_markdown()?;
        self.ensure_parent().await?;
        atomic_write(&self.path, &content)
            .await
            .map_err(|e| NoteError::io(&self.path, e))
    }

    /// Write a brand-new note. Fails if something already exists at the path.
    pub async fn create(&self) -> Result<(), NoteError> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| NoteError::io(&self.path, e))?;
        if exists {
            return Err(NoteError::AlreadyExists(self.path.clone()));
        }
        self.save().await
    }

    async fn ensure_parent(&self) -> Result<(), NoteError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .await
                .map_err(|e| NoteError::io(parent, e)),
            _ => Ok(()),
        }
    }
}

/// Generate a random hex string for temp file names.
fn random_hex() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    hex::encode(bytes)
}

/// Atomic write using temp file + rename.
///
/// The note is either fully written or not modified at all.
async fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let temp_path = path.with_extension(format!("{}.tmp", random_hex()));

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use obsidian_fs::YamlValue;
    use tempfile::TempDir;

    fn frontmatter(yaml: &str) -> Frontmatter {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn load_splits_frontmatter_and_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "---\ntitle: Test\n---\n# Body\n").await.unwrap();

        let note = MarkdownNote::load(&path).await.unwrap();
        assert_eq!(note.frontmatter(), Some(&frontmatter("title: Test")));
        assert_eq!(note.body(), "# Body\n");
        assert_eq!(note.path(), path);
    }

    #[tokio::test]
    async fn load_plain_note_has_no_frontmatter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.md");
        fs::write(&path, "Just text\n").await.unwrap();

        let note = MarkdownNote::load(&path).await.unwrap();
        assert!(note.frontmatter().is_none());
        assert_eq!(note.body(), "Just text\n");
    }

    #[tokio::test]
    async fn load_missing_note_is_not_found() {
        let dir = TempDir::new().unwrap();
        let result = MarkdownNote::load(dir.path().join("missing.md")).await;
        assert!(matches!(result, Err(NoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn load_invalid_frontmatter_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        fs::write(&path, "---\nkey: [unclosed\n---\nBody").await.unwrap();

        let result = MarkdownNote::load(&path).await;
        assert!(matches!(result, Err(NoteError::InvalidFrontmatter { .. })));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("round.md");
        let fm = frontmatter("tags: [project, rust]\ngithub:\n  id: R_1\n  isArchived: false\n");
        let body = "\n# Title\n\nSome text with --- inside.\n";

        MarkdownNote::new(&path, Some(fm.clone()), body).save().await.unwrap();
        let loaded = MarkdownNote::load(&path).await.unwrap();

        assert_eq!(loaded.frontmatter(), Some(&fm));
        assert_eq!(loaded.body(), body);
    }

    #[tokio::test]
    async fn empty_frontmatter_stays_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.md");

        MarkdownNote::new(&path, Some(Frontmatter::new()), "Body").save().await.unwrap();
        let loaded = MarkdownNote::load(&path).await.unwrap();

        assert_eq!(loaded.frontmatter(), Some(&Frontmatter::new()));
        assert_eq!(loaded.body(), "Body");
    }

    #[tokio::test]
    async fn save_without_frontmatter_writes_only_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.md");

        MarkdownNote::new(&path, None, "Only body").save().await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "Only body");
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/nested.md");

        MarkdownNote::new(&path, None, "x").save().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        MarkdownNote::new(&path, None, "x").save().await.unwrap();

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["note.md"]);
    }

    #[tokio::test]
    async fn create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.md");
        fs::write(&path, "user content").await.unwrap();

        let result = MarkdownNote::new(&path, None, "new").create().await;
        assert!(matches!(result, Err(NoteError::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "user content");
    }

    #[tokio::test]
    async fn update_frontmatter_preserves_body_and_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        fs::write(&path, "---\ntitle: Keep\n---\nBody stays\n").await.unwrap();

        let mut note = MarkdownNote::load(&path).await.unwrap();
        note.update_frontmatter(|mut fm| {
            fm.insert("github".into(), YamlValue::Mapping(frontmatter("id: R_1")));
            Some(fm)
        });
        note.save().await.unwrap();

        let loaded = MarkdownNote::load(&path).await.unwrap();
        assert_eq!(
            loaded.frontmatter(),
            Some(&frontmatter("title: Keep\ngithub:\n  id: R_1\n"))
        );
        assert_eq!(loaded.body(), "Body stays\n");
    }

    #[test]
    fn update_frontmatter_on_plain_note_starts_empty() {
        let mut note = MarkdownNote::new("x.md", None, "");
        note.update_frontmatter(|fm| {
            assert!(fm.is_empty());
            Some(fm)
        });
        assert_eq!(note.frontmatter(), Some(&Frontmatter::new()));

        note.update_frontmatter(|_| None);
        assert!(note.frontmatter().is_none());
    }

    #[test]
    fn body_accessors() {
        let mut note = MarkdownNote::new("x.md", None, "one");
        note.set_body("two");
        note.update_body(|body| format!("{body} three"));
        assert_eq!(note.body(), "two three");

        note.set_frontmatter(Some(Frontmatter::new()));
        assert_eq!(note.to_markdown().unwrap(), "---\n{}\n---\ntwo three");
    }
}
