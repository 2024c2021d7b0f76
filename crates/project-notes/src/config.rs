use std::path::PathBuf;

use obsidian_fs::{Frontmatter, YamlValue};
use serde::Deserialize;

use crate::note::{MarkdownNote, NoteError};

/// Name of the note inside the project folder that can carry configuration.
pub const INDEX_NOTE: &str = "Index.md";

/// Default number of repositories requested from GitHub.
pub const DEFAULT_REPO_LIMIT: usize = 200;

/// Default project folder, relative to the working directory.
pub const DEFAULT_PROJECT_NOTE_DIR: &str = "Programming/Projects";

/// Expand ~ or ~/ prefix to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

/// Settings for one update run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNoteConfig {
    /// Folder holding the project notes
    pub project_note_dir: PathBuf,
    /// Maximum number of repositories to fetch
    pub repo_limit: usize,
    /// `owner/name` of repositories that never get a note
    pub ignore_repos: Vec<String>,
}

impl ProjectNoteConfig {
    pub fn new(project_note_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_note_dir: project_note_dir.into(),
            repo_limit: DEFAULT_REPO_LIMIT,
            ignore_repos: Vec::new(),
        }
    }

    pub fn with_repo_limit(mut self, repo_limit: usize) -> Self {
        self.repo_limit = repo_limit;
        self
    }

    pub fn with_ignore_repos(mut self, ignore_repos: impl IntoIterator<Item = String>) -> Self {
        self.ignore_repos.extend(ignore_repos);
        self
    }

    pub fn index_note_path(&self) -> PathBuf {
        self.project_note_dir.join(INDEX_NOTE)
    }

    pub fn is_ignored(&self, name_with_owner: &str) -> bool {
        self.ignore_repos.iter().any(|name| name == name_with_owner)
    }

    /// Extend this config with settings from the folder's `Index.md`.
    ///
    /// Never fails: a missing, unreadable or malformed index note is logged
    /// and the config is returned as it was.
    pub async fn resolve_from_index(mut self) -> Self {
        let path = self.index_note_path();
        let index = match MarkdownNote::load(&path).await {
            Ok(note) => note,
            Err(NoteError::NotFound(_)) => {
                tracing::warn!("No index note to get configuration from");
                return self;
            }
            Err(e) => {
                tracing::warn!("Could not read index note: {}", e);
                return self;
            }
        };

        let Some(frontmatter) = index.frontmatter() else {
            tracing::warn!("Index frontmatter does not have configuration");
            return self;
        };

        let index_config = match IndexConfig::from_frontmatter(frontmatter) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Could not parse config from index frontmatter: {}", e);
                return self;
            }
        };

        if let Some(ignore_repos) = index_config.ignore_repos {
            tracing::debug!("Ignoring {} repo(s) listed in {}", ignore_repos.len(), path.display());
            self.ignore_repos.extend(ignore_repos);
        }
        self
    }
}

/// Configuration recognized in the index note's frontmatter.
///
/// ```yaml
/// ignore_repos:
///   - me/dotfiles
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexConfig {
    pub ignore_repos: Option<Vec<String>>,
}

impl IndexConfig {
    /// Validate frontmatter against the expected shape. Unrelated keys are allowed.
    pub fn from_frontmatter(frontmatter: &Frontmatter) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_value(YamlValue::Mapping(frontmatter.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn config_with_index(index: Option<&str>) -> (TempDir, ProjectNoteConfig) {
        let dir = TempDir::new().unwrap();
        if let Some(content) = index {
            fs::write(dir.path().join(INDEX_NOTE), content).await.unwrap();
        }
        let config = ProjectNoteConfig::new(dir.path()).with_ignore_repos(["me/cli".to_string()]);
        (dir, config)
    }

    #[tokio::test]
    async fn appends_index_ignore_list() {
        let (_dir, config) = config_with_index(Some(
            "---\nignore_repos:\n  - me/dotfiles\n  - me/cli\ntitle: Projects\n---\n# Projects\n",
        ))
        .await;

        let resolved = config.resolve_from_index().await;
        assert_eq!(resolved.ignore_repos, vec!["me/cli", "me/dotfiles", "me/cli"]);
        assert!(resolved.is_ignored("me/dotfiles"));
        assert!(resolved.is_ignored("me/cli"));
        assert!(!resolved.is_ignored("me/other"));
    }

    #[tokio::test]
    async fn missing_index_leaves_config_unchanged() {
        let (_dir, config) = config_with_index(None).await;
        let resolved = config.clone().resolve_from_index().await;
        assert_eq!(resolved, config);
    }

    #[tokio::test]
    async fn index_without_frontmatter_leaves_config_unchanged() {
        let (_dir, config) = config_with_index(Some("# Projects\n")).await;
        let resolved = config.clone().resolve_from_index().await;
        assert_eq!(resolved, config);
    }

    #[tokio::test]
    async fn index_with_wrong_shape_leaves_config_unchanged() {
        let (_dir, config) = config_with_index(Some("---\nignore_repos: me/foo\n---\n")).await;
        let resolved = config.clone().resolve_from_index().await;
        assert_eq!(resolved, config);
    }

    #[tokio::test]
    async fn index_with_broken_yaml_leaves_config_unchanged() {
        let (_dir, config) = config_with_index(Some("---\nignore_repos: [\n---\n")).await;
        let resolved = config.clone().resolve_from_index().await;
        assert_eq!(resolved, config);
    }

    #[tokio::test]
    async fn index_without_ignore_list_leaves_config_unchanged() {
        let (_dir, config) = config_with_index(Some("---\ntags: [index]\n---\n")).await;
        let resolved = config.clone().resolve_from_index().await;
        assert_eq!(resolved, config);
    }

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("Programming/Projects"), PathBuf::from("Programming/Projects"));
        assert_eq!(expand_tilde("/abs/~/x"), PathBuf::from("/abs/~/x"));
    }

    #[test]
    fn expand_tilde_uses_home_dir() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/Vault"), home.join("Vault"));
        }
    }

    #[test]
    fn defaults() {
        let config = ProjectNoteConfig::new(DEFAULT_PROJECT_NOTE_DIR);
        assert_eq!(config.repo_limit, 200);
        assert!(config.ignore_repos.is_empty());
        assert_eq!(
            config.index_note_path(),
            PathBuf::from("Programming/Projects/Index.md")
        );
    }
}
