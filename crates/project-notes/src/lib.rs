//! project-notes: keep Obsidian project notes in sync with GitHub.
//!
//! Each project note carries a `github` block in its frontmatter. A run
//! lists your repositories with the `gh` CLI, matches them to notes by
//! repository id, creates notes for new repositories from a template and
//! rewrites the `github` block of notes whose repository changed. Note
//! bodies are never touched.

pub mod config;
pub mod github;
pub mod index;
pub mod note;
pub mod reconcile;
pub mod template;
pub mod update;

// Re-export key types for convenience
pub use config::{IndexConfig, ProjectNoteConfig};
pub use github::{GhCli, Repo, RepoSource, SourceError, Visibility};
pub use index::{DuplicateId, NoteIndex, GITHUB_KEY};
pub use note::{MarkdownNote, NoteError};
pub use reconcile::{ProjectEvent, ProjectNoteInfo, ReconcileError, Reconciler, RunSummary};
pub use template::{TemplateError, Templater, DEFAULT_PROJECT_TEMPLATE};
pub use update::{update_project_notes, UpdateError};
