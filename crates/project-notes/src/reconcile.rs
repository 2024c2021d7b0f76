//! Decide, per repository, whether its project note is created, updated or
//! left alone.
//!
//! The engine never prints. Every decision comes back as a [`ProjectEvent`]
//! so callers choose how (and whether) to report it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use obsidian_fs::{merge_at_path, note_path, Frontmatter, YamlValue};
use serde::{Deserialize, Serialize};

use crate::config::ProjectNoteConfig;
use crate::github::Repo;
use crate::index::{NoteIndex, GITHUB_KEY};
use crate::note::{MarkdownNote, NoteError};
use crate::template::{TemplateError, Templater};

/// Key of the timestamp that changes on every write and is never compared.
pub const NOTE_LAST_UPDATED: &str = "noteLastUpdated";

/// Description used when a repository has none.
pub const FALLBACK_DESCRIPTION: &str = "Note template for a project from GitHub";

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Note(#[from] NoteError),

    #[error("Could not render note for {repo}: {source}")]
    Template {
        repo: String,
        #[source]
        source: TemplateError,
    },

    #[error("Could not serialize project info: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// What a project note's `github` frontmatter records about its repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNoteInfo {
    pub id: String,
    pub name: String,
    pub name_with_owner: String,
    pub url: String,
    pub is_private: bool,
    pub is_archived: bool,
    pub last_updated: String,
    pub note_last_updated: String,
}

impl ProjectNoteInfo {
    pub fn from_repo(repo: &Repo, now: DateTime<Utc>) -> Self {
        Self {
            id: repo.id.clone(),
            name: repo.name.clone(),
            name_with_owner: repo.name_with_owner.clone(),
            url: repo.url.clone(),
            is_private: repo.is_private,
            is_archived: repo.is_archived,
            last_updated: repo.updated_at_string(),
            note_last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Whether the tracked info in a note matches freshly computed info,
/// ignoring [`NOTE_LAST_UPDATED`] on both sides. Missing info never matches.
pub fn tracked_info_matches(current: Option<&YamlValue>, candidate: &YamlValue) -> bool {
    match current {
        Some(current) => without_volatile(current) == without_volatile(candidate),
        None => false,
    }
}

fn without_volatile(value: &YamlValue) -> YamlValue {
    let mut value = value.clone();
    if let YamlValue::Mapping(map) = &mut value {
        map.remove(NOTE_LAST_UPDATED);
    }
    value
}

/// The outcome for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    /// Listed in the ignore list; nothing was read or written
    Skipped { repo: String },
    /// No note tracked the repository, so one was written
    Created { repo: String, path: PathBuf },
    /// The tracked info was stale and has been rewritten
    Updated { repo: String, path: PathBuf },
    /// The tracked info was current; the note was not touched
    Unchanged { repo: String, path: PathBuf },
    /// A new note was due but an untracked file already sits at its path
    Conflict { repo: String, path: PathBuf },
}

impl ProjectEvent {
    /// `owner/name` of the repository this event is about.
    pub fn repo(&self) -> &str {
        match self {
            ProjectEvent::Skipped { repo }
            | ProjectEvent::Created { repo, .. }
            | ProjectEvent::Updated { repo, .. }
            | ProjectEvent::Unchanged { repo, .. }
            | ProjectEvent::Conflict { repo, .. } => repo,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ProjectEvent::Skipped { .. } => None,
            ProjectEvent::Created { path, .. }
            | ProjectEvent::Updated { path, .. }
            | ProjectEvent::Unchanged { path, .. }
            | ProjectEvent::Conflict { path, .. } => Some(path),
        }
    }

    /// Whether a note was written for this event.
    pub fn wrote_note(&self) -> bool {
        matches!(self, ProjectEvent::Created { .. } | ProjectEvent::Updated { .. })
    }
}

/// Counts of each outcome in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub skipped: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub conflicts: usize,
}

impl RunSummary {
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ProjectEvent>) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.record(event);
        }
        summary
    }

    pub fn record(&mut self, event: &ProjectEvent) {
        match event {
            ProjectEvent::Skipped { .. } => self.skipped += 1,
            ProjectEvent::Created { .. } => self.created += 1,
            ProjectEvent::Updated { .. } => self.updated += 1,
            ProjectEvent::Unchanged { .. } => self.unchanged += 1,
            ProjectEvent::Conflict { .. } => self.conflicts += 1,
        }
    }

    pub fn writes(&self) -> usize {
        self.created + self.updated
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} skipped",
            self.created, self.updated, self.unchanged, self.skipped
        )?;
        if self.conflicts > 0 {
            write!(f, ", {} conflict(s)", self.conflicts)?;
        }
        Ok(())
    }
}

/// Matches repositories to project notes and brings the notes up to date.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ProjectNoteConfig,
    template: Templater,
}

impl Reconciler {
    pub fn new(config: ProjectNoteConfig, template: Templater) -> Self {
        Self { config, template }
    }

    /// Reconcile every repository in order, stopping at the first error.
    ///
    /// `on_event` sees each outcome as soon as it is decided, so events
    /// before a failure are still reported.
    pub async fn reconcile<F>(
        &self,
        repos: &[Repo],
        index: &NoteIndex,
        now: DateTime<Utc>,
        mut on_event: F,
    ) -> Result<Vec<ProjectEvent>, ReconcileError>
    where
        F: FnMut(&ProjectEvent),
    {
        let mut events = Vec::with_capacity(repos.len());
        for repo in repos {
            let event = self.reconcile_repo(repo, index, now).await?;
            on_event(&event);
            events.push(event);
        }
        Ok(events)
    }

    /// Reconcile a single repository.
    pub async fn reconcile_repo(
        &self,
        repo: &Repo,
        index: &NoteIndex,
        now: DateTime<Utc>,
    ) -> Result<ProjectEvent, ReconcileError> {
        if self.config.is_ignored(&repo.name_with_owner) {
            return Ok(ProjectEvent::Skipped {
                repo: repo.name_with_owner.clone(),
            });
        }

        let info = ProjectNoteInfo::from_repo(repo, now);

        match index.get(&repo.id) {
            Some(path) => self.update_note(repo, path, &info).await,
            None => self.create_note(repo, &info).await,
        }
    }

    async fn update_note(
        &self,
        repo: &Repo,
        path: &Path,
        info: &ProjectNoteInfo,
    ) -> Result<ProjectEvent, ReconcileError> {
        let mut note = MarkdownNote::load(path).await?;
        let candidate = serde_yaml::to_value(info)?;

        let current = note.frontmatter().and_then(|fm| fm.get(GITHUB_KEY));
        if tracked_info_matches(current, &candidate) {
            return Ok(ProjectEvent::Unchanged {
                repo: repo.name_with_owner.clone(),
                path: path.to_path_buf(),
            });
        }

        note.update_frontmatter(|mut frontmatter| {
            merge_at_path(&mut frontmatter, &[GITHUB_KEY], candidate);
            Some(frontmatter)
        });
        note.save().await?;

        Ok(ProjectEvent::Updated {
            repo: repo.name_with_owner.clone(),
            path: path.to_path_buf(),
        })
    }

    async fn create_note(
        &self,
        repo: &Repo,
        info: &ProjectNoteInfo,
    ) -> Result<ProjectEvent, ReconcileError> {
        let path = note_path(&self.config.project_note_dir, &repo.name);

        let description = if repo.description.is_empty() {
            FALLBACK_DESCRIPTION
        } else {
            repo.description.as_str()
        };
        let vars = HashMap::from([
            ("name".to_string(), repo.name.clone()),
            ("description".to_string(), description.to_string()),
        ]);
        let body = self
            .template
            .render(&vars)
            .map_err(|source| ReconcileError::Template {
                repo: repo.name_with_owner.clone(),
                source,
            })?;

        let mut frontmatter = Frontmatter::new();
        frontmatter.insert(GITHUB_KEY.into(), serde_yaml::to_value(info)?);

        let note = MarkdownNote::new(&path, Some(frontmatter), body);
        match note.create().await {
            Ok(()) => Ok(ProjectEvent::Created {
                repo: repo.name_with_owner.clone(),
                path,
            }),
            Err(NoteError::AlreadyExists(path)) => Ok(ProjectEvent::Conflict {
                repo: repo.name_with_owner.clone(),
                path,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Report an event through `tracing`.
pub fn log_event(event: &ProjectEvent) {
    match event {
        ProjectEvent::Skipped { repo } => tracing::info!("Skipping {}", repo),
        ProjectEvent::Created { repo, path } => {
            tracing::info!("No notes found for {}. Created {}", repo, path.display())
        }
        ProjectEvent::Updated { repo, path } => {
            tracing::info!("Existing notes updated for {} ({})", repo, path.display())
        }
        ProjectEvent::Unchanged { repo, .. } => tracing::info!("No updates for {}", repo),
        ProjectEvent::Conflict { repo, path } => tracing::warn!(
            "{} already exists but does not track {}; leaving it alone",
            path.display(),
            repo
        ),
    }
}
