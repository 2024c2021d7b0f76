use chrono::Utc;

use crate::config::ProjectNoteConfig;
use crate::github::{RepoSource, SourceError};
use crate::index::NoteIndex;
use crate::reconcile::{log_event, ProjectEvent, ReconcileError, Reconciler, RunSummary};
use crate::template::Templater;

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to scan project notes: {0}")]
    Scan(#[source] std::io::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Bring every project note in `config.project_note_dir` up to date with
/// the repositories `source` reports.
///
/// Settings from the folder's `Index.md` are merged into `config` first.
/// Each outcome is logged as it happens and all of them are returned.
pub async fn update_project_notes(
    config: ProjectNoteConfig,
    source: &dyn RepoSource,
    template: Templater,
) -> Result<Vec<ProjectEvent>, UpdateError> {
    let config = config.resolve_from_index().await;

    tracing::info!("Fetching projects from GitHub...");
    let repos = source.fetch_repos(config.repo_limit).await?;
    tracing::info!("Found {} repositories", repos.len());

    let index = NoteIndex::build(&config.project_note_dir)
        .await
        .map_err(UpdateError::Scan)?;
    tracing::info!(
        "Found {} existing project note(s) in {}",
        index.len(),
        config.project_note_dir.display()
    );

    let reconciler = Reconciler::new(config, template);
    let events = reconciler
        .reconcile(&repos, &index, Utc::now(), log_event)
        .await?;

    tracing::info!("Done! {}", RunSummary::from_events(&events));
    Ok(events)
}
