//! Repository list from GitHub, fetched through the `gh` CLI.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tokio::process::Command;

/// Fields requested from `gh repo list --json`
pub const REPO_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "url",
    "visibility",
    "updatedAt",
    "nameWithOwner",
    "isPrivate",
    "isArchived",
];

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected repository list from GitHub: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

/// One GitHub repository as reported by `gh`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    /// Stable node id; survives renames and transfers
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub url: String,
    pub visibility: Visibility,
    pub updated_at: DateTime<Utc>,
    /// `owner/name`, used for logging and ignore lists only
    pub name_with_owner: String,
    pub is_private: bool,
    pub is_archived: bool,
}

impl Repo {
    /// `updated_at` in the `2024-01-31T12:00:00Z` form GitHub uses.
    pub fn updated_at_string(&self) -> String {
        self.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse and validate `gh repo list --json` output.
pub fn parse_repo_list(json: &[u8]) -> Result<Vec<Repo>, SourceError> {
    let repos: Vec<Repo> =
        serde_json::from_slice(json).map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

    for repo in &repos {
        url::Url::parse(&repo.url).map_err(|e| {
            SourceError::InvalidResponse(format!(
                "invalid url for {}: {} ({})",
                repo.name_with_owner, repo.url, e
            ))
        })?;
    }

    Ok(repos)
}

/// Where the list of repositories comes from.
///
/// Called once per run; the returned order is the order notes are processed in.
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn fetch_repos(&self, limit: usize) -> Result<Vec<Repo>, SourceError>;
}

/// Lists repositories with the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    owner: Option<String>,
}

impl Default for GhCli {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
            owner: None,
        }
    }
}

impl GhCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// List another user's or organization's repositories instead of your own.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Use a different executable (a wrapper script, or a full path to `gh`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, limit: usize) -> Vec<String> {
        let mut args = vec!["repo".to_string(), "list".to_string()];
        if let Some(owner) = &self.owner {
            args.push(owner.clone());
        }
        args.extend([
            "-L".to_string(),
            limit.to_string(),
            "--json".to_string(),
            REPO_FIELDS.join(","),
        ]);
        args
    }
}

#[async_trait]
impl RepoSource for GhCli {
    async fn fetch_repos(&self, limit: usize) -> Result<Vec<Repo>, SourceError> {
        let args = self.args(limit);
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    SourceError::CommandNotFound(self.program.clone())
                } else {
                    SourceError::Spawn {
                        command: self.program.clone(),
                        source,
                    }
                }
            })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                command: format!("{} repo list", self.program),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_repo_list(&output.stdout)
    }
}
