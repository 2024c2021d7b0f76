//! project-notes: update Obsidian project notes from your GitHub repositories.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use project_notes::config::{expand_tilde, DEFAULT_PROJECT_NOTE_DIR, DEFAULT_REPO_LIMIT};
use project_notes::{
    update_project_notes, GhCli, ProjectNoteConfig, Templater, UpdateError,
    DEFAULT_PROJECT_TEMPLATE,
};

#[derive(Parser, Debug)]
#[command(name = "project-notes", version)]
#[command(about = "Keep Obsidian project notes in sync with GitHub")]
struct Args {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update project notes based on GitHub repositories
    UpdateProjects {
        /// Project note directory (supports ~ for home directory)
        #[arg(
            short = 'p',
            long = "project-dir",
            env = "PROJECT_NOTE_DIR",
            default_value = DEFAULT_PROJECT_NOTE_DIR
        )]
        project_dir: String,

        /// Maximum number of repos to check
        #[arg(short = 'L', long, default_value_t = DEFAULT_REPO_LIMIT)]
        limit: usize,

        /// Repo to leave alone, as owner/name (repeatable)
        #[arg(short, long = "ignore", value_name = "OWNER/NAME")]
        ignore: Vec<String>,

        /// List another user's or organization's repos
        #[arg(long)]
        owner: Option<String>,

        /// Template for new notes (defaults to the bundled one)
        #[arg(long)]
        template: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "info,project_notes=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Command::UpdateProjects {
            project_dir,
            limit,
            ignore,
            owner,
            template,
        } => {
            let config = ProjectNoteConfig::new(expand_tilde(&project_dir))
                .with_repo_limit(limit)
                .with_ignore_repos(ignore);

            let template = match template {
                Some(path) => Templater::load(&path)
                    .await
                    .with_context(|| format!("Failed to load template {}", path.display()))?,
                None => Templater::new(DEFAULT_PROJECT_TEMPLATE),
            };

            let mut source = GhCli::new();
            if let Some(owner) = owner {
                source = source.with_owner(owner);
            }

            match update_project_notes(config, &source, template).await {
                Ok(_) => Ok(()),
                // Expected failures get a message, not a backtrace
                Err(UpdateError::Source(e)) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
