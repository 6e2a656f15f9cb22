//! `patchpr publish` command - Create a branch and pull request from a patch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use patchpr_core::{
    ActivityFile, ChangeSetArtifact, ChangeSetStore, FileOutcome, MemoryStore, PendingChangeSet,
    PublishOptions, PublishResult, Publisher, RepoRef,
};

use crate::commands::utils;
use crate::output;

/// Session id the CLI records its single change set under.
const CLI_SESSION: &str = "cli";

/// Where the change set comes from.
#[derive(Debug)]
pub enum Source {
    /// An agent change-set artifact.
    ChangeSet(PathBuf),
    /// A session's activity list, searched for its latest change set.
    Activities(PathBuf),
    /// A bare patch plus the metadata a change set would carry.
    Patch {
        patch: PathBuf,
        repo: String,
        message: Option<String>,
        base_commit: Option<String>,
    },
}

impl Source {
    /// Build from the mutually exclusive `publish` flags; clap guarantees
    /// one of the three shapes.
    pub fn from_args(
        change_set: Option<PathBuf>,
        activities: Option<PathBuf>,
        patch: Option<PathBuf>,
        repo: Option<String>,
        message: Option<String>,
        base_commit: Option<String>,
    ) -> Self {
        match (change_set, activities) {
            (Some(path), _) => Self::ChangeSet(path),
            (None, Some(path)) => Self::Activities(path),
            (None, None) => Self::Patch {
                patch: patch.unwrap_or_default(),
                repo: repo.unwrap_or_default(),
                message,
                base_commit,
            },
        }
    }

    /// Load the change set up front; `None` for sources the publisher
    /// recovers itself.
    fn load(self, default_message: &str) -> Result<Option<PendingChangeSet>> {
        match self {
            Self::ChangeSet(path) => {
                let text = utils::read_input(&path)?;
                let artifact = ChangeSetArtifact::from_json(&text)
                    .with_context(|| format!("{} is not a change set", path.display()))?;
                Ok(Some(artifact.into_pending(default_message)))
            }
            Self::Activities(_) => Ok(None),
            Self::Patch {
                patch,
                repo,
                message,
                base_commit,
            } => Ok(Some(PendingChangeSet {
                source: repo,
                patch: utils::read_input(&patch)?,
                commit_message: message.unwrap_or_else(|| default_message.to_string()),
                base_commit_id: base_commit,
            })),
        }
    }
}

/// Run the publish command.
pub fn run(
    config_path: Option<&Path>,
    source: Source,
    base: Option<String>,
    branch_only: bool,
    json: bool,
) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let activities = match &source {
        Source::Activities(path) => Some(ActivityFile::new(path)),
        _ => None,
    };

    let store = MemoryStore::new();
    if let Some(pending) = source.load(&config.publish.default_commit_message)? {
        pending.repo()?;
        store.insert(CLI_SESSION.to_string(), pending);
    }

    let client = utils::github_client(&config)?;
    let mut publisher = Publisher::new(&client, &store, &config);
    if let Some(activities) = &activities {
        publisher = publisher.with_fallback(activities);
    }
    let pending = match &activities {
        Some(_) => publisher
            .pending(CLI_SESSION)
            .context("No change set found in the activity list")?,
        None => publisher.pending(CLI_SESSION)?,
    };
    let repo: RepoRef = pending.repo()?;

    let options = PublishOptions {
        base_branch: base,
        branch_only,
    };

    if !json {
        output::info(&format!("Publishing to {repo}..."));
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(publisher.publish_session(CLI_SESSION, &options))?;

    if json {
        output::essential(&serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

fn print_result(result: &PublishResult) {
    for file in result.files() {
        match &file.outcome {
            FileOutcome::Recreated { reason } => output::warn(&format!(
                "{}: base content unavailable ({reason}), wrote added lines only",
                file.path
            )),
            outcome => output::detail(&format!(
                "  {} {}",
                output::outcome_label(outcome),
                file.path
            )),
        }
    }

    match result {
        PublishResult::Branch { branch, .. } => {
            output::success(&format!("Created branch {branch}"));
        }
        PublishResult::PullRequest { number, branch, .. } => {
            output::success(&format!("Created branch {branch}"));
            output::success(&format!("Opened pull request #{number}"));
        }
    }
    output::essential(result.url());
}
