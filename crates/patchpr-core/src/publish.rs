//! Publish orchestration: from a pending change set to a branch or a pull
//! request.

use chrono::NaiveDateTime;
use patchpr_diff::parse;
use patchpr_github::{CreatePullRequest, GitHubApi};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builder::{Base, BuildOptions, BuiltCommit, CommitGraphBuilder, FileReport, local_now};
use crate::config::Config;
use crate::error::{Error, Result, Step};
use crate::store::{ChangeSetArtifact, ChangeSetSource, ChangeSetStore, PendingChangeSet, RepoRef};

/// Per-call publish settings.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Branch to base on and target; the configured default when `None`.
    pub base_branch: Option<String>,
    /// Stop after creating the branch.
    pub branch_only: bool,
}

/// What a publish created.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublishResult {
    /// A branch with no pull request.
    Branch {
        branch: String,
        branch_url: String,
        title: String,
        commit: String,
        files: Vec<FileReport>,
    },
    /// A branch and a pull request from it.
    #[serde(rename = "pr")]
    PullRequest {
        number: u64,
        url: String,
        branch: String,
        title: String,
        commit: String,
        files: Vec<FileReport>,
    },
}

impl PublishResult {
    /// Name of the created branch.
    #[must_use]
    pub fn branch(&self) -> &str {
        match self {
            Self::Branch { branch, .. } | Self::PullRequest { branch, .. } => branch,
        }
    }

    /// Browser URL of the branch or pull request.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Branch { branch_url, .. } => branch_url,
            Self::PullRequest { url, .. } => url,
        }
    }

    /// Per-file outcomes.
    #[must_use]
    pub fn files(&self) -> &[FileReport] {
        match self {
            Self::Branch { files, .. } | Self::PullRequest { files, .. } => files,
        }
    }
}

/// Split a commit message into a title (first line) and a body (the rest).
///
/// Both parts are trimmed.
#[must_use]
pub fn split_message(message: &str) -> (String, String) {
    let message = message.trim();
    match message.split_once('\n') {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (message.to_string(), String::new()),
    }
}

/// Publishes change sets to GitHub.
pub struct Publisher<'a, H, S>
where
    H: GitHubApi,
    S: ChangeSetStore + ?Sized,
{
    github: &'a H,
    store: &'a S,
    config: &'a Config,
    fallback: Option<&'a dyn ChangeSetSource>,
    clock: fn() -> NaiveDateTime,
}

impl<'a, H, S> Publisher<'a, H, S>
where
    H: GitHubApi,
    S: ChangeSetStore + ?Sized,
{
    /// Create a publisher.
    #[must_use]
    pub fn new(github: &'a H, store: &'a S, config: &'a Config) -> Self {
        Self {
            github,
            store,
            config,
            fallback: None,
            clock: local_now,
        }
    }

    /// Recover change sets missing from the store from `source`.
    #[must_use]
    pub fn with_fallback(mut self, source: &'a dyn ChangeSetSource) -> Self {
        self.fallback = Some(source);
        self
    }

    /// Replace the clock used for branch timestamps.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Record the change set an agent session completed with.
    ///
    /// Returns the pending change set now stored for the session.
    pub fn record_completion(
        &self,
        session_id: &str,
        artifact: ChangeSetArtifact,
    ) -> PendingChangeSet {
        let pending = artifact.into_pending(&self.config.publish.default_commit_message);
        debug!(session_id, source = %pending.source, "recorded change set");
        self.store.insert(session_id.to_string(), pending.clone());
        pending
    }

    /// Drop a session's change set.
    pub fn forget(&self, session_id: &str) -> Option<PendingChangeSet> {
        self.store.remove(session_id)
    }

    /// The change set for `session_id`, from the store or else the fallback.
    ///
    /// A recovered change set is recorded so later calls hit the store. A
    /// fallback that fails to read counts as having nothing.
    ///
    /// # Errors
    /// Returns [`Error::PendingDataMissing`] if neither has one.
    pub fn pending(&self, session_id: &str) -> Result<PendingChangeSet> {
        if let Some(change_set) = self.store.get(session_id) {
            return Ok(change_set);
        }

        let recovered = match self.fallback.map(|source| source.recover(session_id)) {
            Some(Ok(artifact)) => artifact,
            Some(Err(e)) => {
                warn!(session_id, error = %e, "could not recover change set");
                None
            }
            None => None,
        };

        recovered
            .map(|artifact| self.record_completion(session_id, artifact))
            .ok_or_else(|| Error::PendingDataMissing(session_id.to_string()))
    }

    /// Publish the change set recorded for `session_id`.
    ///
    /// The change set stays in the store afterwards.
    ///
    /// # Errors
    /// - [`Error::PendingDataMissing`] if nothing is recorded or recoverable
    ///   for the session.
    /// - [`Error::NoChangesFound`] if the recorded patch is empty.
    /// - Anything [`Publisher::publish`] returns.
    pub async fn publish_session(
        &self,
        session_id: &str,
        options: &PublishOptions,
    ) -> Result<PublishResult> {
        let change_set = self.pending(session_id)?;

        if change_set.patch.trim().is_empty() {
            return Err(Error::NoChangesFound);
        }

        self.publish(&change_set, options).await
    }

    /// Parse, build and finish one change set.
    ///
    /// # Errors
    /// - [`Error::InvalidSource`] if the source names no repository.
    /// - [`Error::NoChangesFound`] if the patch has no file changes.
    /// - Build and pull request failures.
    pub async fn publish(
        &self,
        change_set: &PendingChangeSet,
        options: &PublishOptions,
    ) -> Result<PublishResult> {
        let repo = change_set.repo()?;
        let patch = parse(&change_set.patch);
        if patch.is_empty() {
            return Err(Error::NoChangesFound);
        }

        let base_branch = options
            .base_branch
            .clone()
            .unwrap_or_else(|| self.config.publish.default_base_branch.clone());
        let base = change_set
            .base_commit_id
            .clone()
            .map_or_else(|| Base::Branch(base_branch.clone()), Base::Commit);

        let message = if change_set.commit_message.trim().is_empty() {
            self.config.publish.default_commit_message.as_str()
        } else {
            change_set.commit_message.as_str()
        };

        let built = CommitGraphBuilder::new(
            self.github,
            &repo,
            BuildOptions::from_config(&self.config.publish)?,
        )
        .with_clock(self.clock)
        .build(&base, &patch, message)
        .await?;

        self.finish(&repo, built, message, &base_branch, options.branch_only)
            .await
    }

    /// Report a built commit, opening a pull request unless `branch_only`.
    ///
    /// # Errors
    /// Returns [`Error::RemoteObjectCreationFailed`] if the pull request
    /// cannot be created.
    pub async fn finish(
        &self,
        repo: &RepoRef,
        built: BuiltCommit,
        message: &str,
        base_branch: &str,
        branch_only: bool,
    ) -> Result<PublishResult> {
        let (title, body) = split_message(message);
        let branch = built.branch.into_inner();

        if branch_only {
            let branch_url = self
                .config
                .github
                .branch_url(&repo.owner, &repo.repo, &branch);
            return Ok(PublishResult::Branch {
                branch,
                branch_url,
                title,
                commit: built.commit_sha,
                files: built.files,
            });
        }

        let body = if body.is_empty() {
            self.config.publish.default_pr_body.clone()
        } else {
            body
        };

        let pr = self
            .github
            .create_pr(
                &repo.owner,
                &repo.repo,
                CreatePullRequest {
                    title: title.clone(),
                    body,
                    head: branch.clone(),
                    base: base_branch.to_string(),
                },
            )
            .await
            .map_err(Error::remote(Step::CreatePullRequest))?;
        info!(number = pr.number, url = %pr.html_url, "opened pull request");

        Ok(PublishResult::PullRequest {
            number: pr.number,
            url: pr.html_url,
            branch,
            title,
            commit: built.commit_sha,
            files: built.files,
        })
    }
}
