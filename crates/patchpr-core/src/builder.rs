//! Commit graph builder.
//!
//! Turns a parsed patch into git objects on GitHub: one blob per surviving
//! file, a tree layered on the base tree, a commit on top of the base commit,
//! and a fresh timestamped branch pointing at it.

use chrono::{Local, NaiveDateTime, TimeDelta};
use futures::future::try_join_all;
use patchpr_diff::{ApplyMode, FileChange, ParsedPatch, apply_with};
use patchpr_github::{CreateCommit, CreateRef, CreateTree, GitHubApi, TreeEntry};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::branch_name::BranchName;
use crate::config::PublishConfig;
use crate::error::{Error, Result, Step};
use crate::store::RepoRef;

/// Where the new commit is rooted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    /// A known commit SHA.
    Commit(String),
    /// The current head of a branch.
    Branch(String),
}

/// What happened to a file in the built commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// New file, written from the patch alone.
    Created,
    /// Hunks replayed on the base content.
    Modified,
    /// Removed from the tree.
    Deleted,
    /// Marked modified, but the base content could not be read, so the file
    /// was written from the patch's added lines only.
    Recreated { reason: String },
}

/// Per-file report of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Objects created by [`CommitGraphBuilder::build`].
#[derive(Debug, Clone, Serialize)]
pub struct BuiltCommit {
    pub base_sha: String,
    pub tree_sha: String,
    pub commit_sha: String,
    pub branch: BranchName,
    pub files: Vec<FileReport>,
}

/// Knobs for a build, usually taken from [`PublishConfig`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub branch_prefix: BranchName,
    pub mode: ApplyMode,
    pub max_branch_attempts: u32,
}

impl BuildOptions {
    /// Options from the `[publish]` config section.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBranchName`] if the prefix is invalid.
    pub fn from_config(config: &PublishConfig) -> Result<Self> {
        Ok(Self {
            branch_prefix: config.branch_prefix()?,
            mode: config.apply_mode(),
            max_branch_attempts: config.max_branch_attempts.max(1),
        })
    }
}

/// Base content of a modified file.
enum BaseContent {
    Found(String),
    Absent,
    Unavailable(String),
}

/// A file whose final content (or deletion) is decided.
struct PlannedFile<'p> {
    path: &'p str,
    /// `None` for deletions.
    content: Option<String>,
    outcome: FileOutcome,
}

/// Local wall-clock time, used for branch names.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Builds the blob → tree → commit → ref chain for one patch.
pub struct CommitGraphBuilder<'a, H: GitHubApi> {
    github: &'a H,
    repo: &'a RepoRef,
    options: BuildOptions,
    clock: fn() -> NaiveDateTime,
}

impl<'a, H: GitHubApi> CommitGraphBuilder<'a, H> {
    /// Create a builder for `repo`.
    #[must_use]
    pub fn new(github: &'a H, repo: &'a RepoRef, options: BuildOptions) -> Self {
        Self {
            github,
            repo,
            options,
            clock: local_now,
        }
    }

    /// Replace the clock used for branch timestamps.
    #[must_use]
    pub const fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Create the commit graph for `patch` on top of `base`.
    ///
    /// Nothing is rolled back on failure; objects created before the failing
    /// step stay on GitHub unreferenced.
    ///
    /// # Errors
    /// - [`Error::NoChangesFound`] for an empty patch, before any remote call.
    /// - [`Error::PatchMismatch`] in strict mode.
    /// - [`Error::RemoteObjectCreationFailed`] when a GitHub call fails.
    pub async fn build(&self, base: &Base, patch: &ParsedPatch, message: &str) -> Result<BuiltCommit> {
        if patch.is_empty() {
            return Err(Error::NoChangesFound);
        }
        for diagnostic in patch.diagnostics() {
            debug!(line = diagnostic.line, kind = ?diagnostic.kind, "patch diagnostic");
        }

        let (owner, repo) = (self.repo.owner.as_str(), self.repo.repo.as_str());

        let base_sha = match base {
            Base::Commit(sha) => sha.clone(),
            Base::Branch(name) => self
                .github
                .get_branch_head(owner, repo, name)
                .await
                .map_err(Error::remote(Step::ResolveBase))?,
        };
        let base_commit = self
            .github
            .get_commit(owner, repo, &base_sha)
            .await
            .map_err(Error::remote(Step::ResolveTree))?;
        debug!(base = %base_sha, tree = %base_commit.tree_sha, "resolved base");

        let mut planned = Vec::with_capacity(patch.len());
        for (path, change) in patch.iter() {
            planned.push(self.plan_file(&base_sha, path, change).await?);
        }

        let entries = self.create_blobs(&planned).await?;

        let tree_sha = self
            .github
            .create_tree(
                owner,
                repo,
                CreateTree {
                    base_tree: base_commit.tree_sha,
                    tree: entries,
                },
            )
            .await
            .map_err(Error::remote(Step::CreateTree))?;
        debug!(tree = %tree_sha, "created tree");

        let commit_sha = self
            .github
            .create_commit(
                owner,
                repo,
                CreateCommit {
                    message: message.to_string(),
                    tree: tree_sha.clone(),
                    parents: vec![base_sha.clone()],
                },
            )
            .await
            .map_err(Error::remote(Step::CreateCommit))?;
        debug!(commit = %commit_sha, "created commit");

        let branch = self.create_branch(&commit_sha).await?;

        Ok(BuiltCommit {
            base_sha,
            tree_sha,
            commit_sha,
            branch,
            files: planned
                .into_iter()
                .map(|file| FileReport {
                    path: file.path.to_string(),
                    outcome: file.outcome,
                })
                .collect(),
        })
    }

    /// Decide the final content of one file.
    async fn plan_file<'p>(
        &self,
        base_sha: &str,
        path: &'p str,
        change: &FileChange,
    ) -> Result<PlannedFile<'p>> {
        if change.is_deleted {
            return Ok(PlannedFile {
                path,
                content: None,
                outcome: FileOutcome::Deleted,
            });
        }
        if change.is_new {
            return Ok(PlannedFile {
                path,
                content: Some(change.added_lines.join("\n")),
                outcome: FileOutcome::Created,
            });
        }

        let (content, outcome) = match self.fetch_base(base_sha, path).await {
            BaseContent::Found(original) => {
                let content = apply_with(&original, change, self.options.mode).map_err(
                    |source| Error::PatchMismatch {
                        path: path.to_string(),
                        source,
                    },
                )?;
                (content, FileOutcome::Modified)
            }
            BaseContent::Absent => (
                change.added_lines.join("\n"),
                FileOutcome::Recreated {
                    reason: "not present at base".into(),
                },
            ),
            BaseContent::Unavailable(reason) => (
                change.added_lines.join("\n"),
                FileOutcome::Recreated { reason },
            ),
        };

        Ok(PlannedFile {
            path,
            content: Some(content),
            outcome,
        })
    }

    async fn fetch_base(&self, base_sha: &str, path: &str) -> BaseContent {
        match self
            .github
            .get_file_content(&self.repo.owner, &self.repo.repo, path, base_sha)
            .await
        {
            Ok(Some(content)) => BaseContent::Found(content),
            Ok(None) => {
                debug!(path, "file absent at base, writing added lines only");
                BaseContent::Absent
            }
            Err(e) => {
                warn!(path, error = %e, "could not fetch base content, writing added lines only");
                BaseContent::Unavailable(e.to_string())
            }
        }
    }

    /// Upload all blobs concurrently; entries keep patch order.
    async fn create_blobs(&self, planned: &[PlannedFile<'_>]) -> Result<Vec<TreeEntry>> {
        let (owner, repo) = (self.repo.owner.as_str(), self.repo.repo.as_str());

        try_join_all(planned.iter().map(|file| async move {
            let Some(content) = &file.content else {
                debug!(path = file.path, "tombstone");
                return Ok::<_, Error>(TreeEntry::tombstone(file.path));
            };
            let sha = self
                .github
                .create_blob(owner, repo, content)
                .await
                .map_err(Error::remote(Step::CreateBlob))?;
            debug!(path = file.path, blob = %sha, "created blob");
            Ok::<_, Error>(TreeEntry::blob(file.path, sha))
        }))
        .await
    }

    /// Point a new timestamped branch at `commit_sha`.
    ///
    /// A taken name is retried one second later, never overwritten.
    async fn create_branch(&self, commit_sha: &str) -> Result<BranchName> {
        let started = (self.clock)();
        let attempts = self.options.max_branch_attempts.max(1);

        let mut attempt = 0;
        loop {
            let at = started + TimeDelta::seconds(i64::from(attempt));
            let branch = BranchName::timestamped(&self.options.branch_prefix, at);

            match self
                .github
                .create_ref(
                    &self.repo.owner,
                    &self.repo.repo,
                    CreateRef::branch(&branch, commit_sha),
                )
                .await
            {
                Ok(created) => {
                    info!(branch = %branch, commit = %created.sha, "created branch");
                    return Ok(branch);
                }
                Err(e) if e.is_ref_conflict() && attempt + 1 < attempts => {
                    debug!(branch = %branch, "branch already exists, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(Error::remote(Step::CreateRef)(e)),
            }
        }
    }
}
