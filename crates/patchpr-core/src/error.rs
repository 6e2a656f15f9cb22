//! Error types for patchpr-core.

use std::fmt;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Remote step of the publish pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading the head of the base branch.
    ResolveBase,
    /// Reading the base commit's tree.
    ResolveTree,
    /// Uploading file content.
    CreateBlob,
    /// Writing the new tree.
    CreateTree,
    /// Writing the commit object.
    CreateCommit,
    /// Creating the branch ref.
    CreateRef,
    /// Opening the pull request.
    CreatePullRequest,
}

impl Step {
    /// Stable snake_case name of the step.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResolveBase => "resolve_base",
            Self::ResolveTree => "resolve_tree",
            Self::CreateBlob => "create_blob",
            Self::CreateTree => "create_tree",
            Self::CreateCommit => "create_commit",
            Self::CreateRef => "create_ref",
            Self::CreatePullRequest => "create_pull_request",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in patchpr-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The patch contained no file changes.
    #[error("no file changes found in patch")]
    NoChangesFound,

    /// No change set is recorded for the session.
    #[error("no change set recorded for session '{0}' - the session may not be completed")]
    PendingDataMissing(String),

    /// The change set's source does not name a GitHub repository.
    #[error("invalid source '{0}': expected sources/github/<owner>/<repo> or <owner>/<repo>")]
    InvalidSource(String),

    /// Invalid branch name.
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName {
        /// The invalid name.
        name: String,
        /// Why the name is invalid.
        reason: String,
    },

    /// Strict apply found a hunk that does not match the base content.
    #[error("{path}: {source}")]
    PatchMismatch {
        /// Path of the file being reconstructed.
        path: String,
        /// Where the mismatch was found.
        source: patchpr_diff::Error,
    },

    /// A GitHub call in the pipeline failed; objects created so far are left
    /// in place.
    #[error("{step} failed: {source}")]
    RemoteObjectCreationFailed {
        /// Step that failed.
        step: Step,
        /// Underlying API error.
        source: patchpr_github::Error,
    },

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Wrap a GitHub error as a failure of `step`.
    pub(crate) fn remote(step: Step) -> impl FnOnce(patchpr_github::Error) -> Self {
        move |source| Self::RemoteObjectCreationFailed { step, source }
    }

    /// The pipeline step that failed, for remote failures.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::RemoteObjectCreationFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}
