//! Pending change sets, keyed by the session that produced them.
//!
//! An agent session that completes with a patch leaves a change set behind;
//! publishing reads it back by session id.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix of agent source identifiers for GitHub repositories.
const GITHUB_SOURCE_PREFIX: &str = "sources/github/";

/// A patch waiting to be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChangeSet {
    /// Repository source, `sources/github/<owner>/<repo>` or `<owner>/<repo>`.
    pub source: String,
    /// Unified diff text.
    pub patch: String,
    /// Commit message for the published commit.
    pub commit_message: String,
    /// Commit the patch was generated against, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_commit_id: Option<String>,
}

impl PendingChangeSet {
    /// The repository this change set targets.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSource`] if the source is malformed.
    pub fn repo(&self) -> Result<RepoRef> {
        RepoRef::parse(&self.source)
    }
}

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `sources/github/<owner>/<repo>` or `<owner>/<repo>`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSource`] unless exactly an owner and a repo
    /// remain after the optional prefix.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let rest = trimmed
            .strip_prefix(GITHUB_SOURCE_PREFIX)
            .unwrap_or(trimmed);

        match rest.split('/').collect::<Vec<_>>().as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                repo: (*repo).to_string(),
            }),
            _ => Err(Error::InvalidSource(source.to_string())),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Storage for pending change sets.
///
/// Implementations must be safe to share between concurrent sessions.
pub trait ChangeSetStore: Send + Sync {
    /// Change set recorded for a session.
    fn get(&self, session_id: &str) -> Option<PendingChangeSet>;

    /// Record a change set, returning the one it replaced.
    fn insert(&self, session_id: String, change_set: PendingChangeSet)
    -> Option<PendingChangeSet>;

    /// Forget a session's change set.
    fn remove(&self, session_id: &str) -> Option<PendingChangeSet>;
}

/// In-process [`ChangeSetStore`]; contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, PendingChangeSet>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no sessions are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeSetStore for MemoryStore {
    fn get(&self, session_id: &str) -> Option<PendingChangeSet> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn insert(
        &self,
        session_id: String,
        change_set: PendingChangeSet,
    ) -> Option<PendingChangeSet> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id, change_set)
    }

    fn remove(&self, session_id: &str) -> Option<PendingChangeSet> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
    }
}

/// Somewhere a change set missing from the store can be recovered from.
///
/// Consulted by [`crate::Publisher::publish_session`] before it gives up on
/// a session; whatever it returns is recorded in the store.
pub trait ChangeSetSource: Send + Sync {
    /// The latest change set a session produced, if any.
    ///
    /// # Errors
    /// Returns an error if the source cannot be read.
    fn recover(&self, session_id: &str) -> Result<Option<ChangeSetArtifact>>;
}

/// A session's activity list saved as JSON.
///
/// The file is read on every [`ChangeSetSource::recover`] call and holds the
/// activities of a single session, so the session id is not consulted.
#[derive(Debug, Clone)]
pub struct ActivityFile {
    path: PathBuf,
}

impl ActivityFile {
    /// Read activities from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChangeSetSource for ActivityFile {
    fn recover(&self, _session_id: &str) -> Result<Option<ChangeSetArtifact>> {
        let text = fs::read_to_string(&self.path)?;
        ChangeSetArtifact::from_activities(&text)
    }
}

/// A `changeSet` artifact as emitted by the agent on session completion.
///
/// ```json
/// { "source": "sources/github/owner/repo",
///   "gitPatch": { "unidiffPatch": "...", "suggestedCommitMessage": "...", "baseCommitId": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSetArtifact {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub git_patch: GitPatch,
}

/// The `gitPatch` part of a [`ChangeSetArtifact`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPatch {
    #[serde(default)]
    pub unidiff_patch: String,
    pub suggested_commit_message: Option<String>,
    pub base_commit_id: Option<String>,
}

impl ChangeSetArtifact {
    /// Parse an artifact, either bare or wrapped as `{"changeSet": {...}}`.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if the text is not a change set.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(text)?;
        if let Some(inner) = value.get_mut("changeSet") {
            value = inner.take();
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Find the most recent change set in a session's activity list.
    ///
    /// Accepts a bare array or an `{"activities": [...]}` response. Activities
    /// are scanned newest (last) first; within one activity the first
    /// artifact carrying a `changeSet` wins.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if the text is not JSON or the change set found
    /// is malformed.
    pub fn from_activities(text: &str) -> Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let Some(activities) = value
            .get("activities")
            .unwrap_or(&value)
            .as_array()
        else {
            return Ok(None);
        };

        let latest = activities.iter().rev().find_map(|activity| {
            activity
                .get("artifacts")?
                .as_array()?
                .iter()
                .find_map(|artifact| artifact.get("changeSet"))
        });

        latest
            .map(|change_set| serde_json::from_value(change_set.clone()))
            .transpose()
            .map_err(Error::from)
    }

    /// Convert to a pending change set, filling in `default_message` when
    /// the agent suggested none.
    #[must_use]
    pub fn into_pending(self, default_message: &str) -> PendingChangeSet {
        let commit_message = self
            .git_patch
            .suggested_commit_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message.to_string());

        PendingChangeSet {
            source: self.source,
            patch: self.git_patch.unidiff_patch,
            commit_message,
            base_commit_id: self.git_patch.base_commit_id.filter(|s| !s.is_empty()),
        }
    }
}
