//! GitHub API types.

use serde::{Deserialize, Serialize};

/// File mode for regular, non-executable blobs.
pub const BLOB_MODE: &str = "100644";

/// A git commit object, reduced to what the commit pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    /// Commit SHA.
    pub sha: String,

    /// SHA of the commit's root tree.
    pub tree_sha: String,
}

/// A git reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Full ref name, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub ref_name: String,

    /// SHA the ref points at.
    pub sha: String,
}

impl GitRef {
    /// Short branch name, without the `refs/heads/` prefix.
    #[must_use]
    pub fn branch_name(&self) -> &str {
        self.ref_name
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.ref_name)
    }
}

/// An entry in a tree creation request.
///
/// A `sha` of `None` is a tombstone: it is sent as JSON `null`, which removes
/// the path from the base tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    /// Path relative to the repository root.
    pub path: String,

    /// File mode.
    pub mode: String,

    /// Object type.
    #[serde(rename = "type")]
    pub kind: String,

    /// Blob SHA, or `None` to delete the path.
    pub sha: Option<String>,
}

impl TreeEntry {
    /// Entry pointing `path` at an existing blob.
    #[must_use]
    pub fn blob(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: BLOB_MODE.into(),
            kind: "blob".into(),
            sha: Some(sha.into()),
        }
    }

    /// Entry removing `path` from the base tree.
    #[must_use]
    pub fn tombstone(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: BLOB_MODE.into(),
            kind: "blob".into(),
            sha: None,
        }
    }

    /// Check if this entry deletes its path.
    #[must_use]
    pub const fn is_tombstone(&self) -> bool {
        self.sha.is_none()
    }
}

/// Request to create a tree on top of a base tree.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTree {
    /// Tree whose entries are inherited unless overridden.
    pub base_tree: String,

    /// Entries to add, replace or remove.
    pub tree: Vec<TreeEntry>,
}

/// Request to create a commit object.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommit {
    /// Full commit message.
    pub message: String,

    /// Tree SHA.
    pub tree: String,

    /// Parent commit SHAs.
    pub parents: Vec<String>,
}

/// Request to create a reference.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRef {
    /// Full ref name.
    #[serde(rename = "ref")]
    pub ref_name: String,

    /// SHA to point at.
    pub sha: String,
}

impl CreateRef {
    /// Request for a new branch `refs/heads/{name}`.
    #[must_use]
    pub fn branch(name: &str, sha: impl Into<String>) -> Self {
        Self {
            ref_name: format!("refs/heads/{name}"),
            sha: sha.into(),
        }
    }
}

/// A GitHub Pull Request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number.
    pub number: u64,

    /// Head branch name.
    pub head_branch: String,

    /// Base branch name.
    pub base_branch: String,

    /// PR URL.
    pub html_url: String,
}

/// Request to create a pull request.
#[derive(Debug, Serialize)]
pub struct CreatePullRequest {
    /// PR title.
    pub title: String,

    /// PR body.
    pub body: String,

    /// Head branch.
    pub head: String,

    /// Base branch.
    pub base: String,
}

/// A repository branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Branch name.
    pub name: String,

    /// Whether branch protection is enabled.
    #[serde(default)]
    pub protected: bool,
}
