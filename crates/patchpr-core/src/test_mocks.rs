//! In-memory `GitHubApi` for testing the pipeline without a server.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use patchpr_github::{
    Branch, CreateCommit, CreatePullRequest, CreateRef, CreateTree, Error, GitCommit, GitHubApi,
    GitRef, PullRequest, Result,
};

/// Fixed clock: 2024-01-02 03:04:05.
pub fn fixed_clock() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .unwrap_or_default()
}

/// Mock implementation of `GitHubApi`.
///
/// Every call is appended to `calls` as its method name. Blob SHAs are
/// `blob:<content>` so tree entries can be checked by content.
pub struct MockGitHub {
    pub calls: Mutex<Vec<&'static str>>,
    pub blobs: Mutex<Vec<String>>,
    pub trees: Mutex<Vec<CreateTree>>,
    pub commits: Mutex<Vec<CreateCommit>>,
    pub refs: Mutex<Vec<CreateRef>>,
    pub prs: Mutex<Vec<CreatePullRequest>>,
    branch_heads: HashMap<String, String>,
    files: HashMap<String, String>,
    unavailable: HashSet<String>,
    taken_branches: HashSet<String>,
    failing: Option<&'static str>,
}

impl Default for MockGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitHub {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            blobs: Mutex::new(Vec::new()),
            trees: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            refs: Mutex::new(Vec::new()),
            prs: Mutex::new(Vec::new()),
            branch_heads: HashMap::from([("main".to_string(), "base-sha".to_string())]),
            files: HashMap::new(),
            unavailable: HashSet::new(),
            taken_branches: HashSet::new(),
            failing: None,
        }
    }

    /// Content of `path` at the base commit.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Make fetching `path` fail with a server error.
    pub fn with_unavailable(mut self, path: &str) -> Self {
        self.unavailable.insert(path.to_string());
        self
    }

    /// Make `create_ref` for `branch` answer "Reference already exists".
    pub fn with_taken_branch(mut self, branch: &str) -> Self {
        self.taken_branches.insert(branch.to_string());
        self
    }

    /// Make every call to `method` fail with a 500.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing = Some(method);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| **c == method).count()
    }

    fn record(&self, method: &'static str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(method);
        }
        if self.failing == Some(method) {
            return Err(server_error());
        }
        Ok(())
    }
}

fn server_error() -> Error {
    Error::ApiError {
        status: 500,
        message: "Internal Server Error".into(),
    }
}

fn push<T>(log: &Mutex<Vec<T>>, value: T) {
    if let Ok(mut log) = log.lock() {
        log.push(value);
    }
}

impl GitHubApi for MockGitHub {
    async fn get_branch_head(&self, _owner: &str, _repo: &str, branch: &str) -> Result<String> {
        self.record("get_branch_head")?;
        self.branch_heads
            .get(branch)
            .cloned()
            .ok_or_else(|| Error::ApiError {
                status: 404,
                message: "Not Found".into(),
            })
    }

    async fn get_commit(&self, _owner: &str, _repo: &str, sha: &str) -> Result<GitCommit> {
        self.record("get_commit")?;
        Ok(GitCommit {
            sha: sha.to_string(),
            tree_sha: format!("tree-of-{sha}"),
        })
    }

    async fn get_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        _git_ref: &str,
    ) -> Result<Option<String>> {
        self.record("get_file_content")?;
        if self.unavailable.contains(path) {
            return Err(server_error());
        }
        Ok(self.files.get(path).cloned())
    }

    async fn create_blob(&self, _owner: &str, _repo: &str, content: &str) -> Result<String> {
        self.record("create_blob")?;
        push(&self.blobs, content.to_string());
        Ok(format!("blob:{content}"))
    }

    async fn create_tree(&self, _owner: &str, _repo: &str, tree: CreateTree) -> Result<String> {
        self.record("create_tree")?;
        push(&self.trees, tree);
        Ok("new-tree-sha".into())
    }

    async fn create_commit(
        &self,
        _owner: &str,
        _repo: &str,
        commit: CreateCommit,
    ) -> Result<String> {
        self.record("create_commit")?;
        push(&self.commits, commit);
        Ok("new-commit-sha".into())
    }

    async fn create_ref(&self, _owner: &str, _repo: &str, git_ref: CreateRef) -> Result<GitRef> {
        self.record("create_ref")?;
        let created = GitRef {
            ref_name: git_ref.ref_name.clone(),
            sha: git_ref.sha.clone(),
        };
        let taken = self.taken_branches.contains(created.branch_name());
        push(&self.refs, git_ref);
        if taken {
            return Err(Error::ApiError {
                status: 422,
                message: r#"{"message":"Reference already exists"}"#.into(),
            });
        }
        Ok(created)
    }

    async fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: CreatePullRequest,
    ) -> Result<PullRequest> {
        self.record("create_pr")?;
        let created = PullRequest {
            number: 42,
            head_branch: pr.head.clone(),
            base_branch: pr.base.clone(),
            html_url: format!("https://github.com/{owner}/{repo}/pull/42"),
        };
        push(&self.prs, pr);
        Ok(created)
    }

    async fn list_branches(&self, _owner: &str, _repo: &str) -> Result<Vec<Branch>> {
        self.record("list_branches")?;
        Ok(self
            .branch_heads
            .keys()
            .map(|name| Branch {
                name: name.clone(),
                protected: name == "main",
            })
            .collect())
    }
}
