//! Trait abstractions for GitHub API operations.
//!
//! This module defines the `GitHubApi` trait which abstracts GitHub API operations,
//! enabling dependency injection and testability.

use crate::{
    Branch, CreateCommit, CreatePullRequest, CreateRef, CreateTree, GitCommit, GitRef,
    PullRequest, Result,
};

/// Trait for GitHub API operations.
///
/// This trait abstracts GitHub API calls, allowing for:
/// - Dependency injection in the commit pipeline
/// - Mock implementations for testing
///
/// All methods take `owner` and `repo` as parameters to support
/// operations across different repositories.
pub trait GitHubApi: Send + Sync {
    // === Lookups ===

    /// Get the commit SHA at the tip of a branch.
    fn get_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Get a commit and its tree SHA.
    fn get_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> impl std::future::Future<Output = Result<GitCommit>> + Send;

    /// Get the text content of a file at a ref.
    ///
    /// Returns `None` if the file does not exist at that ref; transport and
    /// server failures are errors.
    fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    // === Object Creation ===

    /// Create a blob from UTF-8 content, returning its SHA.
    fn create_blob(
        &self,
        owner: &str,
        repo: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Create a tree, returning its SHA.
    fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        tree: CreateTree,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Create a commit, returning its SHA.
    fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        commit: CreateCommit,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Create a reference.
    fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        git_ref: CreateRef,
    ) -> impl std::future::Future<Output = Result<GitRef>> + Send;

    // === PR Operations ===

    /// Create a pull request.
    fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: CreatePullRequest,
    ) -> impl std::future::Future<Output = Result<PullRequest>> + Send;

    // === Repository Operations ===

    /// List the repository's branches.
    fn list_branches(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Branch>>> + Send;
}
