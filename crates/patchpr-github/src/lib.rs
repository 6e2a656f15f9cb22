//! # patchpr-github
//!
//! GitHub API integration for patchpr: the git data API (refs, commits,
//! blobs, trees), file contents, branch listing and pull request creation.
//!
//! # Security
//!
//! Authentication tokens are stored using `SecretString` which automatically
//! zeroizes memory when dropped, reducing credential exposure in memory dumps.

mod auth;
mod client;
mod error;
mod traits;
mod types;

pub use auth::{Auth, TOKEN_VARS};
pub use client::GitHubClient;
pub use error::{Error, Result};
// Re-export SecretString for constructing Auth::Token
pub use secrecy::SecretString;
pub use traits::GitHubApi;
pub use types::{
    Branch, CreateCommit, CreatePullRequest, CreateRef, CreateTree, GitCommit, GitRef, PullRequest,
    TreeEntry,
};
