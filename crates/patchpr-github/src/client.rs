//! GitHub API client.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Auth;
use crate::error::{Error, Result};
use crate::traits::GitHubApi;
use crate::types::{
    Branch, CreateCommit, CreatePullRequest, CreateRef, CreateTree, GitCommit, GitRef,
    PullRequest,
};

// === Internal API response types (shared across methods) ===

/// Internal representation of a PR from the GitHub API.
#[derive(serde::Deserialize)]
struct ApiPullRequest {
    number: u64,
    html_url: String,
    head: ApiBranch,
    base: ApiBranch,
}

/// Internal representation of a branch ref from the GitHub API.
#[derive(serde::Deserialize)]
struct ApiBranch {
    #[serde(rename = "ref")]
    ref_name: String,
}

impl ApiPullRequest {
    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            number: self.number,
            head_branch: self.head.ref_name,
            base_branch: self.base.ref_name,
            html_url: self.html_url,
        }
    }
}

/// A ref as returned by `git/ref` and `git/refs`.
#[derive(serde::Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: ApiObject,
}

/// Any response carrying a `sha` (blobs, trees, commits, ref targets).
#[derive(serde::Deserialize)]
struct ApiObject {
    sha: String,
}

#[derive(serde::Deserialize)]
struct ApiCommit {
    sha: String,
    tree: ApiObject,
}

#[derive(serde::Deserialize)]
struct ApiContent {
    content: Option<String>,
    encoding: Option<String>,
}

/// GitHub API client.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    /// Token stored as `SecretString` for automatic zeroization on drop.
    token: SecretString,
}

impl GitHubClient {
    /// Default GitHub API URL.
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";

    /// Default timeout applied to every request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new GitHub client.
    ///
    /// # Errors
    /// Returns error if authentication fails.
    pub fn new(auth: &Auth) -> Result<Self> {
        Self::with_base_url(auth, Self::DEFAULT_API_URL)
    }

    /// Create a new GitHub client with a custom API URL (for GitHub Enterprise).
    ///
    /// # Errors
    /// Returns error if authentication fails.
    pub fn with_base_url(auth: &Auth, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(auth, base_url, Self::DEFAULT_TIMEOUT)
    }

    /// Create a new GitHub client with a custom API URL and request timeout.
    ///
    /// # Errors
    /// Returns error if authentication fails.
    pub fn with_options(
        auth: &Auth,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let token = auth.resolve()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("patchpr"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Make a GET request.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!(method = "GET", path, "github request");
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Make a POST request.
    async fn post<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!(method = "POST", path, "github request");
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.json().await?;
            return Ok(body);
        }

        // Handle error responses
        let status_code = status.as_u16();

        match status_code {
            401 => Err(Error::AuthenticationFailed),
            403 if response
                .headers()
                .get("x-ratelimit-remaining")
                .is_some_and(|v| v == "0") =>
            {
                Err(Error::RateLimited)
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::ApiError {
                    status: status_code,
                    message: text,
                })
            }
        }
    }

    // === Lookups ===

    /// Get the commit SHA at the tip of a branch.
    ///
    /// # Errors
    /// Returns error if the branch does not exist or the API call fails.
    pub async fn get_branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let api_ref: ApiRef = self
            .get(&format!("/repos/{owner}/{repo}/git/ref/heads/{branch}"))
            .await?;

        Ok(api_ref.object.sha)
    }

    /// Get a commit and its tree SHA.
    ///
    /// # Errors
    /// Returns error if the commit does not exist or the API call fails.
    pub async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<GitCommit> {
        let commit: ApiCommit = self
            .get(&format!("/repos/{owner}/{repo}/git/commits/{sha}"))
            .await?;

        Ok(GitCommit {
            sha: commit.sha,
            tree_sha: commit.tree.sha,
        })
    }

    /// Get the text content of a file at a ref.
    ///
    /// Returns `Ok(None)` on 404.
    ///
    /// # Errors
    /// Returns error on any other failure, or if the content is not UTF-8.
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>> {
        let result: Result<ApiContent> = self
            .get(&format!(
                "/repos/{owner}/{repo}/contents/{}?ref={git_ref}",
                encode_path(path)
            ))
            .await;

        let content = match result {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        decode_content(path, content).map(Some)
    }

    // === Object Creation ===

    /// Create a blob from UTF-8 content.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn create_blob(&self, owner: &str, repo: &str, content: &str) -> Result<String> {
        let body = serde_json::json!({ "content": content, "encoding": "utf-8" });
        let blob: ApiObject = self
            .post(&format!("/repos/{owner}/{repo}/git/blobs"), &body)
            .await?;

        Ok(blob.sha)
    }

    /// Create a tree.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn create_tree(&self, owner: &str, repo: &str, tree: CreateTree) -> Result<String> {
        let created: ApiObject = self
            .post(&format!("/repos/{owner}/{repo}/git/trees"), &tree)
            .await?;

        Ok(created.sha)
    }

    /// Create a commit.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        commit: CreateCommit,
    ) -> Result<String> {
        let created: ApiObject = self
            .post(&format!("/repos/{owner}/{repo}/git/commits"), &commit)
            .await?;

        Ok(created.sha)
    }

    /// Create a reference.
    ///
    /// # Errors
    /// Returns error if the ref already exists or the API call fails.
    pub async fn create_ref(&self, owner: &str, repo: &str, git_ref: CreateRef) -> Result<GitRef> {
        let created: ApiRef = self
            .post(&format!("/repos/{owner}/{repo}/git/refs"), &git_ref)
            .await?;

        Ok(GitRef {
            ref_name: created.ref_name,
            sha: created.object.sha,
        })
    }

    // === PR Operations ===

    /// Create a pull request.
    ///
    /// # Errors
    /// Returns error if PR creation fails.
    pub async fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: CreatePullRequest,
    ) -> Result<PullRequest> {
        let api_pr: ApiPullRequest = self
            .post(&format!("/repos/{owner}/{repo}/pulls"), &pr)
            .await?;

        Ok(api_pr.into_pull_request())
    }

    // === Repository Operations ===

    /// List the repository's branches (first 100).
    ///
    /// # Errors
    /// Returns error if API call fails.
    pub async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        self.get(&format!("/repos/{owner}/{repo}/branches?per_page=100"))
            .await
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

/// Percent-encode the characters of a repository path that would otherwise
/// end the URL path.
fn encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            ' ' => encoded.push_str("%20"),
            '#' => encoded.push_str("%23"),
            '?' => encoded.push_str("%3F"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// Decode a contents API payload into text.
fn decode_content(path: &str, content: ApiContent) -> Result<String> {
    let raw = content.content.unwrap_or_default();

    let bytes = match content.encoding.as_deref() {
        Some("base64") | None => {
            // GitHub wraps base64 content at 60 columns.
            let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD.decode(compact).map_err(|e| Error::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            })?
        }
        Some("utf-8") => raw.into_bytes(),
        Some(other) => {
            return Err(Error::Decode {
                path: path.to_string(),
                reason: format!("unsupported encoding '{other}'"),
            });
        }
    };

    String::from_utf8(bytes).map_err(|e| Error::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

// === Trait Implementation ===

impl GitHubApi for GitHubClient {
    async fn get_branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        self.get_branch_head(owner, repo, branch).await
    }

    async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<GitCommit> {
        self.get_commit(owner, repo, sha).await
    }

    async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>> {
        self.get_file_content(owner, repo, path, git_ref).await
    }

    async fn create_blob(&self, owner: &str, repo: &str, content: &str) -> Result<String> {
        self.create_blob(owner, repo, content).await
    }

    async fn create_tree(&self, owner: &str, repo: &str, tree: CreateTree) -> Result<String> {
        self.create_tree(owner, repo, tree).await
    }

    async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        commit: CreateCommit,
    ) -> Result<String> {
        self.create_commit(owner, repo, commit).await
    }

    async fn create_ref(&self, owner: &str, repo: &str, git_ref: CreateRef) -> Result<GitRef> {
        self.create_ref(owner, repo, git_ref).await
    }

    async fn create_pr(
        &self,
        owner: &str,
        repo: &str,
        pr: CreatePullRequest,
    ) -> Result<PullRequest> {
        self.create_pr(owner, repo, pr).await
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>> {
        self.list_branches(owner, repo).await
    }
}
