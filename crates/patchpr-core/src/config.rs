//! Configuration management for patchpr.

use std::fs;
use std::path::Path;
use std::time::Duration;

use patchpr_diff::ApplyMode;
use serde::Deserialize;

use crate::branch_name::BranchName;
use crate::error::{Error, Result};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "patchpr.toml";

/// patchpr configuration loaded from `patchpr.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub connection settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Branch, commit and pull request settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read, parsed or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBranchName`] for a bad prefix and
    /// [`Error::InvalidConfig`] for out-of-range numbers.
    pub fn validate(&self) -> Result<()> {
        self.publish.branch_prefix()?;
        if self.publish.max_branch_attempts == 0 {
            return Err(Error::InvalidConfig(
                "publish.max_branch_attempts must be at least 1".into(),
            ));
        }
        if self.github.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "github.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// GitHub-specific settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// Custom API URL for GitHub Enterprise.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Base URL for browser links to branches.
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GitHubConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Browser URL of a branch.
    #[must_use]
    pub fn branch_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        format!(
            "{}/{owner}/{repo}/tree/{branch}",
            self.web_url.trim_end_matches('/')
        )
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            web_url: default_web_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_web_url() -> String {
    "https://github.com".into()
}

const fn default_timeout_secs() -> u64 {
    60
}

/// Settings for the objects a publish creates.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Prefix of generated branch names.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Branch to base on and target when none is given.
    #[serde(default = "default_base_branch")]
    pub default_base_branch: String,

    /// Pull request body used when the commit message has no body.
    #[serde(default = "default_pr_body")]
    pub default_pr_body: String,

    /// Commit message used when the change set carries none.
    #[serde(default = "default_commit_message")]
    pub default_commit_message: String,

    /// Refuse patches whose context does not match the base.
    #[serde(default)]
    pub strict_apply: bool,

    /// How many branch names to try when one is already taken.
    #[serde(default = "default_max_branch_attempts")]
    pub max_branch_attempts: u32,
}

impl PublishConfig {
    /// The validated branch prefix.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBranchName`] if the prefix is not a valid
    /// branch name.
    pub fn branch_prefix(&self) -> Result<BranchName> {
        BranchName::new(self.branch_prefix.as_str())
    }

    /// Apply mode selected by `strict_apply`.
    #[must_use]
    pub const fn apply_mode(&self) -> ApplyMode {
        if self.strict_apply {
            ApplyMode::Strict
        } else {
            ApplyMode::Lenient
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            default_base_branch: default_base_branch(),
            default_pr_body: default_pr_body(),
            default_commit_message: default_commit_message(),
            strict_apply: false,
            max_branch_attempts: default_max_branch_attempts(),
        }
    }
}

fn default_branch_prefix() -> String {
    "agent-patch".into()
}

fn default_base_branch() -> String {
    "main".into()
}

fn default_pr_body() -> String {
    "Created from an agent patch".into()
}

fn default_commit_message() -> String {
    "Changes from agent patch".into()
}

const fn default_max_branch_attempts() -> u32 {
    3
}
