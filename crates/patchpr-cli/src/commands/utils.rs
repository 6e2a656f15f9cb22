use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use patchpr_core::Config;
use patchpr_core::config::CONFIG_FILE;
use patchpr_github::{Auth, GitHubClient};
use tracing::debug;

/// Load the config from `path`, or `./patchpr.toml`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    debug!(path = %path.display(), exists = path.exists(), "loading config");
    Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Authenticated client honouring the `[github]` config section.
pub fn github_client(config: &Config) -> Result<GitHubClient> {
    let base_url = config
        .github
        .api_url
        .as_deref()
        .unwrap_or(GitHubClient::DEFAULT_API_URL);
    debug!(base_url, timeout_secs = config.github.timeout_secs, "creating GitHub client");

    GitHubClient::with_options(&Auth::auto(), base_url, config.github.timeout())
        .context("Failed to authenticate with GitHub")
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
