//! `patchpr branches` command - List a repository's branches.

use std::path::Path;

use anyhow::Result;
use patchpr_core::RepoRef;

use crate::commands::utils;
use crate::output;

/// Run the branches command.
pub fn run(config_path: Option<&Path>, repo: &str, json: bool) -> Result<()> {
    let config = utils::load_config(config_path)?;
    let repo = RepoRef::parse(repo)?;
    let client = utils::github_client(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let branches = rt.block_on(client.list_branches(&repo.owner, &repo.repo))?;

    if json {
        output::essential(&serde_json::to_string_pretty(&branches)?);
        return Ok(());
    }

    if branches.is_empty() {
        output::info(&format!("No branches in {repo}"));
        return Ok(());
    }
    for branch in &branches {
        output::essential(&output::branch_line(&branch.name, branch.protected));
    }
    Ok(())
}
