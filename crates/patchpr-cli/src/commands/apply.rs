//! `patchpr apply` command - Reconstruct one file locally.

use std::path::Path;

use anyhow::{Context, Result, bail};
use patchpr_diff::ApplyMode;

use crate::commands::utils;
use crate::output;

/// Run the apply command.
pub fn run(patch: &Path, path: &str, original: Option<&Path>, strict: bool) -> Result<()> {
    let text = utils::read_input(patch)?;
    let parsed = patchpr_diff::parse(&text);

    let Some(change) = parsed.get(path) else {
        bail!("{path} is not changed by the patch");
    };

    let base = match original {
        Some(file) => utils::read_input(file)?,
        None => String::new(),
    };
    let mode = if strict {
        ApplyMode::Strict
    } else {
        ApplyMode::Lenient
    };

    let content = patchpr_diff::apply_with(&base, change, mode)
        .with_context(|| format!("Patch does not apply to {path}"))?;

    output::raw(&content);
    Ok(())
}
