//! `patchpr parse` command - Summarize a patch without touching GitHub.

use std::path::Path;

use anyhow::Result;
use patchpr_diff::{FileKind, ParseDiagnostic, ParsedPatch};
use serde::Serialize;

use crate::commands::utils;
use crate::output;

/// JSON output for the parse command.
#[derive(Debug, Serialize)]
struct ParseOutput<'a> {
    files: Vec<FileSummary<'a>>,
    diagnostics: &'a [ParseDiagnostic],
}

#[derive(Debug, Serialize)]
struct FileSummary<'a> {
    path: &'a str,
    kind: FileKind,
    hunks: usize,
    added: usize,
    removed: usize,
}

fn summarize(patch: &ParsedPatch) -> ParseOutput<'_> {
    ParseOutput {
        files: patch
            .iter()
            .map(|(path, change)| FileSummary {
                path,
                kind: change.kind(),
                hunks: change.hunks.len(),
                added: change.added_lines.len(),
                removed: change.removed_lines.len(),
            })
            .collect(),
        diagnostics: patch.diagnostics(),
    }
}

/// Run the parse command.
pub fn run(input: &Path, json: bool) -> Result<()> {
    let text = utils::read_input(input)?;
    let patch = patchpr_diff::parse(&text);
    let summary = summarize(&patch);

    if json {
        output::essential(&serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.files.is_empty() {
        output::warn("No file changes found in patch");
    }
    for file in &summary.files {
        output::essential(&format!(
            "{} {} ({} hunk{}, +{} -{})",
            output::kind_label(file.kind),
            file.path,
            file.hunks,
            if file.hunks == 1 { "" } else { "s" },
            file.added,
            file.removed,
        ));
    }
    for diagnostic in summary.diagnostics {
        output::warn(&diagnostic.to_string());
    }

    Ok(())
}
