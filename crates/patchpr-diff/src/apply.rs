//! Content reconstruction: replay a [`FileChange`] on top of base content.

use std::convert::Infallible;

use crate::error::{Error, Result};
use crate::patch::{FileChange, LineTag};

/// How strictly hunks are checked against the base content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Trust hunk positions; never look at the base text of context or
    /// removed lines.
    #[default]
    Lenient,
    /// Require every context and removed line to match the base.
    Strict,
}

/// Apply a change to `original`, trusting hunk positions.
///
/// A change without hunks ignores `original` and yields its added lines.
/// If the base has drifted from what the patch was generated against, the
/// output is silently wrong; use [`apply_with`] and [`ApplyMode::Strict`] to
/// detect that.
#[must_use]
pub fn apply(original: &str, change: &FileChange) -> String {
    let Ok(content) = reconstruct::<Infallible>(original, change, |_, _, _| Ok(()));
    content
}

/// Apply a change to `original` in the given mode.
///
/// # Errors
/// Returns [`Error::PatchMismatch`] in strict mode when a context or removed
/// line differs from the base.
pub fn apply_with(original: &str, change: &FileChange, mode: ApplyMode) -> Result<String> {
    match mode {
        ApplyMode::Lenient => Ok(apply(original, change)),
        ApplyMode::Strict => reconstruct(original, change, |index, expected, found| {
            if found == Some(expected) {
                Ok(())
            } else {
                Err(Error::PatchMismatch {
                    line: index + 1,
                    expected: expected.to_string(),
                    found: found.map(ToString::to_string),
                })
            }
        }),
    }
}

/// Walk the hunks with a cursor into the base lines.
///
/// `check` sees every base line a context or removed line consumes, as
/// `(index, expected, found)`.
fn reconstruct<E>(
    original: &str,
    change: &FileChange,
    mut check: impl FnMut(usize, &str, Option<&str>) -> std::result::Result<(), E>,
) -> std::result::Result<String, E> {
    if change.hunks.is_empty() {
        return Ok(change.added_lines.join("\n"));
    }

    let lines: Vec<&str> = original.split('\n').collect();
    let mut output: Vec<&str> = Vec::with_capacity(lines.len());
    let mut cursor = 0usize;

    for hunk in &change.hunks {
        // A pure insertion (`-N,0`) goes after line N rather than before it.
        let target = if hunk.old_count == 0 {
            hunk.old_start as usize
        } else {
            hunk.old_start.saturating_sub(1) as usize
        };
        while cursor < target && cursor < lines.len() {
            output.push(lines[cursor]);
            cursor += 1;
        }

        for line in &hunk.lines {
            match line.tag {
                LineTag::Context => {
                    check(cursor, &line.text, lines.get(cursor).copied())?;
                    output.push(&line.text);
                    cursor += 1;
                }
                LineTag::Add => output.push(&line.text),
                LineTag::Remove => {
                    check(cursor, &line.text, lines.get(cursor).copied())?;
                    cursor += 1;
                }
            }
        }
    }

    if let Some(rest) = lines.get(cursor..) {
        output.extend_from_slice(rest);
    }

    Ok(output.join("\n"))
}
