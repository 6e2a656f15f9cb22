//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use patchpr_core::FileOutcome;
use patchpr_diff::FileKind;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print an underlying cause of an error (always prints to stderr).
pub fn cause(msg: &str) {
    eprintln!("  {} {}", "caused by:".dimmed(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like PR URLs.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print text exactly as given, without a trailing newline.
pub fn raw(text: &str) {
    print!("{text}");
}

/// Colored label for a file kind in a parsed patch.
#[must_use]
pub fn kind_label(kind: FileKind) -> String {
    match kind {
        FileKind::New => "A".green().to_string(),
        FileKind::Deleted => "D".red().to_string(),
        FileKind::Modified => "M".yellow().to_string(),
    }
}

/// Colored label for what a publish did to a file.
#[must_use]
pub fn outcome_label(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Created => "created".green().to_string(),
        FileOutcome::Modified => "modified".yellow().to_string(),
        FileOutcome::Deleted => "deleted".red().to_string(),
        FileOutcome::Recreated { .. } => "recreated".magenta().to_string(),
    }
}

/// A branch listing line, protected branches marked.
#[must_use]
pub fn branch_line(name: &str, protected: bool) -> String {
    if protected {
        format!("{name} {}", "(protected)".dimmed())
    } else {
        name.to_string()
    }
}
