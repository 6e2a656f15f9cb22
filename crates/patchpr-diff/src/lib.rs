//! # patchpr-diff
//!
//! Unified diff handling for patchpr: a lenient parser that turns agent
//! patches into per-file change sets, and a reconstructor that replays those
//! changes on top of a base file's text.
//!
//! Nothing in this crate performs I/O.

mod apply;
mod error;
mod patch;

pub use apply::{ApplyMode, apply, apply_with};
pub use error::{Error, Result};
pub use patch::{
    DiagnosticKind, FileChange, FileKind, Hunk, HunkLine, LineTag, ParseDiagnostic, ParsedPatch,
    PatchedFile, parse,
};
