//! Error types for patchpr-diff.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while applying a patch.
///
/// Parsing never fails; see [`crate::ParsedPatch::diagnostics`] for the
/// lines the parser had to skip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A context or removed line did not match the base content.
    #[error("patch does not match base at line {line}: expected {expected:?}, found {}", describe_found(.found.as_deref()))]
    PatchMismatch {
        /// 1-based line number in the base content.
        line: usize,
        /// Text the patch expected at this line.
        expected: String,
        /// Text actually present, `None` past the end of the base.
        found: Option<String>,
    },
}

fn describe_found(found: Option<&str>) -> String {
    found.map_or_else(|| "end of file".to_string(), |f| format!("{f:?}"))
}
