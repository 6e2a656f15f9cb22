//! Branch name validation and newtype.
//!
//! Branch names come from configuration (the prefix) and from the clock, and
//! end up in URLs and ref paths, so they are checked once at construction.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Format of the timestamp suffix on generated branches.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Characters git rejects in ref names.
const GIT_FORBIDDEN: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Characters that are legal for git but unsafe to splice into URLs or shells.
const UNSAFE: &[char] = &['$', ';', '|', '&', '<', '>', '`', '\'', '"', '(', ')', '#', '%'];

/// A validated git branch name.
///
/// # Examples
///
/// ```
/// use patchpr_core::BranchName;
///
/// assert!(BranchName::new("agent-patch").is_ok());
/// assert!(BranchName::new("agents/patch").is_ok());
///
/// assert!(BranchName::new("../etc/passwd").is_err());
/// assert!(BranchName::new("name;rm -rf").is_err());
/// assert!(BranchName::new("branch..name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranchName`] if the name violates git's
    /// ref naming rules or contains unsafe characters.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if let Some(reason) = invalid_reason(&name) {
            return Err(Error::InvalidBranchName {
                name,
                reason: reason.to_string(),
            });
        }
        Ok(Self(name))
    }

    /// `<prefix>-<YYYYMMDD-HHMMSS>` for the given local time.
    #[must_use]
    pub fn timestamped(prefix: &Self, at: NaiveDateTime) -> Self {
        Self(format!("{prefix}-{}", at.format(TIMESTAMP_FORMAT)))
    }

    /// Get the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the `BranchName` and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for BranchName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for BranchName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for BranchName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BranchName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// First rule `name` breaks, if any.
fn invalid_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("branch name cannot be empty");
    }
    if name == "@" {
        return Some("branch name cannot be '@'");
    }
    if name.starts_with('-') {
        return Some("branch name cannot start with '-'");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("branch name cannot start or end with '/'");
    }
    if name.ends_with('.') {
        return Some("branch name cannot end with '.'");
    }
    if name.ends_with(".lock") {
        return Some("branch name cannot end with '.lock'");
    }
    if name.contains("..") {
        return Some("branch name cannot contain '..'");
    }
    if name.contains("//") {
        return Some("branch name cannot contain '//'");
    }
    if name.contains("@{") {
        return Some("branch name cannot contain '@{'");
    }
    if name.split('/').any(|part| part.starts_with('.')) {
        return Some("path components cannot start with '.'");
    }
    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Some("branch name cannot contain whitespace or control characters");
    }
    if name.contains(GIT_FORBIDDEN) {
        return Some("branch name contains a character git does not allow");
    }
    if name.contains(UNSAFE) {
        return Some("branch name contains an unsafe character");
    }
    None
}
