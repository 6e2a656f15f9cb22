//! Where the GitHub token comes from.
//!
//! Unless told otherwise, patchpr looks for a token in `GITHUB_TOKEN`, then
//! `GH_TOKEN`, then asks an installed `gh` CLI. Empty variables are skipped.

use std::io::ErrorKind;
use std::process::Command;

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Environment variables checked by [`Auth::Auto`], in order.
pub const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Token lookup strategy.
#[derive(Debug, Clone, Default)]
pub enum Auth {
    /// [`TOKEN_VARS`] first, then `gh auth token`.
    #[default]
    Auto,

    /// Only the named environment variable.
    EnvVar(String),

    /// Only `gh auth token`.
    GhCli,

    /// A token supplied by the caller.
    Token(SecretString),
}

impl Auth {
    /// The default lookup order.
    #[must_use]
    pub const fn auto() -> Self {
        Self::Auto
    }

    /// Look the token up.
    ///
    /// # Errors
    /// Returns [`Error::NoToken`] when the strategy finds nothing, or
    /// [`Error::Io`] when an explicitly requested `gh` cannot be run.
    pub fn resolve(&self) -> Result<SecretString> {
        match self {
            Self::Auto => match TOKEN_VARS.iter().find_map(|var| env_token(var)) {
                Some(token) => Ok(token),
                None => match gh_token() {
                    Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => Err(Error::NoToken),
                    other => other,
                },
            },
            Self::EnvVar(var) => env_token(var).ok_or(Error::NoToken),
            Self::GhCli => gh_token(),
            Self::Token(token) => Ok(token.clone()),
        }
    }
}

fn env_token(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn gh_token() -> Result<SecretString> {
    let output = Command::new("gh").args(["auth", "token"]).output()?;
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if output.status.success() && !token.is_empty() {
        Ok(SecretString::from(token))
    } else {
        Err(Error::NoToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_default_is_auto() {
        assert!(matches!(Auth::default(), Auth::Auto));
        assert!(matches!(Auth::auto(), Auth::Auto));
    }

    #[test]
    fn test_token_auth() {
        let auth = Auth::Token(SecretString::from("test_token"));
        assert_eq!(auth.resolve().unwrap().expose_secret(), "test_token");
    }

    #[test]
    fn test_env_var_auth() {
        // PATH is set in any test environment.
        let token = Auth::EnvVar("PATH".into()).resolve().unwrap();
        assert!(!token.expose_secret().is_empty());

        let auth = Auth::EnvVar("PATCHPR_TEST_UNSET_TOKEN_VARIABLE".into());
        assert!(matches!(auth.resolve(), Err(Error::NoToken)));
    }

    #[test]
    fn test_token_vars_order() {
        assert_eq!(TOKEN_VARS, ["GITHUB_TOKEN", "GH_TOKEN"]);
        assert!(env_token("PATCHPR_TEST_UNSET_TOKEN_VARIABLE").is_none());
    }
}
