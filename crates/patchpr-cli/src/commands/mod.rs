//! Command definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod apply;
pub mod branches;
pub mod completions;
pub mod parse;
pub mod publish;
pub mod utils;

/// Publish agent-generated patches as GitHub branches and pull requests.
#[derive(Debug, Parser)]
#[command(name = "patchpr", version, about, propagate_version = true)]
pub struct Cli {
    /// Path to the config file (default: ./patchpr.toml).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log pipeline steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results (URLs, JSON, file content).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a branch (and by default a pull request) from a patch.
    Publish {
        /// Agent change-set artifact (JSON).
        #[arg(long, value_name = "FILE", conflicts_with_all = ["patch", "repo", "message", "base_commit"])]
        change_set: Option<PathBuf>,

        /// Saved activity list of an agent session; its latest change set is
        /// published.
        #[arg(long, value_name = "FILE", conflicts_with_all = ["change_set", "patch", "repo", "message", "base_commit"])]
        activities: Option<PathBuf>,

        /// Unified diff to publish.
        #[arg(long, value_name = "FILE", required_unless_present_any = ["change_set", "activities"], requires = "repo")]
        patch: Option<PathBuf>,

        /// Target repository as OWNER/REPO.
        #[arg(long, requires = "patch")]
        repo: Option<String>,

        /// Commit message; the first line becomes the PR title.
        #[arg(short, long)]
        message: Option<String>,

        /// Commit the patch was generated against.
        #[arg(long, value_name = "SHA")]
        base_commit: Option<String>,

        /// Branch to base on and open the PR against.
        #[arg(long, value_name = "BRANCH")]
        base: Option<String>,

        /// Only create the branch, no pull request.
        #[arg(long)]
        branch_only: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize the files and hunks in a patch.
    Parse {
        /// Patch file, or `-` for stdin.
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one file's content after applying a patch locally.
    Apply {
        /// Patch file, or `-` for stdin.
        #[arg(long, value_name = "FILE")]
        patch: PathBuf,

        /// Path of the file inside the patch.
        #[arg(long)]
        path: String,

        /// Base content of the file (empty if omitted).
        #[arg(long, value_name = "FILE")]
        original: Option<PathBuf>,

        /// Fail if context or removed lines do not match the base.
        #[arg(long)]
        strict: bool,
    },

    /// List a repository's branches.
    Branches {
        /// Repository as OWNER/REPO.
        #[arg(long)]
        repo: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
