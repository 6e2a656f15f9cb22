//! # patchpr-core
//!
//! Turns agent patches into GitHub branches and pull requests.
//!
//! The [`CommitGraphBuilder`] reconstructs each touched file and writes the
//! blob, tree, commit and ref objects through a [`patchpr_github::GitHubApi`];
//! the [`Publisher`] drives it from a [`PendingChangeSet`] and optionally
//! opens a pull request.

pub mod branch_name;
pub mod builder;
pub mod config;
pub mod error;
pub mod publish;
pub mod store;

#[cfg(test)]
mod test_mocks;

pub use branch_name::BranchName;
pub use builder::{Base, BuildOptions, BuiltCommit, CommitGraphBuilder, FileOutcome, FileReport};
pub use config::Config;
pub use error::{Error, Result, Step};
pub use publish::{PublishOptions, PublishResult, Publisher, split_message};
pub use store::{
    ActivityFile, ChangeSetArtifact, ChangeSetSource, ChangeSetStore, MemoryStore, PendingChangeSet,
    RepoRef,
};
