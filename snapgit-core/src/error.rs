//! Error types for snapgit

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for snapgit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for snapgit operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// libgit2 error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The git executable could not be found
    #[error("Git is not installed or could not be found at '{0}'")]
    ToolMissing(String),

    /// An action needed a repository but the path is not inside one
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// `git commit` failed; carries the tool's own explanation
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// The current branch has no upstream to sync with
    #[error("No remote repository configured. Connect one with 'snapgit remote <url>' or 'git remote add origin <url>'")]
    NoRemoteConfigured,

    /// Transport failure talking to a remote
    #[error("Network error: {message}")]
    Network {
        /// Message from the git toolchain
        message: String,
        /// Whether trying again may help (DNS, timeouts, dropped connections)
        transient: bool,
    },

    /// A git invocation exceeded its soft timeout and was killed
    #[error("'git {command}' timed out after {}", humanize(.after))]
    Timeout {
        /// The git subcommand that hung
        command: String,
        /// The timeout that elapsed
        after: Duration,
    },

    /// Merge or rebase stopped on conflicts and was aborted
    #[error("Sync stopped because these files were changed both here and on the remote: {}", .paths.join(", "))]
    MergeConflict {
        /// Repository-relative conflicted paths
        paths: Vec<String>,
    },

    /// The remote refused the push, usually because it moved since the fetch
    #[error("The remote rejected the push because it has new changes. Sync again to pick them up. ({0})")]
    PushRejected(String),

    /// Action is not valid for the current repository state
    #[error("{0}")]
    PreconditionFailed(String),

    /// A git command exited unsuccessfully
    #[error("'git {command}' failed: {stderr}")]
    Command {
        /// The git subcommand that failed
        command: String,
        /// Trimmed stderr (or stdout when stderr is empty)
        stderr: String,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

fn humanize(duration: &Duration) -> String {
    humantime_serde::re::humantime::format_duration(*duration).to_string()
}

impl Error {
    /// Whether an automatic retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { transient, .. } => *transient,
            Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Collapse the error into the category the presentation layer sees
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::ToolMissing(_) => FailureKind::ToolMissing,
            Error::NotARepository(_) => FailureKind::NotARepository,
            Error::CommitFailed(_) => FailureKind::CommitFailed,
            Error::NoRemoteConfigured => FailureKind::NoRemoteConfigured,
            Error::Network { .. } | Error::Timeout { .. } => FailureKind::NetworkError,
            Error::MergeConflict { .. } => FailureKind::MergeConflict,
            Error::PushRejected(_) => FailureKind::PushRejected,
            Error::PreconditionFailed(_) => FailureKind::PreconditionFailed,
            Error::Io(_)
            | Error::Git(_)
            | Error::Config(_)
            | Error::Command { .. }
            | Error::Other(_) => FailureKind::ToolError,
        }
    }
}

/// Failure categories reported across the presentation boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Git is not available
    ToolMissing,
    /// The action requires a repository
    NotARepository,
    /// Commit was refused by git
    CommitFailed,
    /// Nothing to sync with
    NoRemoteConfigured,
    /// Fetch or push transport failure
    NetworkError,
    /// Remote and local edits conflict
    MergeConflict,
    /// The remote moved between fetch and push
    PushRejected,
    /// Action not allowed right now
    PreconditionFailed,
    /// Any other git or filesystem failure
    ToolError,
}
