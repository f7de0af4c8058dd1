//! Repository state, workflow phase and the action precondition table

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Whether the git executable is reachable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolAvailability {
    /// Not checked yet
    #[default]
    Unknown,
    /// `git --version` succeeded
    Available,
    /// git could not be run
    Missing,
}

impl ToolAvailability {
    /// Check if git was found
    pub fn is_available(&self) -> bool {
        matches!(self, ToolAvailability::Available)
    }
}

/// What git reports about a directory, recomputed on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryState {
    /// Neither the directory nor any ancestor holds a working repository
    NotARepository,
    /// No local changes and in step with the upstream
    Clean,
    /// Uncommitted changes, listed repository-relative
    Dirty(Vec<String>),
    /// Local commits the upstream does not have
    AheadOfRemote(usize),
    /// Upstream commits not yet merged locally
    BehindRemote(usize),
    /// Both sides have commits the other lacks
    Diverged {
        /// Local-only commits
        ahead: usize,
        /// Upstream-only commits
        behind: usize,
    },
    /// Clean, but the current branch tracks no upstream
    NoRemoteConfigured,
}

impl RepositoryState {
    /// Check if the directory is inside a repository
    pub fn is_repository(&self) -> bool {
        !matches!(self, RepositoryState::NotARepository)
    }

    /// Check if there are uncommitted changes
    pub fn is_dirty(&self) -> bool {
        matches!(self, RepositoryState::Dirty(_))
    }

    /// Nothing to commit and nothing to sync
    ///
    /// A repository without an upstream counts as clean: there is nothing
    /// the user can do about it short of connecting a remote.
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            RepositoryState::Clean | RepositoryState::NoRemoteConfigured
        )
    }

    /// Local history differs from the upstream
    pub fn needs_sync(&self) -> bool {
        matches!(
            self,
            RepositoryState::AheadOfRemote(_)
                | RepositoryState::BehindRemote(_)
                | RepositoryState::Diverged { .. }
        )
    }

    /// The UI phase this state belongs to
    pub fn phase(&self) -> WorkflowPhase {
        if self.is_repository() {
            WorkflowPhase::Ready
        } else {
            WorkflowPhase::Uninitialized
        }
    }

    /// The single action worth offering right now, if any
    ///
    /// Dirty always wins over remote status, so commit and sync are never
    /// offered together.
    pub fn primary_action(&self) -> Option<ActionKind> {
        match self {
            RepositoryState::NotARepository => Some(ActionKind::Init),
            RepositoryState::Dirty(_) => Some(ActionKind::Commit),
            RepositoryState::NoRemoteConfigured => Some(ActionKind::ConnectRemote),
            state if state.needs_sync() => Some(ActionKind::Sync),
            _ => None,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            RepositoryState::NotARepository => "Not a repository".to_string(),
            RepositoryState::Clean => "Everything is saved and synced".to_string(),
            RepositoryState::Dirty(paths) => format!("{} unsaved change(s)", paths.len()),
            RepositoryState::AheadOfRemote(n) => format!("{} snapshot(s) not yet sent", n),
            RepositoryState::BehindRemote(n) => {
                format!("{} snapshot(s) available from the remote", n)
            }
            RepositoryState::Diverged { ahead, behind } => format!(
                "{} snapshot(s) to send and {} to receive",
                ahead, behind
            ),
            RepositoryState::NoRemoteConfigured => {
                "Everything is saved; no remote configured".to_string()
            }
        }
    }
}

impl std::fmt::Display for RepositoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// The coarse state the interface switches on: init XOR commit/sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowPhase {
    /// Only `Init` is available
    Uninitialized,
    /// A repository exists; commit, sync and connect are available
    Ready,
}

impl WorkflowPhase {
    /// Actions that may be offered in this phase
    pub fn allowed_actions(&self) -> &'static [ActionKind] {
        match self {
            WorkflowPhase::Uninitialized => &[ActionKind::Init],
            WorkflowPhase::Ready => &[
                ActionKind::Commit,
                ActionKind::Sync,
                ActionKind::ConnectRemote,
            ],
        }
    }
}

/// A user action routed by the facade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a repository
    Init,
    /// Commit every change as a snapshot
    Commit,
    /// Fetch, reconcile and push
    Sync,
    /// Attach a first remote
    ConnectRemote {
        /// Remote URL or local path
        url: String,
    },
}

impl Action {
    /// The action without its arguments
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Init => ActionKind::Init,
            Action::Commit => ActionKind::Commit,
            Action::Sync => ActionKind::Sync,
            Action::ConnectRemote { .. } => ActionKind::ConnectRemote,
        }
    }
}

/// Argument-free action identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Create a repository
    Init,
    /// Commit a snapshot
    Commit,
    /// Sync with the upstream
    Sync,
    /// Attach a remote
    ConnectRemote,
}

impl ActionKind {
    /// Check the precondition table for this action
    ///
    /// Init is always allowed: on an existing repository it is a no-op.
    pub fn check(&self, state: &RepositoryState) -> Result<()> {
        match (self, state) {
            (ActionKind::Init, _) => Ok(()),
            (_, RepositoryState::NotARepository) => Err(Error::PreconditionFailed(
                "This folder is not a repository yet. Initialize it first.".to_string(),
            )),
            (ActionKind::Commit, _) => Ok(()),
            (ActionKind::Sync, RepositoryState::Dirty(paths)) => {
                Err(Error::PreconditionFailed(format!(
                    "There are {} unsaved change(s). Commit a snapshot before syncing.",
                    paths.len()
                )))
            }
            (ActionKind::Sync, _) => Ok(()),
            (ActionKind::ConnectRemote, RepositoryState::NoRemoteConfigured) => Ok(()),
            (ActionKind::ConnectRemote, RepositoryState::Dirty(_)) => {
                Err(Error::PreconditionFailed(
                    "Commit a snapshot before connecting a remote.".to_string(),
                ))
            }
            (ActionKind::ConnectRemote, _) => Err(Error::PreconditionFailed(
                "This repository is already connected to a remote.".to_string(),
            )),
        }
    }

    /// Get a human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Init => "Initialize repository",
            ActionKind::Commit => "Save snapshot",
            ActionKind::Sync => "Sync",
            ActionKind::ConnectRemote => "Connect remote",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
