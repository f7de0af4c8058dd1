//! Snapgit Core - a snapshot-and-sync workflow on top of git
//!
//! This crate detects what state a working directory is in and performs
//! the few mutations a non-technical user needs: initialize, save a
//! snapshot, and sync with a remote.

pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use config::{Config, Identity, SyncStrategy};
pub use context::RepoContext;
pub use error::{Error, FailureKind, Result};
pub use workflow::{
    Action, ActionKind, Outcome, RepositoryState, StartupReport, ToolAvailability,
    WorkflowFacade, WorkflowPhase, WorkflowResult,
};
