//! Results returned by every mutating operation

use serde::{Deserialize, Serialize};

use super::state::RepositoryState;
use crate::error::{Error, FailureKind};

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The operation did its work
    Completed,
    /// Init on an existing repository; nothing was done
    AlreadyInitialized,
    /// Commit on a clean tree; nothing was done
    NothingToCommit,
    /// Sync found nothing to receive or send
    UpToDate,
    /// The operation failed
    Failed(FailureKind),
}

impl Outcome {
    /// Everything except `Failed` counts as success
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

/// What the presentation layer renders after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Whether the action succeeded (soft no-ops included)
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Repository state after the action; `None` if it could not be read
    pub new_state: Option<RepositoryState>,
    /// Typed outcome
    pub outcome: Outcome,
}

impl WorkflowResult {
    /// A successful result that did real work
    pub fn completed(message: impl Into<String>) -> Self {
        Self::with_outcome(Outcome::Completed, message)
    }

    /// A result with an explicit outcome
    pub fn with_outcome(outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            success: outcome.is_success(),
            message: message.into(),
            new_state: None,
            outcome,
        }
    }

    /// A failed result carrying the error's message
    pub fn failed(error: &Error) -> Self {
        Self::with_outcome(Outcome::Failed(error.kind()), error.to_string())
    }

    /// Attach the post-action state
    pub fn with_state(mut self, state: Option<RepositoryState>) -> Self {
        self.new_state = state;
        self
    }

    /// The failure category, if the action failed
    pub fn failure(&self) -> Option<FailureKind> {
        match self.outcome {
            Outcome::Failed(kind) => Some(kind),
            _ => None,
        }
    }
}

impl From<Error> for WorkflowResult {
    fn from(error: Error) -> Self {
        Self::failed(&error)
    }
}
