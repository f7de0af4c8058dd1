//! Snapshot commits

use std::path::Path;

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};

use super::detect::StateDetector;
use super::result::{Outcome, WorkflowResult};
use super::state::RepositoryState;
use crate::git::GitCommand;
use crate::{Error, Result};

#[cfg(windows)]
const USER_ENV: &str = "USERNAME";
#[cfg(not(windows))]
const USER_ENV: &str = "USER";

/// Generated commit message: `Snapshot at <RFC 3339>[ by <user>]`
pub fn snapshot_message(at: &DateTime<FixedOffset>, user: Option<&str>) -> String {
    let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, false);
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => format!("Snapshot at {} by {}", timestamp, user),
        None => format!("Snapshot at {}", timestamp),
    }
}

fn current_user() -> Option<String> {
    std::env::var(USER_ENV).ok()
}

/// Stages every change and commits it with a generated message
#[derive(Debug, Clone)]
pub struct SnapshotCommitter {
    git: GitCommand,
    detector: StateDetector,
    include_user: bool,
}

impl SnapshotCommitter {
    /// Create a committer
    pub fn new(git: GitCommand, include_user: bool) -> Self {
        Self {
            git,
            detector: StateDetector::new(),
            include_user,
        }
    }

    /// Commit all changes under `path`; a no-op on a clean tree
    pub async fn commit(&self, path: &Path) -> WorkflowResult {
        let attempt = self.try_commit(path).await;
        self.detector.settle(path, attempt).await
    }

    async fn try_commit(&self, path: &Path) -> Result<WorkflowResult> {
        let changed = match self.detector.detect(path).await? {
            RepositoryState::NotARepository => {
                return Err(Error::NotARepository(path.to_path_buf()))
            }
            RepositoryState::Dirty(paths) => paths,
            _ => {
                return Ok(WorkflowResult::with_outcome(
                    Outcome::NothingToCommit,
                    "No changes detected in the repository. Nothing to commit.",
                ))
            }
        };

        let user = self.include_user.then(current_user).flatten();
        let message = snapshot_message(&Local::now().fixed_offset(), user.as_deref());

        let add = self.git.output(path, &["add", "--all"]).await?;
        if !add.success {
            return Err(Error::CommitFailed(add.message()));
        }

        let commit = self.git.output(path, &["commit", "-m", &message]).await?;
        if !commit.success {
            return Err(Error::CommitFailed(commit.message()));
        }

        tracing::info!(
            path = %path.display(),
            files = changed.len(),
            message = %message,
            "Snapshot committed"
        );
        Ok(WorkflowResult::completed(format!(
            "Saved {} change(s): {}",
            changed.len(),
            message
        )))
    }
}
