//! Attaching a first remote to a local-only repository

use std::path::Path;

use super::detect::{with_repo, StateDetector};
use super::result::WorkflowResult;
use super::retry::RetryPolicy;
use super::state::{ActionKind, RepositoryState};
use super::sync::RemoteTransport;
use crate::git::{validate_remote_url, GitCommand};
use crate::{Error, Result};

/// Adds a remote, then tracks or publishes the current branch on it
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    transport: RemoteTransport,
    detector: StateDetector,
    remote_name: String,
}

impl RemoteConnector {
    /// Create a connector that registers remotes under `remote_name`
    pub fn new(git: GitCommand, retry: RetryPolicy, remote_name: impl Into<String>) -> Self {
        Self {
            transport: RemoteTransport { git, retry },
            detector: StateDetector::new(),
            remote_name: remote_name.into(),
        }
    }

    /// Connect the repository at `path` to `url`
    pub async fn connect(&self, path: &Path, url: &str) -> WorkflowResult {
        let attempt = self.try_connect(path, url).await;
        self.detector.settle(path, attempt).await
    }

    async fn try_connect(&self, path: &Path, url: &str) -> Result<WorkflowResult> {
        let url = validate_remote_url(url, path)?;

        let state = self.detector.detect(path).await?;
        if state == RepositoryState::NotARepository {
            return Err(Error::NotARepository(path.to_path_buf()));
        }
        ActionKind::ConnectRemote.check(&state)?;

        let name = self.remote_name.clone();
        let (branch, existing) = with_repo(path, move |repo| {
            Ok((repo.current_branch()?, repo.find_remote(&name)))
        })
        .await?;
        let branch = branch.ok_or_else(|| {
            Error::PreconditionFailed("HEAD is detached; check out a branch first.".to_string())
        })?;

        let git = &self.transport.git;
        let remote = self.remote_name.as_str();
        match existing {
            Some(info) if info.url != url => {
                return Err(Error::PreconditionFailed(format!(
                    "Remote '{}' already points to {}",
                    remote, info.url
                )))
            }
            Some(_) => tracing::debug!(remote, "Remote already registered"),
            None => {
                git.run(path, &["remote", "add", remote, &url]).await?;
            }
        }

        self.transport.fetch(path, remote).await?;

        let remote_owned = remote.to_string();
        let branch_owned = branch.clone();
        let published = with_repo(path, move |repo| {
            Ok(repo.has_remote_branch(&remote_owned, &branch_owned))
        })
        .await?;

        if published {
            let upstream = format!("{}/{}", remote, branch);
            git.run(path, &["branch", &format!("--set-upstream-to={}", upstream)])
                .await?;
            tracing::info!(remote, branch = %branch, "Tracking existing remote branch");
        } else {
            let merge_ref = format!("refs/heads/{}", branch);
            self.transport.push(path, remote, &merge_ref, true).await?;
            tracing::info!(remote, branch = %branch, "Published branch to remote");
        }

        Ok(WorkflowResult::completed(format!(
            "Connected to {} ({})",
            url, remote
        )))
    }
}
