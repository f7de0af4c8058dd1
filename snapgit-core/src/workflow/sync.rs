//! Synchronization with the upstream: fetch, reconcile, push
//!
//! The protocol is not atomic. Each step leaves the repository
//! in a state git itself understands, so a failure partway (say, a merge
//! that succeeded followed by a rejected push) is simply reported by the
//! next detection as `AheadOfRemote`.

use std::path::Path;

use super::detect::{with_repo, StateDetector};
use super::result::{Outcome, WorkflowResult};
use super::retry::RetryPolicy;
use super::state::RepositoryState;
use crate::config::SyncStrategy;
use crate::git::{classify_fetch_failure, classify_push_failure, GitCommand, GitRepo, Upstream};
use crate::{Error, Result};

/// Fetch and push with the retry policy and network timeout applied
#[derive(Debug, Clone)]
pub(crate) struct RemoteTransport {
    pub(crate) git: GitCommand,
    pub(crate) retry: RetryPolicy,
}

impl RemoteTransport {
    /// `git fetch <remote>`
    pub(crate) async fn fetch(&self, path: &Path, remote: &str) -> Result<()> {
        self.retry
            .run("fetch", |attempt| async move {
                tracing::debug!(remote, attempt, "Fetching");
                let output = self
                    .git
                    .output_with_timeout(path, &["fetch", remote])
                    .await?;
                if output.success {
                    Ok(())
                } else {
                    Err(classify_fetch_failure(&output.stderr))
                }
            })
            .await
    }

    /// `git push [--set-upstream] <remote> HEAD:<merge_ref>`
    pub(crate) async fn push(
        &self,
        path: &Path,
        remote: &str,
        merge_ref: &str,
        set_upstream: bool,
    ) -> Result<()> {
        let refspec = format!("HEAD:{}", merge_ref);
        let mut args: Vec<&str> = vec!["push"];
        if set_upstream {
            args.push("--set-upstream");
        }
        args.push(remote);
        args.push(refspec.as_str());

        self.retry
            .run("push", |attempt| {
                let args = &args;
                async move {
                    tracing::debug!(remote, attempt, "Pushing");
                    let output = self.git.output_with_timeout(path, args).await?;
                    if output.success {
                        Ok(())
                    } else {
                        Err(classify_push_failure(&output.stderr))
                    }
                }
            })
            .await
    }
}

/// Reconciles local history with the upstream
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    transport: RemoteTransport,
    detector: StateDetector,
    strategy: SyncStrategy,
}

impl SyncCoordinator {
    /// Create a coordinator
    pub fn new(git: GitCommand, retry: RetryPolicy, strategy: SyncStrategy) -> Self {
        Self {
            transport: RemoteTransport { git, retry },
            detector: StateDetector::new(),
            strategy,
        }
    }

    fn git(&self) -> &GitCommand {
        &self.transport.git
    }

    /// Fetch, reconcile and push the current branch
    pub async fn sync(&self, path: &Path) -> WorkflowResult {
        let attempt = self.try_sync(path).await;
        self.detector.settle(path, attempt).await
    }

    async fn try_sync(&self, path: &Path) -> Result<WorkflowResult> {
        match self.detector.detect(path).await? {
            RepositoryState::NotARepository => {
                return Err(Error::NotARepository(path.to_path_buf()))
            }
            RepositoryState::Dirty(paths) => {
                return Err(Error::PreconditionFailed(format!(
                    "There are {} unsaved change(s). Commit a snapshot before syncing.",
                    paths.len()
                )))
            }
            RepositoryState::NoRemoteConfigured => return Err(Error::NoRemoteConfigured),
            _ => {}
        }

        let upstream = with_repo(path, |repo| repo.upstream())
            .await?
            .ok_or(Error::NoRemoteConfigured)?;

        self.transport.fetch(path, &upstream.remote).await?;

        let (ahead, behind) = self.ahead_behind(path, &upstream).await?;
        tracing::info!(
            remote = %upstream.remote,
            branch = %upstream.branch(),
            ahead,
            behind,
            "Fetched upstream"
        );

        if behind > 0 {
            if ahead > 0 {
                self.reconcile(path, &upstream).await?;
            } else {
                self.fast_forward(path, &upstream).await?;
            }
        }

        let (to_send, _) = self.ahead_behind(path, &upstream).await?;
        if to_send > 0 {
            self.transport
                .push(path, &upstream.remote, &upstream.merge_ref, false)
                .await?;
        }

        if behind == 0 && to_send == 0 {
            return Ok(WorkflowResult::with_outcome(
                Outcome::UpToDate,
                "Already up to date",
            ));
        }

        tracing::info!(received = behind, sent = to_send, "Repository synced");
        Ok(WorkflowResult::completed(format!(
            "Repository successfully synced (received {} snapshot(s), sent {})",
            behind, to_send
        )))
    }

    async fn ahead_behind(&self, path: &Path, upstream: &Upstream) -> Result<(usize, usize)> {
        let upstream = upstream.clone();
        with_repo(path, move |repo| repo.ahead_behind(&upstream)).await
    }

    async fn fast_forward(&self, path: &Path, upstream: &Upstream) -> Result<()> {
        self.git()
            .run(path, &["merge", "--ff-only", &upstream.tracking_ref])
            .await?;
        Ok(())
    }

    /// Merge or rebase onto the upstream, aborting on conflicts
    async fn reconcile(&self, path: &Path, upstream: &Upstream) -> Result<()> {
        let (command, args, abort): (&str, Vec<&str>, [&str; 2]) = match self.strategy {
            SyncStrategy::Merge => (
                "merge",
                vec!["merge", "--no-edit", upstream.tracking_ref.as_str()],
                ["merge", "--abort"],
            ),
            SyncStrategy::Rebase => (
                "rebase",
                vec!["rebase", upstream.tracking_ref.as_str()],
                ["rebase", "--abort"],
            ),
        };

        let output = self.git().output(path, &args).await?;
        if output.success {
            return Ok(());
        }

        let conflicts = with_repo(path, |repo| repo.conflicted_paths()).await?;
        let in_progress = with_repo(path, |repo| Ok(operation_in_progress(repo))).await?;
        if in_progress {
            tracing::warn!(command, conflicts = ?conflicts, "Aborting {}", command);
            self.git().run(path, &abort).await?;
        }

        if conflicts.is_empty() {
            Err(Error::Command {
                command: command.to_string(),
                stderr: output.message(),
            })
        } else {
            Err(Error::MergeConflict { paths: conflicts })
        }
    }
}

fn operation_in_progress(repo: &GitRepo) -> bool {
    repo.inner().state() != git2::RepositoryState::Clean
}
