//! Repository state detection

use std::path::{Path, PathBuf};

use super::result::WorkflowResult;
use super::state::RepositoryState;
use crate::git::GitRepo;
use crate::{Error, Result};

/// Run libgit2 work on the blocking pool
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Other(format!("Background git task failed: {}", e)))?
}

/// Open the repository containing `path` on the blocking pool and run `f` on it
pub(crate) async fn with_repo<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce(&GitRepo) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let path = path.to_path_buf();
    blocking(move || f(&GitRepo::open(&path)?)).await
}

/// Derives [`RepositoryState`] from the filesystem and git metadata
///
/// Never touches the network: remote comparison uses the remote-tracking
/// refs as of the last fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateDetector;

impl StateDetector {
    /// Create a detector
    pub fn new() -> Self {
        Self
    }

    /// Detect synchronously
    ///
    /// 1. no repository ⇒ `NotARepository`
    /// 2. any uncommitted change ⇒ `Dirty`, regardless of remote status
    /// 3. no upstream ⇒ `NoRemoteConfigured`
    /// 4. otherwise compare HEAD with the upstream
    pub fn detect_blocking(&self, path: &Path) -> Result<RepositoryState> {
        let Some(repo) = GitRepo::try_open(path)? else {
            return Ok(RepositoryState::NotARepository);
        };

        let dirty = repo.uncommitted_paths()?;
        if !dirty.is_empty() {
            return Ok(RepositoryState::Dirty(dirty));
        }

        let Some(upstream) = repo.upstream()? else {
            return Ok(RepositoryState::NoRemoteConfigured);
        };

        let state = match repo.ahead_behind(&upstream)? {
            (0, 0) => RepositoryState::Clean,
            (ahead, 0) => RepositoryState::AheadOfRemote(ahead),
            (0, behind) => RepositoryState::BehindRemote(behind),
            (ahead, behind) => RepositoryState::Diverged { ahead, behind },
        };
        Ok(state)
    }

    /// Detect on the blocking pool
    pub async fn detect(&self, path: &Path) -> Result<RepositoryState> {
        let detector = *self;
        let path = path.to_path_buf();
        blocking(move || detector.detect_blocking(&path)).await
    }

    /// Repository root for `path`, or the canonical path itself outside a repository
    pub async fn repository_root(&self, path: &Path) -> PathBuf {
        let owned = path.to_path_buf();
        let root = blocking(move || {
            Ok(GitRepo::try_open(&owned)?.map(|repo| repo.root().to_path_buf()))
        })
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| path.to_path_buf());

        root.canonicalize().unwrap_or(root)
    }

    /// Turn an operation's outcome into a result carrying the fresh state
    pub async fn settle(&self, path: &Path, attempt: Result<WorkflowResult>) -> WorkflowResult {
        let result = match attempt {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Workflow action failed");
                WorkflowResult::failed(&e)
            }
        };

        let state = match self.detect(path).await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read state after action");
                None
            }
        };

        result.with_state(state)
    }
}
