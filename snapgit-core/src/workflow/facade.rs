//! Single entry point for the presentation layer
//!
//! [`WorkflowFacade`] owns one of each component, caches the tool check and
//! serializes mutations per repository. Every mutating call returns a
//! [`WorkflowResult`] rather than an error so callers can render it as is.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;

use super::commit::SnapshotCommitter;
use super::connect::RemoteConnector;
use super::detect::StateDetector;
use super::init::Initializer;
use super::lock::PathLocks;
use super::probe::ToolProbe;
use super::result::WorkflowResult;
use super::state::{Action, ActionKind, RepositoryState, ToolAvailability, WorkflowPhase};
use super::sync::SyncCoordinator;
use crate::config::Config;
use crate::context::RepoContext;
use crate::git::GitCommand;
use crate::{Error, Result};

/// What a front end needs to draw its first screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    /// Whether git can be run
    pub tool: ToolAvailability,
    /// Current repository state
    pub state: RepositoryState,
    /// Phase derived from the state
    pub phase: WorkflowPhase,
    /// The action worth offering first, if any
    pub primary_action: Option<ActionKind>,
}

struct Inner {
    config: Config,
    probe: ToolProbe,
    detector: StateDetector,
    initializer: Initializer,
    committer: SnapshotCommitter,
    sync: SyncCoordinator,
    connector: RemoteConnector,
    locks: PathLocks,
    tool: Mutex<ToolAvailability>,
}

/// Routes user actions to the workflow components
///
/// Cheap to clone; clones share the tool cache and the per-path locks.
#[derive(Clone)]
pub struct WorkflowFacade {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WorkflowFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowFacade")
            .field("git", &self.inner.config.git.program)
            .field("tool", &self.tool_availability())
            .finish_non_exhaustive()
    }
}

impl WorkflowFacade {
    /// Build every component from `config`
    pub fn new(config: Config) -> Self {
        let git = GitCommand::from_config(&config);
        let retry = config.sync.retry_policy();

        let inner = Inner {
            probe: ToolProbe::new(git.clone()),
            detector: StateDetector::new(),
            initializer: Initializer::new(git.clone(), config.init.gitignore.clone()),
            committer: SnapshotCommitter::new(git.clone(), config.snapshot.include_user),
            sync: SyncCoordinator::new(git.clone(), retry.clone(), config.sync.strategy),
            connector: RemoteConnector::new(git, retry, config.sync.remote_name.clone()),
            locks: PathLocks::new(),
            tool: Mutex::new(ToolAvailability::Unknown),
            config,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// The configuration this facade was built from
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Cached tool check; `Unknown` until the first check
    pub fn tool_availability(&self) -> ToolAvailability {
        *self
            .inner
            .tool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_tool_availability(&self, availability: ToolAvailability) {
        *self
            .inner
            .tool
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = availability;
    }

    /// Whether git can be run, checking only on the first call
    pub async fn check_tool_installed(&self) -> bool {
        match self.tool_availability() {
            ToolAvailability::Unknown => self.recheck_tool().await,
            known => known.is_available(),
        }
    }

    /// Check again, e.g. after the user installed git
    ///
    /// A check that could not run at all counts as `Missing`.
    pub async fn recheck_tool(&self) -> bool {
        let available = match self.inner.probe.is_git_available().await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "Could not run git --version");
                false
            }
        };

        let availability = if available {
            ToolAvailability::Available
        } else {
            ToolAvailability::Missing
        };
        tracing::debug!(?availability, "Checked git");
        self.set_tool_availability(availability);
        available
    }

    async fn lock_key(&self, ctx: &RepoContext) -> PathBuf {
        self.inner.detector.repository_root(ctx.path()).await
    }

    /// Whether a mutation is running on the context's repository
    pub async fn is_busy(&self, ctx: &RepoContext) -> bool {
        let key = self.lock_key(ctx).await;
        self.inner.locks.is_busy(&key)
    }

    /// Current state; waits for an in-flight mutation on the same repository
    pub async fn detect(&self, ctx: &RepoContext) -> Result<RepositoryState> {
        let key = self.lock_key(ctx).await;
        let _guard = self.inner.locks.shared(&key).await;
        self.inner.detector.detect(ctx.path()).await
    }

    /// Whether the context directory is inside a repository
    pub async fn has_repository(&self, ctx: &RepoContext) -> bool {
        match self.detect(ctx).await {
            Ok(state) => state.is_repository(),
            Err(e) => {
                tracing::warn!(path = %ctx.path().display(), error = %e, "Detection failed");
                false
            }
        }
    }

    /// Tool check plus state, phase and primary action in one call
    pub async fn startup(&self, ctx: &RepoContext) -> Result<StartupReport> {
        self.check_tool_installed().await;
        let state = self.detect(ctx).await?;

        Ok(StartupReport {
            tool: self.tool_availability(),
            phase: state.phase(),
            primary_action: state.primary_action(),
            state,
        })
    }

    /// Run `action` against the context directory
    ///
    /// Rejected up front when git is missing, when another mutation holds
    /// the repository, or when the current state forbids the action.
    pub async fn run(&self, ctx: &RepoContext, action: Action) -> WorkflowResult {
        let path = ctx.path();

        if !self.check_tool_installed().await {
            let error = Error::ToolMissing(self.inner.config.git.program.clone());
            return self.inner.detector.settle(path, Err(error)).await;
        }

        let key = self.lock_key(ctx).await;
        let Some(_guard) = self.inner.locks.try_exclusive(&key).await else {
            tracing::info!(path = %key.display(), action = %action.kind(), "Repository busy");
            return WorkflowResult::failed(&Error::PreconditionFailed(
                "Another operation is already running for this folder. Try again when it finishes."
                    .to_string(),
            ));
        };

        let state = match self.inner.detector.detect(path).await {
            Ok(state) => state,
            Err(e) => return WorkflowResult::failed(&e),
        };
        if let Err(e) = action.kind().check(&state) {
            tracing::debug!(action = %action.kind(), state = %state, "Precondition not met");
            return WorkflowResult::failed(&e).with_state(Some(state));
        }

        tracing::info!(path = %path.display(), action = %action.kind(), "Running action");
        match action {
            Action::Init => self.inner.initializer.init(path).await,
            Action::Commit => self.inner.committer.commit(path).await,
            Action::Sync => self.inner.sync.sync(path).await,
            Action::ConnectRemote { url } => self.inner.connector.connect(path, &url).await,
        }
    }

    /// Create a repository with a first commit
    pub async fn init_repository(&self, ctx: &RepoContext) -> WorkflowResult {
        self.run(ctx, Action::Init).await
    }

    /// Commit every change as a snapshot
    pub async fn commit_snapshot(&self, ctx: &RepoContext) -> WorkflowResult {
        self.run(ctx, Action::Commit).await
    }

    /// Fetch, reconcile and push
    pub async fn sync_repository(&self, ctx: &RepoContext) -> WorkflowResult {
        self.run(ctx, Action::Sync).await
    }

    /// Attach `url` as the first remote
    pub async fn connect_remote(&self, ctx: &RepoContext, url: impl Into<String>) -> WorkflowResult {
        self.run(ctx, Action::ConnectRemote { url: url.into() })
            .await
    }

    /// Run `action` in the background
    ///
    /// The handle resolves exactly once with the final result.
    pub fn dispatch(&self, ctx: RepoContext, action: Action) -> JoinHandle<WorkflowResult> {
        let facade = self.clone();
        tokio::spawn(async move { facade.run(&ctx, action).await })
    }
}
