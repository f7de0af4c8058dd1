//! Repository initialization

use std::path::Path;

use super::detect::StateDetector;
use super::result::{Outcome, WorkflowResult};
use crate::git::GitCommand;
use crate::{Error, Result};

/// Message of the first commit recorded by `init`
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Creates a repository with a first commit
#[derive(Debug, Clone)]
pub struct Initializer {
    git: GitCommand,
    detector: StateDetector,
    gitignore: Vec<String>,
}

impl Initializer {
    /// Create an initializer writing the given `.gitignore` entries
    pub fn new(git: GitCommand, gitignore: Vec<String>) -> Self {
        Self {
            git,
            detector: StateDetector::new(),
            gitignore,
        }
    }

    /// Initialize `path`; a no-op if it is already inside a repository
    pub async fn init(&self, path: &Path) -> WorkflowResult {
        let attempt = self.try_init(path).await;
        self.detector.settle(path, attempt).await
    }

    async fn try_init(&self, path: &Path) -> Result<WorkflowResult> {
        if self.detector.detect(path).await?.is_repository() {
            tracing::info!(path = %path.display(), "Already a repository, skipping init");
            return Ok(WorkflowResult::with_outcome(
                Outcome::AlreadyInitialized,
                "This folder is already a repository. Nothing to do.",
            ));
        }

        if !path.is_dir() {
            return Err(Error::PreconditionFailed(format!(
                "Folder does not exist: {}",
                path.display()
            )));
        }

        self.git.run(path, &["init"]).await?;
        self.write_gitignore(path)?;
        self.git.run(path, &["add", "--all"]).await?;

        // an empty first commit still gives HEAD a well-defined target
        let commit = self
            .git
            .output(path, &["commit", "--allow-empty", "-m", INITIAL_COMMIT_MESSAGE])
            .await?;
        if !commit.success {
            return Err(Error::CommitFailed(commit.message()));
        }

        tracing::info!(path = %path.display(), "Repository initialized");
        Ok(WorkflowResult::completed("Repository successfully initialized"))
    }

    fn write_gitignore(&self, path: &Path) -> Result<()> {
        if self.gitignore.is_empty() {
            return Ok(());
        }

        let file = path.join(".gitignore");
        if file.exists() {
            return Ok(());
        }

        let mut contents = self.gitignore.join("\n");
        contents.push('\n');
        std::fs::write(&file, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::git::GitRepo;
    use crate::test_support::{git_available, test_git, write_file};
    use crate::workflow::RepositoryState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_repo_with_first_commit() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), "existing.txt", "keep me");

        let init = Initializer::new(test_git(), vec![".DS_Store".to_string()]);
        let result = init.init(temp.path()).await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.outcome, Outcome::Completed);
        assert_eq!(result.new_state, Some(RepositoryState::NoRemoteConfigured));

        let repo = GitRepo::open(temp.path()).unwrap();
        assert!(repo.head_oid().unwrap().is_some());
        assert_eq!(
            std::fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            ".DS_Store\n"
        );
    }

    #[tokio::test]
    async fn test_init_twice_is_soft_noop() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let init = Initializer::new(test_git(), Vec::new());

        assert!(init.init(temp.path()).await.success);
        let head = GitRepo::open(temp.path()).unwrap().head_oid().unwrap();

        let second = init.init(temp.path()).await;
        assert!(second.success);
        assert_eq!(second.outcome, Outcome::AlreadyInitialized);
        assert_eq!(GitRepo::open(temp.path()).unwrap().head_oid().unwrap(), head);
        // no gitignore when no entries are configured
        assert!(!temp.path().join(".gitignore").exists());
    }

    #[tokio::test]
    async fn test_existing_gitignore_is_kept() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        write_file(temp.path(), ".gitignore", "target/\n");

        let init = Initializer::new(test_git(), vec![".DS_Store".to_string()]);
        assert!(init.init(temp.path()).await.success);
        assert_eq!(
            std::fs::read_to_string(temp.path().join(".gitignore")).unwrap(),
            "target/\n"
        );
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let init = Initializer::new(test_git(), Vec::new());

        let result = init.init(&missing).await;
        assert!(!result.success);
        assert_eq!(result.failure(), Some(FailureKind::PreconditionFailed));
    }
}
