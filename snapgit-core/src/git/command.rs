//! Child-process runner for the git executable

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::config::{Config, Identity};
use crate::{Error, Result};

/// Captured result of a git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Whether git exited with status 0
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl GitOutput {
    /// The most useful human-readable text: stderr, else stdout
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs git subcommands in a directory
///
/// Every invocation pins the C locale so stderr can be matched reliably,
/// and forces the configured identity (if any) via `-c user.*`.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
    identity: Option<Identity>,
    network_timeout: Duration,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GitCommand {
    /// Create a runner for the given executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            identity: None,
            network_timeout: Duration::from_secs(60),
        }
    }

    /// Create a runner from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.git.program.clone(),
            identity: config.identity.clone(),
            network_timeout: config.git.network_timeout,
        }
    }

    /// Force an author/committer identity
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Override the network timeout
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// The git executable this runner invokes
    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(ref identity) = self.identity {
            cmd.arg("-c")
                .arg(format!("user.name={}", identity.name))
                .arg("-c")
                .arg(format!("user.email={}", identity.email));
        }
        cmd.args(args)
            .current_dir(dir)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn git and wait for it, without interpreting the exit status
    ///
    /// A missing executable maps to [`Error::ToolMissing`].
    pub async fn output(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        tracing::debug!(dir = %dir.display(), args = ?args, "git");

        let output = self.command(dir, args).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ToolMissing(self.program.clone())
            } else {
                Error::Io(e)
            }
        })?;

        Ok(GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`GitCommand::output`], but kills git once the network timeout elapses
    pub async fn output_with_timeout(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        match tokio::time::timeout(self.network_timeout, self.output(dir, args)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    args = ?args,
                    timeout_ms = self.network_timeout.as_millis() as u64,
                    "git timed out, killed"
                );
                Err(Error::Timeout {
                    command: subcommand(args),
                    after: self.network_timeout,
                })
            }
        }
    }

    /// Run git and fail with [`Error::Command`] on a non-zero exit
    pub async fn run(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        let output = self.output(dir, args).await?;
        if !output.success {
            return Err(Error::Command {
                command: subcommand(args),
                stderr: output.message(),
            });
        }
        Ok(output)
    }
}

fn subcommand(args: &[&str]) -> String {
    args.first().copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::git_available;

    #[tokio::test]
    async fn test_missing_program_is_tool_missing() {
        let git = GitCommand::new("/nonexistent/path/to/git-12345");
        let err = git
            .output(&std::env::temp_dir(), &["--version"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolMissing(_)));
    }

    #[tokio::test]
    async fn test_run_reports_failing_subcommand() {
        if !git_available() {
            return;
        }
        let temp = tempfile::TempDir::new().unwrap();
        let err = GitCommand::default()
            .run(temp.path(), &["rev-parse", "HEAD"])
            .await
            .unwrap_err();
        match err {
            Error::Command { command, stderr } => {
                assert_eq!(command, "rev-parse");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_network_call_is_killed() {
        use crate::error::FailureKind;
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let temp = tempfile::TempDir::new().unwrap();
        let fake_git = temp.path().join("git");
        std::fs::write(&fake_git, "#!/bin/sh\nsleep 30\n").unwrap();
        std::fs::set_permissions(&fake_git, std::fs::Permissions::from_mode(0o755)).unwrap();

        let git = GitCommand::new(fake_git.to_string_lossy())
            .with_network_timeout(Duration::from_millis(300));

        let started = Instant::now();
        let err = git
            .output_with_timeout(temp.path(), &["fetch", "origin"])
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(&err, Error::Timeout { command, .. } if command == "fetch"));
        assert_eq!(err.kind(), FailureKind::NetworkError);
        assert!(err.is_transient());
        assert!(err.to_string().contains("300ms"), "{}", err);
    }

    #[test]
    fn test_message_prefers_stderr() {
        let out = GitOutput {
            success: false,
            code: Some(1),
            stdout: "nothing added to commit\n".to_string(),
            stderr: "  fatal: bad thing \n".to_string(),
        };
        assert_eq!(out.message(), "fatal: bad thing");

        let out = GitOutput {
            stderr: String::new(),
            ..out
        };
        assert_eq!(out.message(), "nothing added to commit");
    }
}
