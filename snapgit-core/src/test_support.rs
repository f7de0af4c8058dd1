//! Fixtures shared by the unit tests

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::{Config, Identity};
use crate::git::GitCommand;

/// Whether a git executable is on PATH; tests needing it return early otherwise
pub fn git_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

pub fn test_identity() -> Identity {
    Identity {
        name: "Snapgit Test".to_string(),
        email: "test@snapgit.invalid".to_string(),
    }
}

pub fn test_git() -> GitCommand {
    GitCommand::new("git").with_identity(test_identity())
}

/// Default config with a fixed identity and no retry delay
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.identity = Some(test_identity());
    config.sync.backoff = Duration::ZERO;
    config.sync.max_backoff = Duration::ZERO;
    config
}

/// Run git synchronously, panicking on failure; returns stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let identity = test_identity();
    let output = Command::new("git")
        .arg("-c")
        .arg(format!("user.name={}", identity.name))
        .arg("-c")
        .arg(format!("user.email={}", identity.email))
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .env("LC_ALL", "C")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn write_file(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// A bare remote, a local clone tracking it, and a second clone for remote-side commits
pub struct RemoteFixture {
    _temp: TempDir,
    pub remote: PathBuf,
    pub local: PathBuf,
    pub other: PathBuf,
}

impl RemoteFixture {
    /// Both working copies start clean and in step, holding `shared.txt`
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let remote = temp.path().join("remote.git");
        let local = temp.path().join("local");
        let other = temp.path().join("other");
        std::fs::create_dir_all(&local).unwrap();

        git(temp.path(), &["init", "--bare", remote.to_str().unwrap()]);
        git(&local, &["init"]);
        write_file(&local, "shared.txt", "base\n");
        git(&local, &["add", "--all"]);
        git(&local, &["commit", "-m", "base"]);
        git(&local, &["remote", "add", "origin", remote.to_str().unwrap()]);
        git(&local, &["push", "-u", "origin", "HEAD"]);

        let branch = git(&local, &["rev-parse", "--abbrev-ref", "HEAD"]);
        git(
            temp.path(),
            &[
                "clone",
                "-b",
                branch.trim(),
                remote.to_str().unwrap(),
                other.to_str().unwrap(),
            ],
        );

        Self {
            _temp: temp,
            remote,
            local,
            other,
        }
    }

    /// Commit a file in the second clone and push it
    pub fn push_from_other(&self, rel: &str, contents: &str, message: &str) {
        write_file(&self.other, rel, contents);
        git(&self.other, &["add", "--all"]);
        git(&self.other, &["commit", "-m", message]);
        git(&self.other, &["push"]);
    }
}
