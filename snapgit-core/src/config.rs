//! Configuration management for snapgit
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (SNAPGIT_*)
//! 3. Config file (~/.config/snapgit/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::workflow::RetryPolicy;
use crate::{Error, Result};

/// Git executable settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path to the git executable
    pub program: String,

    /// Soft timeout for fetch and push
    #[serde(with = "humantime_serde")]
    pub network_timeout: Duration,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            network_timeout: Duration::from_secs(60),
        }
    }
}

/// Author identity forced onto commits, overriding git's own config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    /// user.name
    pub name: String,
    /// user.email
    pub email: String,
}

/// Snapshot commit settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Append " by <user>" to generated commit messages
    pub include_user: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { include_user: true }
    }
}

/// Repository initialization settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    /// Entries written to a fresh `.gitignore`; empty disables the file
    pub gitignore: Vec<String>,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            gitignore: vec![".DS_Store".to_string()],
        }
    }
}

/// How diverged histories are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Create a merge commit
    #[default]
    Merge,
    /// Replay local commits on top of the upstream
    Rebase,
}

/// Sync settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Merge or rebase when diverged
    pub strategy: SyncStrategy,

    /// Remote name used when connecting a new remote
    pub remote_name: String,

    /// Total attempts for a network operation (1 = no retry)
    pub max_attempts: u32,

    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,

    /// Upper bound on the retry delay
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: SyncStrategy::Merge,
            remote_name: "origin".to_string(),
            max_attempts: 2,
            backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Retry policy for fetch and push
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.backoff,
            multiplier: 2,
            max_backoff: self.max_backoff,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Git executable configuration
    pub git: GitConfig,

    /// Optional commit identity
    pub identity: Option<Identity>,

    /// Snapshot configuration
    pub snapshot: SnapshotConfig,

    /// Init configuration
    pub init: InitConfig,

    /// Sync configuration
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/snapgit/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("snapgit").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - SNAPGIT_GIT: Path to git executable
    /// - SNAPGIT_NETWORK_TIMEOUT: Network timeout, e.g. "90s"
    /// - SNAPGIT_AUTHOR_NAME / SNAPGIT_AUTHOR_EMAIL: Commit identity (both required)
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(program) = std::env::var("SNAPGIT_GIT") {
            self.git.program = program;
        }

        if let Ok(timeout) = std::env::var("SNAPGIT_NETWORK_TIMEOUT") {
            self.git.network_timeout = humantime_serde::re::humantime::parse_duration(&timeout)
                .map_err(|e| {
                    Error::Config(format!("Invalid SNAPGIT_NETWORK_TIMEOUT '{}': {}", timeout, e))
                })?;
        }

        if let (Ok(name), Ok(email)) = (
            std::env::var("SNAPGIT_AUTHOR_NAME"),
            std::env::var("SNAPGIT_AUTHOR_EMAIL"),
        ) {
            self.identity = Some(Identity { name, email });
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, git_program: Option<String>) -> Self {
        if let Some(program) = git_program {
            self.git.program = program;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(git_program: Option<String>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(git_program))
    }
}
