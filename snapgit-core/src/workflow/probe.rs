//! Git executable availability check

use crate::git::GitCommand;
use crate::{Error, Result};

/// Checks that the git executable can be run
#[derive(Debug, Clone, Default)]
pub struct ToolProbe {
    git: GitCommand,
}

impl ToolProbe {
    /// Check the given runner
    pub fn new(git: GitCommand) -> Self {
        Self { git }
    }

    /// Run `git --version`
    ///
    /// A missing executable is `Ok(false)`, not an error. Only faults such as
    /// being unable to spawn any process are returned as `Err`.
    pub async fn is_git_available(&self) -> Result<bool> {
        Ok(self.version().await?.is_some())
    }

    /// The version banner, e.g. "git version 2.43.0"
    pub async fn version(&self) -> Result<Option<String>> {
        let output = match self
            .git
            .output(&std::env::temp_dir(), &["--version"])
            .await
        {
            Ok(output) => output,
            Err(Error::ToolMissing(program)) => {
                tracing::debug!(program = %program, "git executable not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let banner = output.stdout.trim();
        if output.success && !banner.is_empty() {
            Ok(Some(banner.to_string()))
        } else {
            Ok(None)
        }
    }
}
