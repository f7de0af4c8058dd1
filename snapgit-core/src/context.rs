//! Explicit working-directory context

use std::path::{Path, PathBuf};

use crate::Result;

/// The directory every workflow operation acts on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoContext {
    path: PathBuf,
}

impl RepoContext {
    /// Create a context for the given directory
    ///
    /// Relative paths are resolved against the current directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(Self { path })
    }

    /// Context for the process's current working directory
    pub fn current_dir() -> Result<Self> {
        Ok(Self {
            path: std::env::current_dir()?,
        })
    }

    /// The directory operations act on
    pub fn path(&self) -> &Path {
        &self.path
    }
}
