//! Git repository detection and read-only queries

use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Oid, Repository, Status, StatusOptions};

use crate::{Error, Result};

/// Information about a git remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    /// Name of the remote (e.g., "origin")
    pub name: String,
    /// URL of the remote
    pub url: String,
}

/// The upstream a local branch tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Remote name (e.g., "origin")
    pub remote: String,
    /// Branch ref on the remote (e.g., "refs/heads/main")
    pub merge_ref: String,
    /// Local remote-tracking ref (e.g., "refs/remotes/origin/main")
    pub tracking_ref: String,
}

impl Upstream {
    /// Branch name on the remote (e.g., "main")
    pub fn branch(&self) -> &str {
        self.merge_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.merge_ref)
    }
}

/// A git repository wrapper providing snapgit-specific queries
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the working tree root
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// This will search upward from the given path to find the repository root.
    /// Bare repositories have no working tree and are reported as not a repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::NotARepository(path.to_path_buf())
            } else {
                Error::Git(e)
            }
        })?;

        let root = repo
            .workdir()
            .ok_or_else(|| Error::NotARepository(path.to_path_buf()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Open, mapping "no repository here" to `None`
    pub fn try_open(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::open(path) {
            Ok(repo) => Ok(Some(repo)),
            Err(Error::NotARepository(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staged, unstaged and untracked paths, sorted
    ///
    /// Ignored files and submodules are excluded.
    pub fn uncommitted_paths(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut paths: Vec<String> = statuses
            .iter()
            .filter(|entry| {
                let status = entry.status();
                status != Status::CURRENT && !status.contains(Status::IGNORED)
            })
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect();

        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Get the current branch name
    ///
    /// `None` for a detached HEAD. An unborn branch (no commits yet) still
    /// reports its name.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                return self.unborn_branch_name();
            }
            Err(e) => return Err(Error::Git(e)),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            // Detached HEAD
            Ok(None)
        }
    }

    fn unborn_branch_name(&self) -> Result<Option<String>> {
        let head = self.repo.find_reference("HEAD")?;
        Ok(head
            .symbolic_target()
            .and_then(|t| t.strip_prefix("refs/heads/"))
            .map(|s| s.to_string()))
    }

    /// Commit HEAD points at, `None` before the first commit
    pub fn head_oid(&self) -> Result<Option<Oid>> {
        match self.repo.head() {
            Ok(head) => Ok(head.target()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Git(e)),
        }
    }

    /// The upstream configured for the current branch
    ///
    /// `None` when HEAD is detached, unborn, or the branch tracks nothing.
    pub fn upstream(&self) -> Result<Option<Upstream>> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(Error::Git(e)),
        };

        if !head.is_branch() {
            return Ok(None);
        }

        let Some(refname) = head.name() else {
            return Ok(None);
        };

        let tracking_ref = match self.repo.branch_upstream_name(refname) {
            Ok(buf) => buf.as_str().unwrap_or_default().to_string(),
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(Error::Git(e)),
        };
        let remote = self.repo.branch_upstream_remote(refname)?;
        let short = refname.strip_prefix("refs/heads/").unwrap_or(refname);
        let merge_ref = self
            .repo
            .config()?
            .get_string(&format!("branch.{}.merge", short))?;

        Ok(Some(Upstream {
            remote: remote.as_str().unwrap_or_default().to_string(),
            merge_ref,
            tracking_ref,
        }))
    }

    /// Commits local HEAD has that the upstream lacks, and vice versa
    ///
    /// When the remote-tracking ref does not exist yet (nothing fetched or the
    /// branch was never pushed), every local commit counts as ahead.
    pub fn ahead_behind(&self, upstream: &Upstream) -> Result<(usize, usize)> {
        let Some(local) = self.head_oid()? else {
            return Ok((0, 0));
        };

        match self.repo.find_reference(&upstream.tracking_ref) {
            Ok(reference) => {
                let remote = reference.peel_to_commit()?.id();
                Ok(self.repo.graph_ahead_behind(local, remote)?)
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                let mut walk = self.repo.revwalk()?;
                walk.push(local)?;
                Ok((walk.count(), 0))
            }
            Err(e) => Err(Error::Git(e)),
        }
    }

    /// Paths with unresolved conflicts in the index
    pub fn conflicted_paths(&self) -> Result<Vec<String>> {
        let index = self.repo.index()?;
        if !index.has_conflicts() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                paths.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Whether a local branch with this name exists on the remote-tracking side
    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> bool {
        self.repo
            .find_branch(&format!("{}/{}", remote, branch), BranchType::Remote)
            .is_ok()
    }

    /// Look up a remote by name
    pub fn find_remote(&self, name: &str) -> Option<RemoteInfo> {
        let remote = self.repo.find_remote(name).ok()?;
        remote.url().map(|url| RemoteInfo {
            name: name.to_string(),
            url: url.to_string(),
        })
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}
