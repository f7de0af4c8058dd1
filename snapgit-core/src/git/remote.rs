//! Remote URL validation and classification of remote failures

use std::path::Path;

use crate::{Error, Result};

/// Failures worth another attempt
const TRANSIENT_PATTERNS: &[&str] = &[
    "could not resolve host",
    "temporary failure in name resolution",
    "connection timed out",
    "operation timed out",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "the remote end hung up unexpectedly",
    "early eof",
    "rpc failed",
];

/// Transport failures where retrying cannot help
const PERMANENT_NETWORK_PATTERNS: &[&str] = &[
    "authentication failed",
    "permission denied",
    "could not read username",
    "could not read password",
    "terminal prompts disabled",
    "host key verification failed",
    "repository not found",
    "does not appear to be a git repository",
];

/// Transport failures of unknown cause; surfaced without retry
const GENERIC_NETWORK_PATTERNS: &[&str] = &[
    "unable to access",
    "could not read from remote repository",
    "ssl",
];

/// The remote moved ahead of us
const REJECTED_PATTERNS: &[&str] = &[
    "[rejected]",
    "non-fast-forward",
    "fetch first",
    "updates were rejected",
    "[remote rejected]",
];

/// Classify the stderr of a failed `git fetch`
pub fn classify_fetch_failure(stderr: &str) -> Error {
    classify_network(stderr).unwrap_or_else(|| Error::Command {
        command: "fetch".to_string(),
        stderr: stderr.trim().to_string(),
    })
}

/// Classify the stderr of a failed `git push`
///
/// Rejections take priority: git reports a rejected push with a generic
/// "failed to push some refs" line that must not be read as a network error.
pub fn classify_push_failure(stderr: &str) -> Error {
    let lower = stderr.to_lowercase();
    if REJECTED_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Error::PushRejected(rejection_line(stderr));
    }

    classify_network(stderr).unwrap_or_else(|| Error::Command {
        command: "push".to_string(),
        stderr: stderr.trim().to_string(),
    })
}

fn classify_network(stderr: &str) -> Option<Error> {
    let lower = stderr.to_lowercase();

    if PERMANENT_NETWORK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Error::Network {
            message: stderr.trim().to_string(),
            transient: false,
        });
    }

    if TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Error::Network {
            message: stderr.trim().to_string(),
            transient: true,
        });
    }

    if GENERIC_NETWORK_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(Error::Network {
            message: stderr.trim().to_string(),
            transient: false,
        });
    }

    None
}

fn rejection_line(text: &str) -> String {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    lines
        .clone()
        .find(|l| l.contains("rejected]"))
        .or_else(|| lines.next())
        .unwrap_or_default()
        .to_string()
}

/// Validate a remote URL before handing it to git
///
/// Accepts:
/// - `https://host/owner/repo(.git)` (and `http`, `ssh`, `git`, `file` schemes)
/// - `user@host:owner/repo.git` (scp-like SSH)
/// - an existing local directory, relative paths resolved against `base`
///
/// Local paths come back absolute, so git sees the same directory no
/// matter where the process was started.
pub fn validate_remote_url(input: &str, base: &Path) -> Result<String> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::PreconditionFailed(
            "Remote URL must not be empty".to_string(),
        ));
    }

    if input.contains("://") {
        let parsed = url::Url::parse(input).map_err(|e| {
            Error::PreconditionFailed(format!("Invalid remote URL '{}': {}", input, e))
        })?;

        return match parsed.scheme() {
            "https" | "http" | "ssh" | "git" => {
                if parsed.host_str().unwrap_or_default().is_empty() {
                    Err(Error::PreconditionFailed(format!(
                        "Remote URL '{}' has no host",
                        input
                    )))
                } else {
                    Ok(input.to_string())
                }
            }
            "file" => Ok(input.to_string()),
            other => Err(Error::PreconditionFailed(format!(
                "Unsupported remote URL scheme '{}'. Use https://, ssh:// or git@host:owner/repo.git",
                other
            ))),
        };
    }

    // scp-like: user@host:path
    if let Some((user_host, path)) = input.split_once(':') {
        if let Some((user, host)) = user_host.split_once('@') {
            if !user.is_empty() && !host.is_empty() && !path.is_empty() {
                return Ok(input.to_string());
            }
        }
    }

    let local = base.join(input);
    if local.is_dir() {
        if let Some(local) = local.to_str() {
            return Ok(local.to_string());
        }
    }

    Err(Error::PreconditionFailed(format!(
        "Invalid remote URL: {}. Expected format: https://github.com/owner/repo, git@github.com:owner/repo.git, or a local path",
        input
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_dns_failure_is_transient() {
        let err = classify_fetch_failure(
            "fatal: unable to access 'https://example.invalid/x.git/': Could not resolve host: example.invalid",
        );
        assert!(matches!(err, Error::Network { transient: true, .. }));
    }

    #[test]
    fn test_fetch_auth_failure_is_permanent() {
        let err = classify_fetch_failure(
            "remote: Invalid username or password.\nfatal: Authentication failed for 'https://github.com/o/r.git/'",
        );
        assert!(matches!(err, Error::Network { transient: false, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_fetch_unknown_failure_is_command_error() {
        let err = classify_fetch_failure("fatal: couldn't find remote ref refs/heads/nope");
        assert!(matches!(err, Error::Command { ref command, .. } if command == "fetch"));
    }

    #[test]
    fn test_push_rejection() {
        let stderr = "To /tmp/remote.git\n ! [rejected]        main -> main (fetch first)\nerror: failed to push some refs to '/tmp/remote.git'\nhint: Updates were rejected because the remote contains work that you do not have locally.";
        let err = classify_push_failure(stderr);
        match err {
            Error::PushRejected(line) => {
                assert_eq!(line, "! [rejected]        main -> main (fetch first)")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_push_network_failure() {
        let err = classify_push_failure(
            "ssh: connect to host github.com port 22: Connection timed out\nfatal: Could not read from remote repository.",
        );
        assert!(matches!(err, Error::Network { transient: true, .. }));

        let err = classify_push_failure(
            "git@github.com: Permission denied (publickey).\nfatal: Could not read from remote repository.",
        );
        assert!(matches!(err, Error::Network { transient: false, .. }));

        let err = classify_push_failure(
            "fatal: unable to access 'https://example.com/r.git/': The requested URL returned error: 500",
        );
        assert!(matches!(err, Error::Network { transient: false, .. }));

        let err = classify_push_failure("error: RPC failed; curl 56 Recv failure: Connection reset by peer");
        assert!(matches!(err, Error::Network { transient: true, .. }));
    }

    #[test]
    fn test_validate_remote_urls() {
        let base = Path::new("/");
        assert!(validate_remote_url("https://github.com/owner/repo.git", base).is_ok());
        assert!(validate_remote_url("ssh://git@example.com/owner/repo.git", base).is_ok());
        assert!(validate_remote_url("git@github.com:owner/repo.git", base).is_ok());
        assert!(validate_remote_url("file:///srv/git/repo.git", base).is_ok());

        let temp = tempfile::TempDir::new().unwrap();
        let abs = temp.path().to_str().unwrap();
        assert_eq!(validate_remote_url(abs, base).unwrap(), abs);
    }

    #[test]
    fn test_relative_path_resolves_against_base() {
        let temp = tempfile::TempDir::new().unwrap();
        let repo = temp.path().join("work");
        let remote = temp.path().join("remote.git");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::create_dir_all(&remote).unwrap();

        let resolved = validate_remote_url("../remote.git", &repo).unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(Path::new(&resolved).is_dir());
        assert_eq!(
            std::fs::canonicalize(&resolved).unwrap(),
            std::fs::canonicalize(&remote).unwrap()
        );

        // same input from an unrelated directory names nothing
        let elsewhere = tempfile::TempDir::new().unwrap();
        let unrelated = elsewhere.path().join("a");
        std::fs::create_dir_all(&unrelated).unwrap();
        let err = validate_remote_url("../remote.git", &unrelated).unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }

    #[test]
    fn test_validate_remote_url_rejects_garbage() {
        let base = Path::new("/");
        assert!(validate_remote_url("", base).is_err());
        assert!(validate_remote_url("not a url", base).is_err());
        assert!(validate_remote_url("ftp://example.com/repo", base).is_err());
        assert!(validate_remote_url("@host:", base).is_err());
    }
}
