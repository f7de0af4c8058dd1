//! Git integration layer
//!
//! Read-only queries (repository discovery, status, upstream comparison) go
//! through libgit2. Anything that mutates the repository or talks to a
//! remote runs the git executable, so credentials and hooks behave exactly
//! as they do on the user's command line.

mod command;
mod remote;
mod repo;

pub use command::{GitCommand, GitOutput};
pub use remote::{classify_fetch_failure, classify_push_failure, validate_remote_url};
pub use repo::{GitRepo, RemoteInfo, Upstream};
