//! Remote command - connect a first remote

use clap::Args;
use snapgit_core::{RepoContext, WorkflowFacade};

use super::action::report;

/// Connect the repository to a remote
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Remote URL (https, ssh, scp-like user@host:path) or a local path
    url: String,
}

impl RemoteArgs {
    /// Execute the remote command
    pub async fn execute(&self, facade: &WorkflowFacade, ctx: &RepoContext) -> anyhow::Result<()> {
        report(facade.connect_remote(ctx, self.url.as_str()).await)
    }
}
