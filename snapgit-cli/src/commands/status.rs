//! Status command - show the folder's state and what to do next

use clap::Args;
use snapgit_core::{RepoContext, RepositoryState, ToolAvailability, WorkflowFacade};

/// Show the folder's state
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, facade: &WorkflowFacade, ctx: &RepoContext) -> anyhow::Result<()> {
        let report = facade.startup(ctx).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("Folder: {}", ctx.path().display());
        if report.tool == ToolAvailability::Missing {
            println!("git: not found");
        }
        println!("State:  {}", report.state);

        if let RepositoryState::Dirty(paths) = &report.state {
            for path in paths.iter().take(10) {
                println!("  {}", path);
            }
            if paths.len() > 10 {
                println!("  ... and {} more", paths.len() - 10);
            }
        }

        match report.primary_action {
            Some(action) => println!("Next:   {}", action),
            None => println!("Next:   nothing to do"),
        }

        Ok(())
    }
}
