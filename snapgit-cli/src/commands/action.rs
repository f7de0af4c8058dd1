//! Init, commit and sync: run one action and report its result

use snapgit_core::{Action, RepoContext, WorkflowFacade, WorkflowResult};

/// Run `action`, print its message, and fail if the action failed
pub async fn execute(
    facade: &WorkflowFacade,
    ctx: &RepoContext,
    action: Action,
) -> anyhow::Result<()> {
    let result = facade.run(ctx, action).await;
    report(result)
}

/// Print a result; failures become the command's error
pub fn report(result: WorkflowResult) -> anyhow::Result<()> {
    if !result.success {
        anyhow::bail!("{}", result.message);
    }

    println!("{}", result.message);
    if let Some(state) = result.new_state {
        println!("Now: {}", state);
    }
    Ok(())
}
