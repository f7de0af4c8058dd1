//! Check command - is git installed?

use snapgit_core::git::GitCommand;
use snapgit_core::workflow::ToolProbe;
use snapgit_core::Config;

/// Print the git version, or fail if git cannot be run
pub async fn execute(config: &Config) -> anyhow::Result<()> {
    let git = GitCommand::from_config(config);
    let program = git.program().to_string();
    let probe = ToolProbe::new(git);

    match probe.version().await? {
        Some(version) => {
            println!("{}", version);
            Ok(())
        }
        None => anyhow::bail!(
            "git was not found at '{}'. Install git or point --git at it.",
            program
        ),
    }
}
