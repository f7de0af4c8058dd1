//! Snapgit CLI - one-button snapshots and sync for a folder under git

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use snapgit_core::{Action, Config, RepoContext, WorkflowFacade};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{RemoteArgs, StatusArgs};

/// Snapgit: save snapshots of a folder and keep it in sync with a remote
#[derive(Parser, Debug)]
#[command(name = "snapgit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Folder to operate on (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    /// Path to git executable (overrides config and env)
    #[arg(long, global = true, env = "SNAPGIT_GIT")]
    git: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that git is installed
    Check,

    /// Show the folder's state and the suggested next action
    #[command(visible_alias = "st")]
    Status(StatusArgs),

    /// Turn the folder into a repository
    Init,

    /// Save every change as a snapshot
    #[command(visible_alias = "save")]
    Commit,

    /// Receive and send snapshots
    Sync,

    /// Connect the repository to a remote
    Remote(RemoteArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so `status --json` stays parseable
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.git.clone())?;

    if cli.verbose {
        tracing::info!(
            git = %config.git.program,
            strategy = ?config.sync.strategy,
            "Configuration loaded"
        );
    }

    let ctx = match &cli.dir {
        Some(dir) => RepoContext::new(dir.clone())?,
        None => RepoContext::current_dir()?,
    };

    let facade = WorkflowFacade::new(config);

    match cli.command {
        Some(Commands::Check) => {
            commands::check::execute(facade.config()).await?;
        }
        Some(Commands::Status(args)) => {
            args.execute(&facade, &ctx).await?;
        }
        Some(Commands::Init) => {
            commands::action::execute(&facade, &ctx, Action::Init).await?;
        }
        Some(Commands::Commit) => {
            commands::action::execute(&facade, &ctx, Action::Commit).await?;
        }
        Some(Commands::Sync) => {
            commands::action::execute(&facade, &ctx, Action::Sync).await?;
        }
        Some(Commands::Remote(args)) => {
            args.execute(&facade, &ctx).await?;
        }
        Some(Commands::Config) => {
            let config = facade.config();
            println!("Snapgit Configuration");
            println!("=====================");
            println!();
            println!("Git Settings:");
            println!("  program: {}", config.git.program);
            println!("  network_timeout: {:?}", config.git.network_timeout);
            match &config.identity {
                Some(identity) => println!("  identity: {} <{}>", identity.name, identity.email),
                None => println!("  identity: (from git config)"),
            }
            println!();
            println!("Sync Settings:");
            println!("  strategy: {:?}", config.sync.strategy);
            println!("  remote_name: {}", config.sync.remote_name);
            println!("  max_attempts: {}", config.sync.max_attempts);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            StatusArgs::default().execute(&facade, &ctx).await?;
        }
    }

    Ok(())
}
