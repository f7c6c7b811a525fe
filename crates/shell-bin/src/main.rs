//! TweakBench shell - privileged host process for authentication coordination.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shell_config::{init_logging, Config, Paths};

/// TweakBench shell command-line interface.
///
/// The OS hands deep-link activations to the shell as a bare positional
/// argument (`tweakbench-shell tweakbench://auth/callback?data=...`), so the
/// activation URL and the subcommands are mutually exclusive.
#[derive(Parser)]
#[command(name = "tweakbench-shell")]
#[command(about = "TweakBench shell host for authentication coordination")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Deep-link activation URL handed over by the OS
    activation_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for runtime files (sockets, config). Defaults to ~/.tweakbench
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a shell instance is running
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    match cli.command {
        Some(Commands::Status) => {
            app::check_status(&paths).await?;
        }
        None => {
            app::run_shell(config, paths, cli.activation_url).await?;
        }
    }

    Ok(())
}
