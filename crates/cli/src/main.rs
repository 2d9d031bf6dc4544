//! gowatch CLI - rebuild and restart a Go application on change

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod cmd;

/// gowatch - watch, rebuild and restart your Go application
#[derive(Parser)]
#[command(name = "gowatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Enable debug logging (the version is shown by -V)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example gowatch.toml in the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Config file (default: ./gowatch.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output artifact path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Packages to build, comma separated
    #[arg(short, long)]
    packages: Option<String>,

    /// Arguments for the application, comma separated
    #[arg(long = "args", allow_hyphen_values = true)]
    run_args: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Some(Commands::Init { force }) => cmd::init::run(force),
        None => {
            let options = cmd::run::RunOptions {
                config: cli.run.config,
                overrides: gowatch_core::Overrides {
                    output: cli.run.output,
                    packages: cli.run.packages,
                    run_args: cli.run.run_args,
                },
            };
            cmd::run::run(options).await
        }
    }
}
