//! CLI command definitions and dispatch.

pub mod login;
pub mod plan;
pub mod sync;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use imgsync_common::constants;

/// imgsync — mirror container images between registries with skopeo.
#[derive(Parser, Debug)]
#[command(name = constants::APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path or name of the skopeo binary.
    #[arg(long, global = true, env = "IMGSYNC_SKOPEO")]
    pub skopeo: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in, resolve the images file, and copy every pair.
    Sync(sync::SyncArgs),
    /// Resolve the images file and print the pairs without copying.
    Plan(plan::PlanArgs),
    /// Log in to every registry of the auth file.
    Login(login::LoginArgs),
}

/// Options shared by commands that resolve an images file.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Images file mapping source references to destinations.
    #[arg(long, env = "INPUT_IMAGES_FILE", default_value = constants::DEFAULT_IMAGES_FILE)]
    pub images_file: PathBuf,

    /// Number of source keys resolved concurrently.
    #[arg(long, env = "IMGSYNC_CONCURRENCY", default_value_t = constants::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Sync(args) => sync::execute(args, cli.skopeo).await,
        Command::Plan(args) => plan::execute(args, cli.skopeo).await,
        Command::Login(args) => login::execute(args, cli.skopeo).await,
    }
}
