//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.

use clap::{Parser, Subcommand};
use td_core::{Config, ConfigManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod config;
mod get;
mod publish;

/// Environment variable that relocates the config directory
pub const CONFIG_DIR_VAR: &str = "TUBEDROP_CONFIG_DIR";

/// tubedrop - download media and publish it to Dropbox
///
/// Downloads a video or its audio track with yt-dlp and optionally uploads the
/// result to Dropbox, verifies it and prints a share link.
#[derive(Parser, Debug)]
#[command(name = "tubedrop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a video (or its audio) and optionally publish it
    Get(get::GetArgs),

    /// Upload an existing file to Dropbox and print a share link
    Publish(publish::PublishArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Get(args) => get::execute(args, output_config).await,
        Commands::Publish(args) => publish::execute(args, output_config).await,
        Commands::Config(cmd) => config::execute(cmd, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Config manager for the default location, or `$TUBEDROP_CONFIG_DIR` when set
pub(crate) fn config_manager() -> td_core::Result<ConfigManager> {
    match std::env::var_os(CONFIG_DIR_VAR) {
        Some(dir) if !dir.is_empty() => Ok(ConfigManager::in_dir(std::path::Path::new(&dir))),
        _ => ConfigManager::new(),
    }
}

/// Load the effective configuration, reporting failures through `formatter`
pub(crate) fn load_config(formatter: &Formatter) -> Result<Config, ExitCode> {
    config_manager()
        .and_then(|manager| manager.load())
        .map_err(|e| {
            formatter.error(&format!("Failed to load config: {e}"));
            ExitCode::from_error(&e)
        })
}
