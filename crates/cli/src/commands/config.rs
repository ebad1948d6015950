//! Configuration commands
//!
//! Show the effective configuration, write a default file, or print where the
//! file lives.

use clap::Subcommand;
use serde::Serialize;
use td_core::Config;

use super::config_manager;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file
    Init(InitArgs),

    /// Print the configuration file path
    Path,
}

/// Arguments for the `config init` command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long, default_value = "false")]
    pub force: bool,
}

#[derive(Serialize)]
struct PathOutput {
    path: String,
    exists: bool,
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match config_manager() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to locate config directory: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    match cmd {
        ConfigCommands::Show => match manager.load() {
            Ok(config) => {
                show(&formatter, &config);
                ExitCode::Success
            }
            Err(e) => {
                formatter.error(&format!("Failed to load config: {e}"));
                ExitCode::from_error(&e)
            }
        },
        ConfigCommands::Init(args) => {
            let path = manager.config_path();
            if path.exists() && !args.force {
                formatter.error(&format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
                return ExitCode::Conflict;
            }

            match manager.save(&Config::default()) {
                Ok(()) => {
                    if formatter.is_json() {
                        formatter.json(&PathOutput {
                            path: path.display().to_string(),
                            exists: true,
                        });
                    } else {
                        formatter.success(&format!("Wrote {}", path.display()));
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to write config: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
        ConfigCommands::Path => {
            let path = manager.config_path();
            if formatter.is_json() {
                formatter.json(&PathOutput {
                    path: path.display().to_string(),
                    exists: path.exists(),
                });
            } else {
                formatter.println(&path.display().to_string());
            }
            ExitCode::Success
        }
    }
}

fn show(formatter: &Formatter, config: &Config) {
    if formatter.is_json() {
        formatter.json(config);
        return;
    }

    match toml::to_string_pretty(config) {
        Ok(text) => formatter.println(text.trim_end()),
        Err(e) => formatter.error(&format!("Failed to render config: {e}")),
    }
}
