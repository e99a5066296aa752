//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;

use crate::output;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration as JSON
    Show,
    /// Check that the configuration loads and validates
    Validate,
}

/// Execute config commands. `config` has already been loaded and validated.
pub fn execute(args: &ConfigArgs, config: &AppConfig, config_dir: &str) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => output::print_json(config),
        ConfigCommand::Validate => {
            output::print_success(&format!("Configuration in '{config_dir}' is valid"));
            output::print_kv("Listen", &config.server.bind_address());
            output::print_kv("Templates", &config.templates.root);
            output::print_kv("Converter", &config.pandoc.executable);
            output::print_kv("Conversion", if config.pandoc.enabled { "enabled" } else { "disabled" });
            output::print_kv("Log level", &config.logging.level);
        }
    }
    Ok(())
}
