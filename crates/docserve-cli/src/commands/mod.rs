//! CLI command definitions and dispatch.

pub mod config;
pub mod formats;
pub mod probe;
pub mod render;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;
use docserve_plugin::Plugin;
use plugin_pandoc::{MiniJinjaEngine, PandocPlugin, PandocRenderer};

use crate::output::DisplayFormat;

/// Docserve: render templates into documents through pandoc
#[derive(Debug, Parser)]
#[command(name = "docserve", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding `default.toml` and environment overlays
    #[arg(long, env = "DOCSERVE_CONFIG_DIR", default_value = "config", global = true)]
    pub config_dir: String,

    /// Configuration environment overlay to apply
    #[arg(long, env = "DOCSERVE_ENV", default_value = "development", global = true)]
    pub env: String,

    /// How results are printed
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub display: DisplayFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe the converter and print what it supports
    Probe,
    /// List the format catalog with support flags
    Formats,
    /// Render a template and convert it
    Render(render::RenderArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Probe => probe::execute(&config, self.display).await,
            Commands::Formats => formats::execute(&config, self.display).await,
            Commands::Render(args) => render::execute(args, &config).await,
            Commands::Config(args) => config::execute(args, &config, &self.config_dir),
        }
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config_dir, &self.env)
    }
}

/// Load the pandoc plugin and return its renderer.
pub async fn load_renderer(config: &AppConfig) -> Result<Arc<PandocRenderer>, AppError> {
    let engine = Arc::new(MiniJinjaEngine::new(&config.templates.root));
    let plugin = PandocPlugin::new(config.pandoc.clone(), engine);
    plugin.on_load().await?;
    Ok(plugin.renderer()?)
}
