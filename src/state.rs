//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;
use docserve_plugin::PluginManager;
use plugin_pandoc::{MiniJinjaEngine, PandocPlugin, PandocRenderer};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Effective configuration.
    pub config: Arc<AppConfig>,
    /// Loaded plugins.
    pub plugins: Arc<PluginManager>,
    /// Renderer of the pandoc plugin.
    pub renderer: Arc<PandocRenderer>,
    /// When the state was built.
    pub started_at: Instant,
}

impl AppState {
    /// Build the state from configuration, probing the converter.
    pub async fn initialize(config: AppConfig) -> Result<Self, AppError> {
        let engine = Arc::new(MiniJinjaEngine::new(&config.templates.root));
        let plugin = Arc::new(PandocPlugin::new(config.pandoc.clone(), engine));
        Self::with_plugin(config, plugin).await
    }

    /// Build the state around an already constructed plugin.
    pub async fn with_plugin(config: AppConfig, plugin: Arc<PandocPlugin>) -> Result<Self, AppError> {
        let plugins = Arc::new(PluginManager::new());
        plugins.load_plugin(plugin.clone()).await?;
        let renderer = plugin.renderer()?;

        Ok(Self {
            config: Arc::new(config),
            plugins,
            renderer,
            started_at: Instant::now(),
        })
    }
}
