//! Plugin lifecycle: load, start, stop and unload.

use std::sync::Arc;

use tracing::{error, info, warn};

use docserve_core::error::AppError;

use crate::registry::{Plugin, PluginInfo, PluginRegistry};

/// Manages the full lifecycle of plugins: load, start, stop, unload.
#[derive(Debug, Default)]
pub struct PluginManager {
    /// Plugin registry.
    plugin_registry: Arc<PluginRegistry>,
}

impl PluginManager {
    /// Creates a new plugin manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and starts a compiled-in plugin.
    pub async fn load_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<(), AppError> {
        let info = plugin.info();
        let plugin_id = info.id.clone();

        plugin.on_load().await.map_err(|e| {
            AppError::plugin(format!("Plugin '{}' load failed: {}", plugin_id, e))
        })?;

        self.plugin_registry.register(plugin.clone()).await?;

        plugin.on_start().await.map_err(|e| {
            error!(plugin_id = %plugin_id, error = %e, "Plugin start failed");
            AppError::plugin(format!("Plugin '{}' start failed: {}", plugin_id, e))
        })?;

        info!(
            plugin_id = %plugin_id,
            name = %info.name,
            version = %info.version,
            "Plugin loaded and started"
        );

        Ok(())
    }

    /// Stops and unloads a plugin.
    pub async fn unload_plugin(&self, plugin_id: &str) -> Result<(), AppError> {
        let plugin = self
            .plugin_registry
            .get(plugin_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Plugin '{}' not found", plugin_id)))?;

        if let Err(e) = plugin.on_stop().await {
            warn!(plugin_id = %plugin_id, error = %e, "Plugin stop returned error");
        }

        self.plugin_registry.unregister(plugin_id).await?;

        if let Err(e) = plugin.on_unload().await {
            warn!(plugin_id = %plugin_id, error = %e, "Plugin unload returned error");
        }

        info!(plugin_id = %plugin_id, "Plugin unloaded");

        Ok(())
    }

    /// Stops and unloads all plugins, in reverse priority order.
    pub async fn unload_all(&self) {
        let mut plugins = self.plugin_registry.list().await;
        plugins.reverse();

        for info in &plugins {
            if let Err(e) = self.unload_plugin(&info.id).await {
                error!(plugin_id = %info.id, error = %e, "Error unloading plugin");
            }
        }

        info!("All plugins unloaded");
    }

    /// Returns the plugin registry.
    pub fn plugin_registry(&self) -> &Arc<PluginRegistry> {
        &self.plugin_registry
    }

    /// Lists all loaded plugins.
    pub async fn list_plugins(&self) -> Vec<PluginInfo> {
        self.plugin_registry.list().await
    }
}
