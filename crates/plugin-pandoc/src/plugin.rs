//! Pandoc plugin: wires probing, templates and the pipeline into the host.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, info};

use docserve_core::config::pandoc::PandocConfig;
use docserve_core::error::AppError;
use docserve_plugin::registry::{Plugin, PluginInfo};

use crate::capabilities::{CapabilityProber, ConverterCapabilities, Prober};
use crate::error::PandocError;
use crate::executor::ConverterExecutor;
use crate::metrics::ConversionMetrics;
use crate::pipeline::ConversionPipeline;
use crate::renderer::PandocRenderer;
use crate::template::TemplateEngine;

/// Plugin identifier in the registry.
pub const PLUGIN_ID: &str = "pandoc";

/// Renders templates into documents through pandoc.
#[derive(Debug)]
pub struct PandocPlugin {
    config: PandocConfig,
    engine: Arc<dyn TemplateEngine>,
    prober: Arc<dyn Prober>,
    metrics: Arc<ConversionMetrics>,
    renderer: OnceLock<Arc<PandocRenderer>>,
}

impl PandocPlugin {
    /// Create the plugin; the converter is probed on load.
    pub fn new(config: PandocConfig, engine: Arc<dyn TemplateEngine>) -> Self {
        let prober = Arc::new(CapabilityProber::new(
            config.executable.clone(),
            config.probe_timeout(),
        ));
        Self::with_prober(config, engine, prober)
    }

    /// Create the plugin with a custom capability source.
    pub fn with_prober(
        config: PandocConfig,
        engine: Arc<dyn TemplateEngine>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            config,
            engine,
            prober,
            metrics: Arc::new(ConversionMetrics::new()),
            renderer: OnceLock::new(),
        }
    }

    /// The renderer, once the plugin has loaded.
    pub fn renderer(&self) -> Result<Arc<PandocRenderer>, PandocError> {
        self.renderer.get().cloned().ok_or(PandocError::NotLoaded)
    }

    /// Whether `on_load` has completed.
    pub fn is_loaded(&self) -> bool {
        self.renderer.get().is_some()
    }

    /// Conversion counters, shared with the renderer.
    pub fn metrics(&self) -> &Arc<ConversionMetrics> {
        &self.metrics
    }
}

#[async_trait]
impl Plugin for PandocPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: PLUGIN_ID.to_string(),
            name: "Pandoc document converter".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Converts rendered templates to other document formats".to_string(),
            enabled: self.config.enabled,
            priority: 10,
        }
    }

    async fn on_load(&self) -> Result<(), AppError> {
        if self.is_loaded() {
            debug!("Pandoc plugin already loaded, keeping existing capability snapshot");
            return Ok(());
        }

        let capabilities = if self.config.enabled {
            self.prober.probe().await
        } else {
            info!("Pandoc conversion disabled by configuration, documents will be rendered as HTML");
            ConverterCapabilities::unavailable()
        };

        let pipeline = ConversionPipeline::new(
            ConverterExecutor::new(self.config.executable.clone()),
            Arc::new(capabilities),
            self.config.conversion_timeout(),
            self.config.max_concurrency,
            Arc::clone(&self.metrics),
        );
        let renderer = Arc::new(PandocRenderer::new(Arc::clone(&self.engine), pipeline));

        if self.renderer.set(renderer).is_err() {
            return Err(AppError::plugin("Pandoc plugin was loaded concurrently"));
        }

        info!(
            executable = %self.config.executable,
            max_concurrency = self.config.max_concurrency,
            "Pandoc plugin loaded"
        );
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), AppError> {
        let snapshot = self.metrics.snapshot();
        info!(
            conversions = snapshot.succeeded,
            failed = snapshot.failed,
            fallbacks = snapshot.fallbacks,
            "Pandoc plugin unloaded"
        );
        Ok(())
    }
}
