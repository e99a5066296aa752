//! Converter probe command.

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;
use plugin_pandoc::{CapabilityProber, Prober};

use crate::output::{self, DisplayFormat};

/// Probe the configured converter, ignoring `pandoc.enabled`.
pub async fn execute(config: &AppConfig, format: DisplayFormat) -> Result<(), AppError> {
    let prober = CapabilityProber::new(
        config.pandoc.executable.clone(),
        config.pandoc.probe_timeout(),
    );
    let capabilities = prober.probe().await;

    match format {
        DisplayFormat::Json => output::print_json(&capabilities),
        DisplayFormat::Table => {
            if capabilities.available {
                output::print_success(&format!("Converter found: {capabilities}"));
            } else {
                output::print_warning(&format!(
                    "Converter '{}' is not usable; documents will be served as HTML",
                    config.pandoc.executable
                ));
            }
            output::print_kv("Executable", &config.pandoc.executable);
            output::print_kv("Available", &capabilities.available.to_string());
            output::print_kv("Version", capabilities.version.as_deref().unwrap_or("-"));
            let supported: Vec<String> = capabilities
                .supported
                .iter()
                .map(ToString::to_string)
                .collect();
            output::print_kv("Formats", &supported.join(", "));
        }
    }

    Ok(())
}
