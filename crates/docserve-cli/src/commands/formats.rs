//! Format catalog command.

use serde::Serialize;
use tabled::Tabled;

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;
use plugin_pandoc::FormatSupport;

use crate::output::{self, DisplayFormat};

#[derive(Debug, Serialize, Tabled)]
struct FormatRow {
    #[tabled(rename = "Id")]
    identifier: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "MIME type")]
    mime_type: &'static str,
    #[tabled(rename = "Ext")]
    extension: &'static str,
    #[tabled(rename = "Supported")]
    supported: &'static str,
}

impl From<FormatSupport> for FormatRow {
    fn from(entry: FormatSupport) -> Self {
        Self {
            identifier: entry.identifier,
            name: entry.name,
            mime_type: entry.mime_type,
            extension: entry.extension.unwrap_or("-"),
            supported: if entry.supported { "yes" } else { "no" },
        }
    }
}

/// List the catalog as seen by the loaded plugin.
pub async fn execute(config: &AppConfig, format: DisplayFormat) -> Result<(), AppError> {
    let renderer = super::load_renderer(config).await?;
    let catalog = renderer.capabilities().catalog();

    match format {
        DisplayFormat::Json => output::print_json(&catalog),
        DisplayFormat::Table => {
            let rows: Vec<FormatRow> = catalog.into_iter().map(FormatRow::from).collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}
