//! Request and response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docserve_core::error::AppError;
use plugin_pandoc::{Bindings, FormatSupport};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Converter status and the format catalog.
#[derive(Debug, Clone, Serialize)]
pub struct FormatsResponse {
    /// Whether the converter is usable.
    pub available: bool,
    /// Converter version, when available.
    pub version: Option<String>,
    /// Every known format with its support flag.
    pub formats: Vec<FormatSupport>,
}

/// Query parameters of the render route.
///
/// `to` is required. `format`, `template` and `download` steer rendering;
/// every other pair becomes a string template binding.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQuery {
    /// Target format identifier.
    pub to: String,
    /// Request format used for template resolution.
    pub format: Option<String>,
    /// Explicit template name.
    pub template: Option<String>,
    /// Serve as an attachment.
    pub download: bool,
    /// Remaining pairs.
    pub bindings: Bindings,
}

impl RenderQuery {
    /// Split raw query pairs into options and bindings.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut to = None;
        let mut format = None;
        let mut template = None;
        let mut download = false;
        let mut bindings = Bindings::new();

        for (key, value) in pairs {
            match key.as_str() {
                "to" => to = Some(value),
                "format" => format = Some(value),
                "template" => template = Some(value).filter(|t| !t.is_empty()),
                "download" => download = is_truthy(&value),
                _ => {
                    bindings.insert(key, Value::String(value));
                }
            }
        }

        let to = to
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("Missing required query parameter 'to'"))?;

        Ok(Self {
            to,
            format,
            template,
            download,
            bindings,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "1" | "true" | "yes" | "on"
    )
}
