//! Template lookup configuration.

use serde::{Deserialize, Serialize};

/// Where view templates are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Root directory that template paths are resolved against.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> String {
    "templates".to_string()
}
