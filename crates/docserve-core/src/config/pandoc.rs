//! Document converter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration for the external document converter.
///
/// `executable` is either a bare command name resolved through `PATH`
/// or an absolute path to the binary.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct PandocConfig {
    /// Converter executable.
    #[validate(length(min = 1))]
    pub executable: String,

    /// Whether conversion is enabled at all. When disabled every render
    /// falls back to HTML without probing.
    pub enabled: bool,

    /// Upper bound for each capability probe invocation.
    #[validate(range(min = 1, max = 120))]
    pub probe_timeout_seconds: u64,

    /// Upper bound for a single conversion, from spawn to exit.
    #[validate(range(min = 1, max = 3600))]
    pub conversion_timeout_seconds: u64,

    /// Maximum number of converter processes running at once.
    #[validate(range(min = 1, max = 64))]
    pub max_concurrency: usize,
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            enabled: true,
            probe_timeout_seconds: default_probe_timeout_seconds(),
            conversion_timeout_seconds: default_conversion_timeout_seconds(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl PandocConfig {
    /// Probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    /// Conversion timeout as a [`Duration`].
    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_seconds)
    }
}

fn default_executable() -> String {
    "pandoc".to_string()
}

fn default_probe_timeout_seconds() -> u64 {
    10
}

fn default_conversion_timeout_seconds() -> u64 {
    60
}

fn default_max_concurrency() -> usize {
    4
}
