//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod logging;
pub mod pandoc;
pub mod templates;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::app::ServerConfig;
use self::logging::LoggingConfig;
use self::pandoc::PandocConfig;
use self::templates::TemplateConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DOCSERVE";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Template lookup settings.
    #[serde(default)]
    pub templates: TemplateConfig,
    /// Document converter settings.
    #[serde(default)]
    pub pandoc: PandocConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files under `dir`.
    ///
    /// Merges `<dir>/default` with an environment-specific overlay
    /// `<dir>/<env>` and environment variables prefixed with `DOCSERVE_`
    /// (nested keys separated by `__`, e.g. `DOCSERVE__PANDOC__EXECUTABLE`).
    pub fn load(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load a single configuration file without overlays.
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section that carries constraints.
    ///
    /// The request timeout must exceed the conversion timeout.
    pub fn validate(&self) -> Result<(), AppError> {
        self.pandoc.validate()?;

        if self.server.request_timeout_seconds <= self.pandoc.conversion_timeout_seconds {
            return Err(AppError::configuration(format!(
                "server.request_timeout_seconds ({}) must exceed pandoc.conversion_timeout_seconds ({})",
                self.server.request_timeout_seconds, self.pandoc.conversion_timeout_seconds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load(&dir.path().to_string_lossy(), "test").expect("load");
        assert_eq!(config.pandoc.executable, "pandoc");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.templates.root, "templates");
    }

    #[test]
    fn test_overlay_overrides_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("default.toml"),
            "[pandoc]\nexecutable = \"/usr/bin/pandoc\"\nconversion_timeout_seconds = 20\n",
        )
        .expect("write default");
        std::fs::write(
            dir.path().join("staging.toml"),
            "[pandoc]\nconversion_timeout_seconds = 45\n",
        )
        .expect("write overlay");

        let config = AppConfig::load(&dir.path().to_string_lossy(), "staging").expect("load");
        assert_eq!(config.pandoc.executable, "/usr/bin/pandoc");
        assert_eq!(config.pandoc.conversion_timeout_seconds, 45);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[pandoc]\nmax_concurrency = 0\n").expect("write");

        let err = AppConfig::load_file(&path.to_string_lossy()).expect_err("must reject");
        assert_eq!(err.kind, crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_default_request_timeout_exceeds_conversion_timeout() {
        let config = AppConfig::default();
        assert!(config.server.request_timeout() > config.pandoc.conversion_timeout());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_request_timeout_below_conversion_timeout_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("timeouts.toml");
        std::fs::write(
            &path,
            "[server]\nrequest_timeout_seconds = 30\n\n[pandoc]\nconversion_timeout_seconds = 60\n",
        )
        .expect("write");

        let err = AppConfig::load_file(&path.to_string_lossy()).expect_err("must reject");
        assert_eq!(err.kind, crate::ErrorKind::Configuration);
        assert!(err.message.contains("request_timeout_seconds"));
    }
}
