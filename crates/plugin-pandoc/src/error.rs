//! Error type for the pandoc plugin.
//!
//! Converter unavailability is not an error (the pipeline falls back to
//! HTML). What remains are template lookup failures, which the developer
//! must see, and faults while talking to the converter process.

use std::panic::Location;
use std::time::Duration;

use docserve_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Errors raised while rendering or converting a document.
#[derive(Debug, Error)]
pub enum PandocError {
    /// The format identifier is not part of the catalog.
    #[error("Unknown output format '{identifier}'")]
    UnknownFormat {
        /// The identifier that was looked up.
        identifier: String,
    },

    /// The resolved template does not exist.
    #[error("Template '{path}' not found (requested as '{name}'){}", caller_suffix(.caller))]
    TemplateNotFound {
        /// Template name as the caller wrote it.
        name: String,
        /// Concrete path after resolution.
        path: String,
        /// Where the render call was made, when known.
        caller: Option<&'static Location<'static>>,
    },

    /// Template failed to compile or render.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The converter executable could not be spawned.
    #[error("Converter executable not found: {executable}")]
    ConverterNotFound {
        /// The configured executable.
        executable: String,
    },

    /// The converter did not finish before the deadline and was killed.
    #[error("Converter timed out after {timeout:?}")]
    ConverterTimeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The converter exited with a non-zero status.
    #[error("Converter exited with code {code}: {stderr}")]
    ConverterFailed {
        /// The exit code.
        code: i32,
        /// Captured stderr output.
        stderr: String,
    },

    /// The converter was terminated by a signal.
    #[error("Converter was killed (signal termination)")]
    ConverterKilled,

    /// The conversion was cancelled by the caller.
    #[error("Conversion was cancelled")]
    Cancelled,

    /// The plugin was used before `on_load` completed.
    #[error("Pandoc plugin is not loaded")]
    NotLoaded,

    /// Semaphore was closed unexpectedly.
    #[error("Conversion limiter closed")]
    LimiterClosed,

    /// IO error while talking to the converter or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn caller_suffix(caller: &Option<&'static Location<'static>>) -> String {
    match caller {
        Some(location) => format!(" at {}:{}", location.file(), location.line()),
        None => String::new(),
    }
}

impl PandocError {
    /// Template-not-found error without caller information.
    pub fn template_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::TemplateNotFound {
            name: path.clone(),
            path,
            caller: None,
        }
    }

    /// Whether this error is a template lookup failure.
    pub fn is_template_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }
}

impl From<PandocError> for AppError {
    fn from(err: PandocError) -> Self {
        let kind = match &err {
            PandocError::UnknownFormat { .. } => ErrorKind::Validation,
            PandocError::TemplateNotFound { .. } => ErrorKind::NotFound,
            PandocError::ConverterTimeout { .. } => ErrorKind::Timeout,
            PandocError::ConverterFailed { .. }
            | PandocError::ConverterKilled
            | PandocError::ConverterNotFound { .. } => ErrorKind::ExternalService,
            PandocError::Cancelled | PandocError::LimiterClosed => ErrorKind::ServiceUnavailable,
            PandocError::NotLoaded => ErrorKind::Plugin,
            PandocError::Template(_) | PandocError::Io(_) => ErrorKind::Internal,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
