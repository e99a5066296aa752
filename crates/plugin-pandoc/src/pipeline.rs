//! Conversion pipeline: rendered HTML in, document bytes out.
//!
//! Two states per call, decided from the capability snapshot before any
//! process is spawned:
//!
//! - **Unsupported**: converter unavailable or format not in its supported
//!   set. The rendered HTML is returned unchanged.
//! - **Supported**: the HTML goes through the converter. Timeouts, non-zero
//!   exits and I/O faults are returned as errors; no partial output is
//!   produced and nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::capabilities::ConverterCapabilities;
use crate::error::PandocError;
use crate::executor::ConverterExecutor;
use crate::formats::OutputFormat;
use crate::metrics::ConversionMetrics;

/// Content type of HTML fallback output.
pub const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// Result of a conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// The converter produced `body` in `format`.
    Converted {
        /// Converter stdout.
        body: Bytes,
        /// Target format.
        format: OutputFormat,
    },
    /// Conversion was unavailable; `body` is the rendered HTML.
    Fallback {
        /// UTF-8 encoded rendered text.
        body: Bytes,
    },
}

impl ConversionOutcome {
    /// Output bytes.
    pub fn body(&self) -> &Bytes {
        match self {
            Self::Converted { body, .. } | Self::Fallback { body } => body,
        }
    }

    /// Content type including charset.
    pub fn content_type(&self) -> String {
        match self {
            Self::Converted { format, .. } => format!("{};charset=utf-8", format.mime_type()),
            Self::Fallback { .. } => HTML_CONTENT_TYPE.to_string(),
        }
    }

    /// Whether the converter was used.
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Arguments for converting HTML on stdin to `format` on stdout.
pub fn conversion_args(format: OutputFormat) -> Vec<String> {
    vec![
        "--email-obfuscation=none".to_string(),
        "--html5".to_string(),
        "-s".to_string(),
        "-fhtml".to_string(),
        format!("-t{}", format.identifier()),
    ]
}

/// Converts rendered HTML through the external converter.
#[derive(Debug, Clone)]
pub struct ConversionPipeline {
    executor: ConverterExecutor,
    capabilities: Arc<ConverterCapabilities>,
    timeout: Duration,
    limiter: Arc<Semaphore>,
    metrics: Arc<ConversionMetrics>,
}

impl ConversionPipeline {
    /// Create a pipeline over a probed capability snapshot.
    pub fn new(
        executor: ConverterExecutor,
        capabilities: Arc<ConverterCapabilities>,
        timeout: Duration,
        max_concurrency: usize,
        metrics: Arc<ConversionMetrics>,
    ) -> Self {
        Self {
            executor,
            capabilities,
            timeout,
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
            metrics,
        }
    }

    /// The capability snapshot this pipeline decides with.
    pub fn capabilities(&self) -> &ConverterCapabilities {
        &self.capabilities
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> &Arc<ConversionMetrics> {
        &self.metrics
    }

    /// Convert `rendered` HTML to `format`.
    #[instrument(skip_all, fields(format = %format, conversion_id))]
    pub async fn convert(
        &self,
        rendered: &str,
        format: OutputFormat,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutcome, PandocError> {
        if !self.capabilities.supports(format) {
            warn!(
                available = self.capabilities.available,
                "Converter support for format '{}' is not installed, rendering as HTML instead",
                format
            );
            self.metrics.record_fallback();
            return Ok(ConversionOutcome::Fallback {
                body: Bytes::copy_from_slice(rendered.as_bytes()),
            });
        }

        let conversion_id = Uuid::now_v7();
        tracing::Span::current().record("conversion_id", conversion_id.to_string());

        let _permit = tokio::select! {
            permit = self.limiter.acquire() => permit.map_err(|_| PandocError::LimiterClosed)?,
            _ = cancel.cancelled() => {
                self.metrics.record_cancelled();
                return Err(PandocError::Cancelled);
            }
        };

        self.metrics.record_started();
        let result = self
            .executor
            .run(
                &conversion_args(format),
                Some(rendered.as_bytes()),
                self.timeout,
                cancel,
            )
            .await
            .and_then(|output| {
                if !output.stderr.is_empty() {
                    warn!(stderr = %output.stderr_lossy(), "Converter wrote to stderr");
                }
                output.check_status()?;
                Ok(output)
            });

        match result {
            Ok(output) => {
                let size = output.stdout.len() as u64;
                self.metrics.record_success(output.elapsed, size);
                info!(
                    elapsed_ms = output.elapsed.as_millis() as u64,
                    output_bytes = size,
                    "Conversion completed"
                );
                Ok(ConversionOutcome::Converted {
                    body: Bytes::from(output.stdout),
                    format,
                })
            }
            Err(e) => {
                match &e {
                    PandocError::ConverterTimeout { .. } => self.metrics.record_timeout(),
                    PandocError::Cancelled => self.metrics.record_cancelled(),
                    _ => self.metrics.record_failure(),
                }
                warn!(error = %e, "Conversion failed");
                Err(e)
            }
        }
    }
}
