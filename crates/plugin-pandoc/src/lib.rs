//! # Plugin Pandoc
//!
//! A Docserve plugin that renders a view template and converts the rendered
//! HTML into another document format (Markdown, LaTeX, RTF, man, …) by
//! piping it through the `pandoc` executable.
//!
//! ## Fallback
//!
//! Converter availability and its output formats are probed once when the
//! plugin loads. If the converter is missing, or the requested format is not
//! supported by the installed version, the rendered HTML is served as-is
//! with an HTML content type instead of failing the request.

pub mod capabilities;
pub mod error;
pub mod executor;
pub mod formats;
pub mod metrics;
pub mod pipeline;
pub mod plugin;
pub mod renderer;
pub mod response;
pub mod template;

#[cfg(test)]
pub(crate) mod test_support;

pub use capabilities::{CapabilityProber, ConverterCapabilities, FormatSupport, Prober, StaticProber};
pub use error::PandocError;
pub use formats::OutputFormat;
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use pipeline::{ConversionOutcome, ConversionPipeline};
pub use plugin::PandocPlugin;
pub use renderer::{PandocRenderer, RenderRequest, RequestContext};
pub use response::{ContentDisposition, DispositionKind, RenderedDocument};
pub use template::{Bindings, MiniJinjaEngine, TemplateEngine};
