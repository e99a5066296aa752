//! Caller-facing rendering API.
//!
//! A [`RenderRequest`] names the target format, the route it is rendered
//! for and, optionally, an explicit template. [`PandocRenderer`] resolves
//! the template, renders it to HTML and hands the result to the conversion
//! pipeline.

use std::panic::Location;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::capabilities::ConverterCapabilities;
use crate::error::PandocError;
use crate::formats::OutputFormat;
use crate::metrics::ConversionMetrics;
use crate::pipeline::ConversionPipeline;
use crate::response::RenderedDocument;
use crate::template::{Bindings, TemplateEngine, base_name, implicit, resolve};

/// Binding name under which the route description is exposed to templates.
pub const REQUEST_BINDING: &str = "request";

/// The route a document is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Controller name, e.g. `Reports`.
    pub controller: String,
    /// Action name, e.g. `quarterly`.
    pub action: String,
    /// Request format (the route's extension), if any.
    pub format: Option<String>,
}

impl RequestContext {
    /// Describe a route by controller and action.
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            format: None,
        }
    }

    /// Set the request format. Empty strings count as no format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.format = (!format.is_empty()).then_some(format);
        self
    }

    /// `Controller.action`, or the action itself if already qualified.
    pub fn qualified_action(&self) -> String {
        if self.action.contains('.') {
            self.action.clone()
        } else {
            format!("{}.{}", self.controller, self.action)
        }
    }

    fn to_binding(&self) -> Value {
        json!({
            "controller": self.controller,
            "action": self.action,
            "format": self.format,
        })
    }
}

/// A single render call.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    format: OutputFormat,
    context: RequestContext,
    template: Option<String>,
    attachment: bool,
    bindings: Bindings,
    cancel: CancellationToken,
    caller: &'static Location<'static>,
}

impl RenderRequest {
    /// Start a request converting to `format`.
    ///
    /// The caller's source location is kept for template-not-found errors.
    #[track_caller]
    pub fn new(format: OutputFormat, context: RequestContext) -> Self {
        Self {
            format,
            context,
            template: None,
            attachment: false,
            bindings: Bindings::new(),
            cancel: CancellationToken::new(),
            caller: Location::caller(),
        }
    }

    /// Like [`RenderRequest::new`] with a format identifier such as `"latex"`.
    #[track_caller]
    pub fn from_identifier(identifier: &str, context: RequestContext) -> Result<Self, PandocError> {
        let format = OutputFormat::lookup(identifier)?;
        Ok(Self::new(format, context))
    }

    /// Render an explicit template instead of the action's own.
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    /// Offer the converted document as a download.
    pub fn attachment(mut self, attachment: bool) -> Self {
        self.attachment = attachment;
        self
    }

    /// Bind one template value.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Merge template values, replacing existing names.
    pub fn bindings(mut self, bindings: Bindings) -> Self {
        self.bindings.extend(bindings);
        self
    }

    /// Abort the conversion when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Target format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Route context.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Where the request was created.
    pub fn caller(&self) -> &'static Location<'static> {
        self.caller
    }
}

/// Renders templates and converts them through the pipeline.
#[derive(Debug, Clone)]
pub struct PandocRenderer {
    engine: Arc<dyn TemplateEngine>,
    pipeline: ConversionPipeline,
}

impl PandocRenderer {
    /// Create a renderer over a template engine and conversion pipeline.
    pub fn new(engine: Arc<dyn TemplateEngine>, pipeline: ConversionPipeline) -> Self {
        Self { engine, pipeline }
    }

    /// Capability snapshot taken when the plugin loaded.
    pub fn capabilities(&self) -> &ConverterCapabilities {
        self.pipeline.capabilities()
    }

    /// Conversion counters.
    pub fn metrics(&self) -> &Arc<ConversionMetrics> {
        self.pipeline.metrics()
    }

    /// Render `request` and convert it to the requested format.
    #[instrument(
        skip_all,
        fields(
            controller = %request.context.controller,
            action = %request.context.action,
            to = %request.format,
        )
    )]
    pub async fn render(&self, request: RenderRequest) -> Result<RenderedDocument, PandocError> {
        let RenderRequest {
            format,
            context,
            template,
            attachment,
            mut bindings,
            cancel,
            caller,
        } = request;

        let request_format = context.format.as_deref();
        let exists = |path: &str| self.engine.exists(path);
        let path = match template.as_deref() {
            Some(name) => resolve(name, &context.controller, request_format, exists),
            None => implicit(&context.qualified_action(), request_format, exists),
        };

        bindings
            .entry(REQUEST_BINDING)
            .or_insert_with(|| context.to_binding());

        let rendered = self.engine.render(&path, &bindings).map_err(|e| match e {
            PandocError::TemplateNotFound { .. } => PandocError::TemplateNotFound {
                name: template.clone().unwrap_or_else(|| context.qualified_action()),
                path: path.clone(),
                caller: Some(caller),
            },
            other => other,
        })?;
        debug!(template = %path, rendered_bytes = rendered.len(), "Template rendered");

        let outcome = self.pipeline.convert(&rendered, format, &cancel).await?;
        Ok(RenderedDocument::from_outcome(
            outcome,
            base_name(&path),
            attachment,
        ))
    }

    /// Render `request` and write the document to `out`.
    ///
    /// Nothing is written unless rendering and conversion both succeed.
    pub async fn render_to<W>(&self, request: RenderRequest, out: &mut W) -> Result<u64, PandocError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let document = self.render(request).await?;
        Ok(document.write_to(out).await?)
    }

    /// Render to a format given by identifier, e.g. from a query string.
    ///
    /// `configure` adds the template, bindings and other options to the
    /// request. Unknown identifiers fail with [`PandocError::UnknownFormat`].
    #[track_caller]
    pub fn render_format<F>(
        &self,
        identifier: &str,
        context: RequestContext,
        configure: F,
    ) -> impl Future<Output = Result<RenderedDocument, PandocError>> + '_
    where
        F: FnOnce(RenderRequest) -> RenderRequest,
    {
        let request = RenderRequest::from_identifier(identifier, context).map(configure);
        async move { self.render(request?).await }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::executor::ConverterExecutor;
    use crate::template::MiniJinjaEngine;

    fn templates(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, body).unwrap();
        }
        dir
    }

    fn renderer(
        root: &std::path::Path,
        executable: &str,
        caps: ConverterCapabilities,
    ) -> PandocRenderer {
        let pipeline = ConversionPipeline::new(
            ConverterExecutor::new(executable),
            Arc::new(caps),
            Duration::from_secs(5),
            2,
            Arc::new(ConversionMetrics::new()),
        );
        PandocRenderer::new(Arc::new(MiniJinjaEngine::new(root)), pipeline)
    }

    fn context() -> RequestContext {
        RequestContext::new("Reports", "quarterly")
    }

    #[test]
    fn test_request_context() {
        let ctx = RequestContext::new("Reports", "quarterly").with_format("");
        assert_eq!(ctx.format, None);
        assert_eq!(ctx.qualified_action(), "Reports.quarterly");
        assert_eq!(
            RequestContext::new("Reports", "Admin.index").qualified_action(),
            "Admin.index"
        );
    }

    #[test]
    fn test_from_identifier() {
        let request = RenderRequest::from_identifier("LaTeX", context()).unwrap();
        assert_eq!(request.format(), OutputFormat::Latex);

        let err = RenderRequest::from_identifier("pdf", context()).unwrap_err();
        assert!(matches!(err, PandocError::UnknownFormat { identifier } if identifier == "pdf"));
    }

    #[tokio::test]
    async fn test_fallback_renders_implicit_template() {
        let dir = templates(&[(
            "Reports/quarterly.html",
            "<h1>{{ title }}</h1><p>{{ request.controller }}/{{ request.action }}</p>",
        )]);
        let renderer = renderer(
            dir.path(),
            "/nonexistent/pandoc",
            ConverterCapabilities::unavailable(),
        );

        let doc = renderer
            .render(RenderRequest::new(OutputFormat::Latex, context()).bind("title", "Q3"))
            .await
            .unwrap();

        assert!(!doc.is_converted());
        assert_eq!(doc.content_type, "text/html;charset=utf-8");
        assert!(doc.disposition.is_none());
        assert_eq!(doc.body.as_ref(), b"<h1>Q3</h1><p>Reports/quarterly</p>");
        assert_eq!(renderer.metrics().snapshot().fallbacks, 1);
    }

    #[tokio::test]
    async fn test_caller_request_binding_wins() {
        let dir = templates(&[("Reports/quarterly.html", "{{ request }}")]);
        let renderer = renderer(
            dir.path(),
            "/nonexistent/pandoc",
            ConverterCapabilities::unavailable(),
        );

        let doc = renderer
            .render(RenderRequest::new(OutputFormat::Rtf, context()).bind("request", "mine"))
            .await
            .unwrap();
        assert_eq!(doc.body.as_ref(), b"mine");
    }

    #[tokio::test]
    async fn test_missing_template_reports_name_path_and_caller() {
        let dir = templates(&[]);
        let renderer = renderer(
            dir.path(),
            "/nonexistent/pandoc",
            ConverterCapabilities::unavailable(),
        );

        let (request, line) = (RenderRequest::new(OutputFormat::Markdown, context()), line!());
        let err = renderer
            .render(request.template("@summary"))
            .await
            .unwrap_err();

        match err {
            PandocError::TemplateNotFound { name, path, caller } => {
                assert_eq!(name, "@summary");
                assert_eq!(path, "Reports/summary.html");
                let caller = caller.unwrap();
                assert!(caller.file().ends_with("renderer.rs"));
                assert_eq!(caller.line(), line);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_render_format_rejects_unknown_identifier() {
        let dir = templates(&[("Reports/quarterly.html", "x")]);
        let renderer = renderer(
            dir.path(),
            "/nonexistent/pandoc",
            ConverterCapabilities::unavailable(),
        );

        let err = renderer
            .render_format("docx", context(), |r| r)
            .await
            .unwrap_err();
        assert!(matches!(err, PandocError::UnknownFormat { .. }));

        let doc = renderer
            .render_format("man", context(), |r| r.attachment(true))
            .await
            .unwrap();
        assert_eq!(doc.body.as_ref(), b"x");
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::test_support::fake_pandoc;

        #[tokio::test]
        async fn test_converted_attachment() {
            let dir = templates(&[
                ("Reports/summary.html", "<p>{{ total }}</p>"),
                ("Reports/summary.tex", "\\textbf{ {{- total -}} }"),
            ]);
            let bin = tempfile::tempdir().unwrap();
            let exe = fake_pandoc(bin.path());
            let renderer = renderer(
                dir.path(),
                &exe.to_string_lossy(),
                ConverterCapabilities::with_formats("1.9.4.2", [OutputFormat::Latex]),
            );

            let request = RenderRequest::new(
                OutputFormat::Latex,
                RequestContext::new("Reports", "index").with_format("tex"),
            )
            .template("@summary")
            .attachment(true)
            .bind("total", 42);
            let doc = renderer.render(request).await.unwrap();

            assert!(doc.is_converted());
            assert_eq!(doc.content_type, "application/x-latex;charset=utf-8");
            assert_eq!(
                doc.disposition.unwrap().to_string(),
                "attachment; filename=\"summary.tex\""
            );
            assert_eq!(doc.body.as_ref(), b"-tlatex\n\\textbf{42}");
        }

        #[tokio::test]
        async fn test_render_to_writer() {
            let dir = templates(&[("Reports/quarterly.html", "<p>body</p>")]);
            let bin = tempfile::tempdir().unwrap();
            let exe = fake_pandoc(bin.path());
            let renderer = renderer(
                dir.path(),
                &exe.to_string_lossy(),
                ConverterCapabilities::with_formats("1.9.4.2", [OutputFormat::Markdown]),
            );

            let mut out = Vec::new();
            let written = renderer
                .render_to(RenderRequest::new(OutputFormat::Markdown, context()), &mut out)
                .await
                .unwrap();

            assert_eq!(out, b"-tmarkdown\n<p>body</p>");
            assert_eq!(written, out.len() as u64);
        }

        #[tokio::test]
        async fn test_cancelled_request() {
            let dir = templates(&[("Reports/quarterly.html", "<p>slow</p>")]);
            let bin = tempfile::tempdir().unwrap();
            let exe = crate::test_support::fake_converter(bin.path(), "exec sleep 30");
            let renderer = renderer(
                dir.path(),
                &exe.to_string_lossy(),
                ConverterCapabilities::with_formats("1.9.4.2", [OutputFormat::Rtf]),
            );

            let token = CancellationToken::new();
            let request = RenderRequest::new(OutputFormat::Rtf, context())
                .with_cancellation(token.clone());
            let cancel = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                token.cancel();
            });

            let mut out = Vec::new();
            let err = renderer.render_to(request, &mut out).await.unwrap_err();
            cancel.await.unwrap();

            assert!(matches!(err, PandocError::Cancelled));
            assert!(out.is_empty());
        }
    }
}
