//! Render command: template in, document out.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use docserve_core::config::AppConfig;
use docserve_core::error::AppError;
use plugin_pandoc::{Bindings, RequestContext};

use crate::output;

/// Arguments for `render`
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Target format identifier, e.g. `latex`
    #[arg(long)]
    pub to: String,

    /// Template name; `@name` is relative to the controller
    #[arg(long)]
    pub template: String,

    /// Controller the template belongs to
    #[arg(long, default_value = "Pages")]
    pub controller: String,

    /// Request format used when resolving `@` templates
    #[arg(long)]
    pub format: Option<String>,

    /// Template binding as `name=value`; values that parse as JSON are bound as JSON
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_binding)]
    pub set: Vec<(String, Value)>,

    /// Write the document here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Mark the document as an attachment
    #[arg(long)]
    pub attachment: bool,
}

/// Execute the render command
pub async fn execute(args: &RenderArgs, config: &AppConfig) -> Result<(), AppError> {
    let renderer = super::load_renderer(config).await?;

    let mut context = RequestContext::new(&args.controller, "render");
    if let Some(format) = &args.format {
        context = context.with_format(format);
    }
    let bindings: Bindings = args.set.iter().cloned().collect();

    let template = args.template.clone();
    let attachment = args.attachment;
    let document = renderer
        .render_format(&args.to, context, |request| {
            request
                .template(template)
                .attachment(attachment)
                .bindings(bindings)
        })
        .await?;

    if !document.is_converted() {
        output::print_warning(&format!(
            "'{}' is not supported by the installed converter, wrote HTML instead",
            args.to
        ));
    }

    let written = match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await?;
            document.write_to(&mut file).await?
        }
        None => document.write_to(&mut tokio::io::stdout()).await?,
    };

    if let Some(path) = &args.output {
        output::print_success(&format!("Wrote {written} bytes to {}", path.display()));
    }
    if let Some(disposition) = &document.disposition {
        tracing::debug!(disposition = %disposition, "Document disposition");
    }
    Ok(())
}

fn parse_binding(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("binding name is empty in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("title=Quarterly").unwrap(),
            ("title".to_string(), json!("Quarterly"))
        );
        assert_eq!(parse_binding("total=42").unwrap(), ("total".to_string(), json!(42)));
        assert_eq!(
            parse_binding("rows=[1,2]").unwrap(),
            ("rows".to_string(), json!([1, 2]))
        );
        assert_eq!(parse_binding("empty=").unwrap(), ("empty".to_string(), json!("")));
        assert!(parse_binding("novalue").is_err());
        assert!(parse_binding("=x").is_err());
    }
}
