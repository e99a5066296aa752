//! Document render handler.

use axum::extract::{Path, Query, State};
use tracing::warn;

use docserve_core::error::AppError;
use plugin_pandoc::{RenderedDocument, RequestContext};

use crate::dto::RenderQuery;
use crate::state::AppState;

/// GET /render/{controller}/{action}
///
/// An extension on the action (`quarterly.md`) sets the request format
/// unless `format` is given in the query.
pub async fn render(
    State(state): State<AppState>,
    Path((controller, action)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<RenderedDocument, AppError> {
    let query = RenderQuery::from_pairs(pairs)?;
    let (action, route_format) = split_extension(&action);

    let mut context = RequestContext::new(controller, action);
    if let Some(format) = query.format.as_deref().or(route_format) {
        context = context.with_format(format);
    }

    let RenderQuery {
        to,
        template,
        download,
        bindings,
        ..
    } = query;

    let render = state.renderer.render_format(&to, context, |request| {
        let request = request.attachment(download).bindings(bindings);
        match template {
            Some(name) => request.template(name),
            None => request,
        }
    });

    let timeout = state.config.server.request_timeout();
    match tokio::time::timeout(timeout, render).await {
        Ok(document) => Ok(document?),
        Err(_) => {
            warn!(to = %to, timeout_secs = timeout.as_secs(), "Render request timed out");
            Err(AppError::timeout(format!(
                "Rendering did not finish within {}s",
                timeout.as_secs()
            )))
        }
    }
}

fn split_extension(action: &str) -> (&str, Option<&str>) {
    match action.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && !ext.is_empty() => (name, Some(ext)),
        _ => (action, None),
    }
}
