//! Maps logical template references to template paths.
//!
//! A reference starting with `@` is relative to the current controller:
//! `@summary` in controller `Reports` with request format `md` becomes
//! `Reports/summary.md`. When a format-specific template does not exist the
//! generic `.html` template is used instead, so one template can serve
//! every output format.

/// Marks a reference as relative to the current controller.
pub const CONTROLLER_MARKER: char = '@';

/// Format used when the request names none.
pub const DEFAULT_FORMAT: &str = "html";

/// Resolve `raw` to a template path.
///
/// `exists` reports whether a path is present in the template store; it is
/// only consulted for the `.html` fallback. Loading, and reporting a
/// missing template, is left to the template engine.
pub fn resolve(
    raw: &str,
    controller: &str,
    request_format: Option<&str>,
    exists: impl Fn(&str) -> bool,
) -> String {
    let format = request_format.filter(|f| !f.is_empty());

    let path = match raw.strip_prefix(CONTROLLER_MARKER) {
        Some(rest) => {
            let qualified = if rest.contains('.') {
                rest.to_string()
            } else {
                format!("{controller}.{rest}")
            };
            format!(
                "{}.{}",
                qualified.replace('.', "/"),
                format.unwrap_or(DEFAULT_FORMAT)
            )
        }
        None => raw.to_string(),
    };

    fallback_to_html(path, format, exists)
}

/// Template path for a route with no explicit template.
///
/// `action` is the qualified `Controller.method` name.
pub fn implicit(action: &str, request_format: Option<&str>, exists: impl Fn(&str) -> bool) -> String {
    let format = request_format.filter(|f| !f.is_empty());
    let path = format!(
        "{}.{}",
        action.replace('.', "/"),
        format.unwrap_or(DEFAULT_FORMAT)
    );
    fallback_to_html(path, format, exists)
}

fn fallback_to_html(path: String, format: Option<&str>, exists: impl Fn(&str) -> bool) -> String {
    let Some(format) = format.filter(|f| *f != DEFAULT_FORMAT) else {
        return path;
    };
    if exists(&path) {
        return path;
    }
    match path.strip_suffix(&format!(".{format}")) {
        Some(stem) => format!("{stem}.{DEFAULT_FORMAT}"),
        None => path,
    }
}

/// File name of `path` without directory and last extension.
pub fn base_name(path: &str) -> &str {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rfind('.') {
        Some(0) | None => file,
        Some(idx) => &file[..idx],
    }
}
