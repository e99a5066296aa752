//! Template engine seam and its minijinja implementation.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use minijinja::{Environment, ErrorKind};

use crate::error::PandocError;

/// Values made available to a template, by name.
pub type Bindings = serde_json::Map<String, serde_json::Value>;

/// Loads and renders templates by path.
pub trait TemplateEngine: Send + Sync + fmt::Debug {
    /// Whether a template exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Render the template at `path`.
    ///
    /// A missing template is reported as [`PandocError::TemplateNotFound`].
    fn render(&self, path: &str, bindings: &Bindings) -> Result<String, PandocError>;
}

/// Renders templates from a directory with minijinja.
///
/// Templates ending in `.html`, `.htm` or `.xml` are auto-escaped.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    root: PathBuf,
}

impl MiniJinjaEngine {
    /// Create an engine serving templates below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(&root));
        Self { env, root }
    }

    /// Template root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaEngine")
            .field("root", &self.root)
            .finish()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn exists(&self, path: &str) -> bool {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        !escapes && self.root.join(relative).is_file()
    }

    fn render(&self, path: &str, bindings: &Bindings) -> Result<String, PandocError> {
        let template = self.env.get_template(path).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => PandocError::template_not_found(path),
            _ => PandocError::Template(e),
        })?;
        Ok(template.render(bindings)?)
    }
}
