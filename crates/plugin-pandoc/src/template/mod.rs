//! Template naming and loading.

pub mod engine;
pub mod resolver;

pub use engine::{Bindings, MiniJinjaEngine, TemplateEngine};
pub use resolver::{base_name, implicit, resolve};
