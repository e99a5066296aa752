//! HTTP handlers.

pub mod render;
pub mod status;
