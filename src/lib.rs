//! # Docserve server
//!
//! Thin HTTP host around the pandoc plugin: a render route that turns a
//! controller/action pair into a document, plus status endpoints under
//! `/api`.

pub mod dto;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
