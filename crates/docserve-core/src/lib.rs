//! # docserve-core
//!
//! Core crate for Docserve. Contains the configuration schemas and loader,
//! the unified error system, and the mapping of errors onto HTTP responses.
//!
//! This crate has **no** internal dependencies on other Docserve crates.

pub mod config;
pub mod error;
pub mod http;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
