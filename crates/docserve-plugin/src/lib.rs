//! # docserve-plugin
//!
//! Plugin host for Docserve. Provides:
//!
//! - The [`Plugin`] trait implemented by compiled-in plugins
//! - A registry of loaded plugins with enable/disable state
//! - Lifecycle management (load, start, stop, unload)

pub mod manager;
pub mod registry;

pub use manager::PluginManager;
pub use registry::{Plugin, PluginInfo, PluginRegistry};
