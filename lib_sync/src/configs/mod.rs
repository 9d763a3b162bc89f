//! # Configuration Modules
//!
//! Runtime settings shared by front-ends embedding the synchronization core.

/// Validated engine and transport settings.
pub mod settings;

pub use settings::{ConfigError, SyncSettings};
