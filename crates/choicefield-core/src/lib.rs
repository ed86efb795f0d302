//! # choicefield-core
//!
//! Foundation types shared by every choicefield crate. This crate has no
//! dependency on the ORM layer.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Configuration with sensible defaults
//! - [`settings_loader`] - Loading settings from TOML and JSON documents
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{OrmError, OrmResult, ValidationError};
pub use settings::Settings;
