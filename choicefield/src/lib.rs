//! # choicefield
//!
//! Store enumeration members in ordinary database columns.
//!
//! This is the meta-crate that re-exports every sub-crate. Depend on
//! `choicefield` to get the field, the derive, forms and the SQLite
//! backend, or on the individual crates for finer-grained control.
//!
//! ## Quick Start
//!
//! ```ignore
//! use choicefield::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
//! #[choices(crate = "choicefield::db")]
//! enum Size {
//!     #[choice(value = "S")]
//!     Small,
//!     #[choice(value = "L")]
//!     Large,
//! }
//!
//! static SIZE: LazyLock<ChoiceField> =
//!     LazyLock::new(|| ChoiceField::of::<Size>("size").build().expect("str enum"));
//! ```
//!
//! Code that derives `Choices` through this crate must pass
//! `#[choices(crate = "choicefield::db")]`; the generated impls otherwise
//! name `choicefield_db` directly.

/// Error types, settings, and logging setup.
pub use choicefield_core as core;

/// Enumeration definitions, `ChoiceField`, attributes, queries and fixtures.
pub use choicefield_db as db;

/// Database backends: `SQLite`.
pub use choicefield_db_backends as db_backends;

/// `#[derive(Choices)]`.
#[cfg(feature = "macros")]
pub use choicefield_macros as macros;

/// Typed choice form fields, select widgets and model forms.
#[cfg(feature = "forms")]
pub use choicefield_forms as forms;

/// Third-party crates used in the public API.
pub use async_trait;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The most commonly used types and functions.
pub mod prelude {
    pub use std::sync::LazyLock;

    pub use choicefield_core::logging::{field_span, setup_logging};
    pub use choicefield_core::{OrmError, OrmResult, Settings, ValidationError};
    pub use choicefield_db::{
        create_model, refresh_model, save_model, ChoiceField, Choices, DbExecutor, EnumAttribute,
        EnumDef, Field, FieldDef, FieldType, Lookup, Manager, Member, Model, ModelMeta, Q,
        QuerySet, Row, Value,
    };
    pub use choicefield_db_backends::{DatabaseBackend, DatabaseConfig};

    #[cfg(feature = "sqlite")]
    pub use choicefield_db_backends::SqliteBackend;

    #[cfg(feature = "macros")]
    pub use choicefield_macros::Choices;

    #[cfg(feature = "forms")]
    pub use choicefield_forms::{model_form, BaseForm, Form, FormData, ModelFormConfig};
}
