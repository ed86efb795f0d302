//! # choicefield-db-backends
//!
//! Database backends for choicefield. Each backend implements both the
//! [`DatabaseBackend`] trait and `choicefield_db::DbExecutor`, so any
//! backend can drive `QuerySet` execution and the model CRUD functions.
//!
//! ## Backends
//!
//! - **SQLite** (feature `sqlite`, on by default) - uses `rusqlite` with
//!   `spawn_blocking` for async compatibility. In-memory databases work out
//!   of the box and are what the test suites run against.
//!
//! ## Configuration
//!
//! [`DatabaseConfig`] describes a connection. It can be built directly or
//! read from the `databases` table of `choicefield_core::Settings`.

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod base;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::{DatabaseBackend, DatabaseConfig};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
