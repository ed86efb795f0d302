//! Base database backend trait and connection configuration.
//!
//! This module defines the [`DatabaseBackend`] trait that all backend
//! implementations must satisfy, along with [`DatabaseConfig`], which
//! describes how to reach a database.

use choicefield_core::error::{OrmError, OrmResult};
use choicefield_core::settings::DatabaseSettings;
use choicefield_db::query::compiler::{DatabaseBackendType, SqlCompiler};
use choicefield_db::value::Value;
use choicefield_db::Row;

/// The core trait for database backends.
///
/// A backend provides a uniform interface for executing SQL, managing
/// transactions, and obtaining a SQL compiler configured for its dialect.
///
/// All methods are async because database operations are I/O-bound. Backends
/// built on synchronous drivers (like `rusqlite`) wrap operations in
/// `spawn_blocking` to keep the async interface.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g. "sqlite").
    fn vendor(&self) -> &str;

    /// Returns the backend type for use with the SQL compiler.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Executes a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Executes a SQL query and returns exactly one row.
    ///
    /// Returns [`OrmError::DoesNotExist`] if no rows are returned, or
    /// [`OrmError::MultipleObjectsReturned`] if more than one row is returned.
    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row>;

    /// Begins a new database transaction.
    async fn begin_transaction(&self) -> OrmResult<()>;

    /// Commits the current transaction.
    async fn commit(&self) -> OrmResult<()>;

    /// Rolls back the current transaction.
    async fn rollback(&self) -> OrmResult<()>;

    /// Returns a SQL compiler configured for this backend's dialect.
    fn compiler(&self) -> SqlCompiler {
        SqlCompiler::new(self.backend_type())
    }
}

/// Configuration for connecting to a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// The backend type.
    pub backend: DatabaseBackendType,
    /// The database name or file path.
    pub name: String,
}

impl DatabaseConfig {
    /// Creates a configuration for an in-memory SQLite database.
    pub fn sqlite_memory() -> Self {
        Self::sqlite_file(":memory:")
    }

    /// Creates a configuration for a SQLite file database.
    pub fn sqlite_file(path: impl Into<String>) -> Self {
        Self {
            backend: DatabaseBackendType::SQLite,
            name: path.into(),
        }
    }

    /// Builds a configuration from a `databases` entry of the settings.
    ///
    /// The engine may be given as `sqlite3`, `sqlite`, `postgresql` or
    /// `postgres`, optionally with a dotted prefix (`backends.sqlite3`).
    ///
    /// # Errors
    ///
    /// [`OrmError::ConfigurationError`] for an unknown engine.
    pub fn from_settings(settings: &DatabaseSettings) -> OrmResult<Self> {
        let engine = settings
            .engine
            .rsplit('.')
            .next()
            .unwrap_or_default();
        let backend = match engine {
            "sqlite3" | "sqlite" => DatabaseBackendType::SQLite,
            "postgresql" | "postgres" => DatabaseBackendType::PostgreSQL,
            other => {
                return Err(OrmError::ConfigurationError(format!(
                    "Unknown database engine '{other}'"
                )))
            }
        };
        Ok(Self {
            backend,
            name: settings.name.clone(),
        })
    }

    /// Returns `true` for an in-memory SQLite database.
    pub fn is_memory(&self) -> bool {
        self.backend == DatabaseBackendType::SQLite && self.name == ":memory:"
    }
}
