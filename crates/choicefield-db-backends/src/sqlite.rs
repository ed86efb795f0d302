//! SQLite database backend using `rusqlite`.
//!
//! This module provides the [`SqliteBackend`] which implements the
//! [`DatabaseBackend`](crate::base::DatabaseBackend) trait using `rusqlite`
//! wrapped in `tokio::task::spawn_blocking` for async compatibility.
//!
//! Enumeration members are bound as their primitive values; rows come back
//! as plain integers and strings, which the enumeration attributes coerce
//! lazily.
//!
//! Features:
//! - WAL mode enabled for file-based databases
//! - In-memory database support via `:memory:` path
//! - Simple `Mutex`-based concurrency control

use std::path::PathBuf;
use std::sync::Arc;

use choicefield_core::error::{OrmError, OrmResult};
use choicefield_db::query::compiler::DatabaseBackendType;
use choicefield_db::value::Value;
use choicefield_db::Row;
use rusqlite::types::ValueRef;
use tokio::sync::Mutex;
use tracing::debug;

use crate::base::{DatabaseBackend, DatabaseConfig};

fn db_error(e: impl std::fmt::Display) -> OrmError {
    OrmError::DatabaseError(e.to_string())
}

fn join_error(e: tokio::task::JoinError) -> OrmError {
    OrmError::DatabaseError(format!("Task join error: {e}"))
}

/// A SQLite database backend.
///
/// Uses `rusqlite` for database access with a `Mutex`-based concurrency
/// model. All operations are run via `tokio::task::spawn_blocking` to
/// avoid blocking the async runtime.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens a new SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    /// WAL journal mode is enabled for file-based databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> OrmResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| OrmError::DatabaseError(format!("SQLite open failed: {e}")))?;

        if !in_memory {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| OrmError::DatabaseError(format!("Failed to set pragmas: {e}")))?;
        }
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| OrmError::DatabaseError(format!("Failed to set pragmas: {e}")))?;

        debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> OrmResult<Self> {
        Self::open(":memory:")
    }

    /// Opens the database a [`DatabaseConfig`] describes.
    ///
    /// # Errors
    ///
    /// [`OrmError::ConfigurationError`] if the configuration is not for
    /// SQLite, otherwise as [`open`](Self::open).
    pub fn from_config(config: &DatabaseConfig) -> OrmResult<Self> {
        if config.backend != DatabaseBackendType::SQLite {
            return Err(OrmError::ConfigurationError(format!(
                "SqliteBackend cannot open a {:?} database",
                config.backend
            )));
        }
        Self::open(config.name.as_str())
    }

    /// Returns the database file path.
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }

    fn bind_value(
        stmt: &mut rusqlite::Statement<'_>,
        idx: usize,
        param: &Value,
    ) -> rusqlite::Result<()> {
        match param {
            Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
            Value::Bool(b) => stmt.raw_bind_parameter(idx, b),
            Value::Int(v) => stmt.raw_bind_parameter(idx, v),
            Value::Float(v) => stmt.raw_bind_parameter(idx, v),
            Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
            Value::Bytes(b) => stmt.raw_bind_parameter(idx, b.as_slice()),
            Value::Json(j) => stmt.raw_bind_parameter(idx, j.to_string().as_str()),
            Value::List(vals) => {
                let json = serde_json::Value::Array(vals.iter().map(Value::to_json).collect());
                stmt.raw_bind_parameter(idx, json.to_string().as_str())
            }
            Value::Enum(member) => Self::bind_value(stmt, idx, &member.value()),
        }
    }

    /// Binds ORM `Value` types to a `rusqlite` statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> OrmResult<()> {
        for (i, param) in params.iter().enumerate() {
            Self::bind_value(stmt, i + 1, param)
                .map_err(|e| OrmError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to our generic `Row`.
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> OrmResult<Row> {
        let values = (0..column_names.len())
            .map(|i| {
                let value = match sqlite_row.get_ref(i).map_err(db_error)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::Int(v),
                    ValueRef::Real(v) => Value::Float(v),
                    ValueRef::Text(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
                    ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
                };
                Ok(value)
            })
            .collect::<OrmResult<Vec<_>>>()?;

        Ok(Row::new(column_names.to_vec(), values))
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        debug!(sql, params = params.len(), "executing statement");
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(db_error)?;
            Self::bind_params(&mut stmt, &params)?;
            let count = stmt.raw_execute().map_err(db_error)?;
            Ok(count as u64)
        })
        .await
        .map_err(join_error)?
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        debug!(sql, params = params.len(), "running query");
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(db_error)?;

            let column_names: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();

            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(db_error)? {
                rows.push(Self::convert_row(row, &column_names)?);
            }

            Ok(rows)
        })
        .await
        .map_err(join_error)?
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        let rows = DatabaseBackend::query(self, sql, params).await?;
        let count = rows.len();
        let mut rows = rows.into_iter();
        match (rows.next(), count) {
            (Some(row), 1) => Ok(row),
            (None, _) => Err(OrmError::DoesNotExist("No rows returned".to_string())),
            (Some(_), n) => Err(OrmError::MultipleObjectsReturned(format!(
                "Expected 1 row, got {n}"
            ))),
        }
    }

    async fn begin_transaction(&self) -> OrmResult<()> {
        self.execute("BEGIN", &[]).await?;
        Ok(())
    }

    async fn commit(&self) -> OrmResult<()> {
        self.execute("COMMIT", &[]).await?;
        Ok(())
    }

    async fn rollback(&self) -> OrmResult<()> {
        self.execute("ROLLBACK", &[]).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl choicefield_db::DbExecutor for SqliteBackend {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        DatabaseBackend::query(self, sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        DatabaseBackend::query_one(self, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Value> {
        debug!(sql, params = params.len(), "inserting row");
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&sql).map_err(db_error)?;
            Self::bind_params(&mut stmt, &params)?;
            stmt.raw_execute().map_err(db_error)?;
            Ok(Value::Int(conn.last_insert_rowid()))
        })
        .await
        .map_err(join_error)?
    }
}
