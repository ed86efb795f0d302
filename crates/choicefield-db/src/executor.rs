//! Database executor trait and model CRUD operations.
//!
//! This module defines the [`DbExecutor`] trait that provides the minimal async
//! interface required by [`QuerySet`](crate::query::queryset::QuerySet)
//! execution methods and model CRUD operations. It also provides free
//! functions for save/create/refresh operations on model instances.
//!
//! Values are written through each field's
//! [`get_db_prep_value`](crate::fields::Field::get_db_prep_value), so
//! enumeration members reach the database as their primitives.
//!
//! The `DbExecutor` trait is implemented by backend types (e.g.
//! `SqliteBackend`) in the `choicefield-db-backends` crate.

use choicefield_core::error::{OrmError, OrmResult};
use tracing::debug;

use crate::model::Model;
use crate::query::compiler::{DatabaseBackendType, Query, Row, SqlCompiler, WhereNode};
use crate::value::Value;

/// Minimal async database executor trait.
///
/// This is the bridge between the ORM layer (`choicefield-db`) and the
/// concrete database backends (`choicefield-db-backends`). `QuerySet`
/// execution methods and model CRUD functions accept `&dyn DbExecutor`, which
/// backends implement.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the backend type for SQL compilation.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute_sql(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Runs a SQL query and returns exactly one row.
    /// Returns `DoesNotExist` if no rows, `MultipleObjectsReturned` if more than one.
    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row>;

    /// Executes an INSERT and returns the last inserted row ID.
    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Value> {
        self.execute_sql(sql, params).await?;
        let row = self.query("SELECT last_insert_rowid() AS id", &[]).await?;
        if let Some(r) = row.into_iter().next() {
            Ok(r.get::<Value>("id")?)
        } else {
            Err(OrmError::DatabaseError(
                "Failed to retrieve last inserted ID".to_string(),
            ))
        }
    }
}

/// Prepares attribute values for writing: maps attribute names to columns
/// and runs each value through its field.
///
/// When `only` is given, attributes outside it are skipped.
pub(crate) fn prepare_fields<M: Model>(
    values: Vec<(&'static str, Value)>,
    only: Option<&[&str]>,
) -> OrmResult<Vec<(&'static str, Value)>> {
    let meta = M::meta();
    values
        .into_iter()
        .filter(|(name, _)| only.map_or(true, |names| names.contains(name)))
        .map(|(name, value)| {
            let field = meta.get_field(name)?;
            let prepared = field.get_db_prep_value(value, false)?;
            Ok((field.def().column.as_str(), prepared))
        })
        .collect()
}

// ── Model CRUD free functions ──────────────────────────────────────────

/// Saves a model instance to the database.
///
/// If the primary key is set, performs an UPDATE of the loaded non-pk fields
/// (or only `update_fields`, when given); attributes reported by
/// [`Model::deferred_fields`] keep their stored values. Otherwise performs an
/// INSERT and sets the PK from the returned value.
///
/// # Errors
///
/// Returns an error if a value fails preparation (e.g. an unset non-null
/// enumeration attribute) or the database operation fails.
pub async fn save_model<M: Model>(
    model: &mut M,
    db: &dyn DbExecutor,
    update_fields: Option<&[&str]>,
) -> OrmResult<()> {
    match model.pk() {
        Some(pk_value) => {
            let deferred = model.deferred_fields();
            if !deferred.is_empty() {
                debug!(table = M::table_name(), ?deferred, "leaving unloaded attributes out of the update");
            }
            let values = model
                .non_pk_field_values()
                .into_iter()
                .filter(|(name, _)| !deferred.contains(name))
                .collect();
            let fields = prepare_fields::<M>(values, update_fields)?;
            if fields.is_empty() {
                return Ok(());
            }
            let compiler = SqlCompiler::new(db.backend_type());
            let where_clause = WhereNode::exact(M::pk_field_name(), pk_value);
            let (sql, params) = compiler.compile_update(M::table_name(), &fields, &where_clause);
            debug!(table = M::table_name(), "updating instance");
            db.execute_sql(&sql, &params).await?;
            Ok(())
        }
        None => create_model(model, db).await,
    }
}

/// Creates a new model instance in the database via INSERT.
///
/// Always performs an INSERT regardless of whether the PK is set.
/// Sets the PK from the returned value.
///
/// # Errors
///
/// Returns an error if a value fails preparation or the INSERT fails.
pub async fn create_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> OrmResult<()> {
    let compiler = SqlCompiler::new(db.backend_type());
    let fields = prepare_fields::<M>(model.non_pk_field_values(), None)?;
    let (sql, params) = compiler.compile_insert(M::table_name(), &fields);
    debug!(table = M::table_name(), "inserting instance");
    let pk = db.insert_returning_id(&sql, &params).await?;
    model.set_pk(pk);
    Ok(())
}

/// Refreshes a model instance from the database.
///
/// Performs a `SELECT * WHERE pk = $1` and replaces the model with the
/// latest values from the database. Enumeration attributes come back in the
/// raw state and are coerced on first access.
///
/// # Errors
///
/// Returns an error if the PK is not set or the record does not exist.
pub async fn refresh_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> OrmResult<()> {
    let pk_value = model.pk().ok_or_else(|| {
        OrmError::DatabaseError("Cannot refresh a model without a primary key".to_string())
    })?;
    let compiler = SqlCompiler::new(db.backend_type());

    let mut query = Query::new(M::table_name());
    query.where_clause = Some(WhereNode::exact(M::pk_field_name(), pk_value));
    query.limit = Some(1);

    let (sql, params) = compiler.compile_select(&query);
    let row = db.query_one(&sql, &params).await?;
    *model = M::from_row(&row)?;
    Ok(())
}
