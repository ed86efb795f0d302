//! QuerySet and Manager for building and executing database queries.
//!
//! The [`QuerySet`] represents a lazy database query. Filters are kept as
//! [`Q`] objects and resolved against the model's fields only when SQL is
//! generated, which is when enumeration members in lookups are converted to
//! their stored primitives. It executes when a terminal method is called
//! (`get_exec`, `count_exec`, `values_exec`, ...). The [`Manager`] is the
//! entry point for accessing querysets on a model.
//!
//! Projections (`values`, `values_list`) pass every column through the
//! field's [`from_db_value`](crate::fields::Field::from_db_value) together
//! with the expression it was read through, so `color` yields members while
//! `color__raw` yields whatever the column holds.

use std::collections::HashMap;
use std::marker::PhantomData;

use choicefield_core::error::{OrmError, OrmResult};
use choicefield_core::logging::field_span;

use super::compiler::{DatabaseBackendType, OrderBy, Query, SelectColumn, SqlCompiler, WhereNode};
use super::expressions::Expression;
use super::lookups::Q;
use crate::executor::{prepare_fields, DbExecutor};
use crate::fields::Field;
use crate::model::Model;
use crate::value::Value;

/// The entry point for model-level query operations.
///
/// The `Manager` itself does not hold any query state; it simply creates
/// fresh `QuerySet` instances.
#[derive(Debug)]
pub struct Manager<M: Model> {
    _phantom: PhantomData<M>,
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a new manager.
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    /// Returns a new `QuerySet` that returns all objects.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new()
    }

    /// Returns a new `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<M> {
        self.all().filter(q)
    }

    /// Returns a new `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<M> {
        self.all().exclude(q)
    }

    /// Returns an empty `QuerySet` that matches nothing.
    pub fn none(&self) -> QuerySet<M> {
        self.all().none()
    }
}

/// One projected column: the path as written and what it resolved to.
struct Projected {
    alias: String,
    field: &'static dyn Field,
    expression: Expression,
}

/// A lazy, composable database query.
///
/// All filtering/ordering methods consume `self` and return a modified
/// version, making the API chainable.
pub struct QuerySet<M: Model> {
    model: PhantomData<M>,
    query: Query,
    filter: Option<Q>,
    only: Option<Vec<String>>,
    projection: Vec<String>,
    /// Whether this queryset should return no results.
    is_none: bool,
    /// Pending update operation fields.
    pending_update: Option<Vec<(&'static str, Value)>>,
}

impl<M: Model> QuerySet<M> {
    /// Creates a new queryset for the model.
    fn new() -> Self {
        Self {
            model: PhantomData,
            query: Query::new(M::table_name()),
            filter: None,
            only: None,
            projection: Vec::new(),
            is_none: false,
            pending_update: None,
        }
    }

    /// Returns the unresolved filter.
    pub const fn filter_q(&self) -> Option<&Q> {
        self.filter.as_ref()
    }

    // ── Filtering methods (lazy) ─────────────────────────────────────

    /// Adds a filter condition. Returns a new queryset.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing & q,
            None => q,
        });
        self
    }

    /// Adds an exclusion condition (NOT). Returns a new queryset.
    #[must_use]
    pub fn exclude(self, q: Q) -> Self {
        self.filter(!q)
    }

    /// Sets the ordering. Returns a new queryset.
    #[must_use]
    pub fn order_by(mut self, fields: Vec<OrderBy>) -> Self {
        self.query.order_by = fields;
        self
    }

    /// Loads only the named attributes (plus the primary key). Attributes
    /// left out stay unloaded on the returned instances.
    #[must_use]
    pub fn only(mut self, fields: Vec<&str>) -> Self {
        self.only = Some(fields.into_iter().map(str::to_string).collect());
        self
    }

    /// Sets the projection used by [`values_exec`](Self::values_exec) and
    /// [`values_list_exec`](Self::values_list_exec). Paths may end in
    /// transforms (`color__raw`). An empty list projects every field.
    #[must_use]
    pub fn values(mut self, fields: Vec<&str>) -> Self {
        self.projection = fields.into_iter().map(str::to_string).collect();
        self
    }

    /// Same as [`values`](Self::values); rows are returned positionally.
    #[must_use]
    pub fn values_list(self, fields: Vec<&str>) -> Self {
        self.values(fields)
    }

    /// Returns all objects (identity operation for chaining).
    #[must_use]
    pub fn all(self) -> Self {
        self
    }

    /// Returns an empty queryset.
    #[must_use]
    pub fn none(mut self) -> Self {
        self.is_none = true;
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Marks this queryset for a bulk UPDATE of the given attributes.
    #[must_use]
    pub fn update(mut self, fields: Vec<(&'static str, Value)>) -> Self {
        self.pending_update = Some(fields);
        self
    }

    // ── Query building ───────────────────────────────────────────────

    /// The query AST with the filter resolved and `only` applied.
    ///
    /// # Errors
    ///
    /// Fails if a filter path or `only` field does not exist, or a lookup
    /// value is rejected by its field.
    pub fn build_query(&self) -> OrmResult<Query> {
        let meta = M::meta();
        let mut query = self.query.clone();
        query.where_clause = self
            .filter
            .as_ref()
            .map(|q| WhereNode::resolve(q, meta))
            .transpose()?;

        if let Some(only) = &self.only {
            let mut columns = Vec::new();
            if let Some(pk) = meta.pk_field() {
                columns.push(SelectColumn::Column(pk.column().to_string()));
            }
            for name in only {
                let field = meta.get_field(name)?;
                if !field.def().primary_key {
                    columns.push(SelectColumn::Column(field.column().to_string()));
                }
            }
            query.select = columns;
        }
        Ok(query)
    }

    fn projected(&self) -> OrmResult<Vec<Projected>> {
        let meta = M::meta();
        if self.projection.is_empty() {
            return Ok(meta
                .fields
                .iter()
                .map(|&field| Projected {
                    alias: field.name().to_string(),
                    field,
                    expression: Expression::col(field.column()),
                })
                .collect());
        }
        self.projection
            .iter()
            .map(|path| {
                let resolved = meta.resolve_path(path)?;
                if let Some(lookup) = resolved.lookup {
                    return Err(OrmError::FieldDoesNotExist(format!(
                        "Cannot resolve '{path}': '{lookup}' is not a transform"
                    )));
                }
                Ok(Projected {
                    alias: path.clone(),
                    field: resolved.field,
                    expression: resolved.expression,
                })
            })
            .collect()
    }

    // ── SQL generation (for inspection/debugging) ────────────────────

    /// Compiles the queryset to SQL for the given backend.
    ///
    /// A pending update compiles to an UPDATE; otherwise a SELECT.
    ///
    /// # Errors
    ///
    /// Fails like [`build_query`](Self::build_query), or if an update value
    /// is rejected by its field.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> OrmResult<(String, Vec<Value>)> {
        if self.is_none {
            return Ok(("SELECT * FROM \"__none__\" WHERE 1=0".to_string(), vec![]));
        }

        let compiler = SqlCompiler::new(backend);
        let query = self.build_query()?;

        if let Some(ref fields) = self.pending_update {
            let prepared = prepare_fields::<M>(fields.clone(), None)?;
            let where_all = WhereNode::And(vec![]);
            let where_clause = query.where_clause.as_ref().unwrap_or(&where_all);
            return Ok(compiler.compile_update(&query.table, &prepared, where_clause));
        }

        Ok(compiler.compile_select(&query))
    }

    /// Compiles a COUNT query.
    pub fn count_sql(&self, backend: DatabaseBackendType) -> OrmResult<(String, Vec<Value>)> {
        let mut count_query = self.build_query()?;
        count_query.select = vec![SelectColumn::Raw("COUNT(*)".to_string(), "count".to_string())];
        count_query.order_by.clear();
        count_query.limit = None;
        Ok(SqlCompiler::new(backend).compile_select(&count_query))
    }

    /// Compiles a query to get the first result.
    pub fn first_sql(&self, backend: DatabaseBackendType) -> OrmResult<(String, Vec<Value>)> {
        let mut first_query = self.build_query()?;
        first_query.limit = Some(1);
        Ok(SqlCompiler::new(backend).compile_select(&first_query))
    }

    /// Compiles a query for `.get()` (expects exactly one result).
    pub fn get_sql(&self, backend: DatabaseBackendType) -> OrmResult<(String, Vec<Value>)> {
        let mut get_query = self.build_query()?;
        get_query.limit = Some(2); // Get 2 to detect MultipleObjectsReturned
        Ok(SqlCompiler::new(backend).compile_select(&get_query))
    }

    /// Compiles the projection query used by `values_exec`.
    pub fn values_sql(&self, backend: DatabaseBackendType) -> OrmResult<(String, Vec<Value>)> {
        let mut values_query = self.build_query()?;
        values_query.select = self
            .projected()?
            .into_iter()
            .map(|p| SelectColumn::Expression(p.expression, p.alias))
            .collect();
        Ok(SqlCompiler::new(backend).compile_select(&values_query))
    }

    // ── Async execution methods ───────────────────────────────────────

    /// Executes the query and returns all matching model instances.
    pub async fn execute_query(&self, db: &dyn DbExecutor) -> OrmResult<Vec<M>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let (sql, params) = self.to_sql(db.backend_type())?;
        let rows = db.query(&sql, &params).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Returns the count of matching records.
    pub async fn count_exec(&self, db: &dyn DbExecutor) -> OrmResult<i64> {
        if self.is_none {
            return Ok(0);
        }

        let (sql, params) = self.count_sql(db.backend_type())?;
        let rows = db.query(&sql, &params).await?;
        if let Some(row) = rows.into_iter().next() {
            row.get_by_index::<i64>(0)
        } else {
            Ok(0)
        }
    }

    /// Returns whether any records match the query.
    pub async fn exists_exec(&self, db: &dyn DbExecutor) -> OrmResult<bool> {
        if self.is_none {
            return Ok(false);
        }

        let mut exists_query = self.build_query()?;
        exists_query.select = vec![SelectColumn::Raw("1".to_string(), "__exists__".to_string())];
        exists_query.order_by.clear();
        exists_query.limit = Some(1);

        let (sql, params) = SqlCompiler::new(db.backend_type()).compile_select(&exists_query);
        let rows = db.query(&sql, &params).await?;
        Ok(!rows.is_empty())
    }

    /// Returns the first matching record, or `None` if no records match.
    pub async fn first_exec(&self, db: &dyn DbExecutor) -> OrmResult<Option<M>> {
        if self.is_none {
            return Ok(None);
        }

        let (sql, params) = self.first_sql(db.backend_type())?;
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(M::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns a single matching record.
    ///
    /// Returns `DoesNotExist` if no records match, or
    /// `MultipleObjectsReturned` if more than one record matches.
    pub async fn get_exec(&self, db: &dyn DbExecutor) -> OrmResult<M> {
        let object_name = M::meta().object_name;
        if self.is_none {
            return Err(OrmError::DoesNotExist(format!(
                "{object_name} matching query does not exist."
            )));
        }

        let (sql, params) = self.get_sql(db.backend_type())?;
        let rows = db.query(&sql, &params).await?;
        match rows.len() {
            0 => Err(OrmError::DoesNotExist(format!(
                "{object_name} matching query does not exist."
            ))),
            1 => M::from_row(&rows[0]),
            n => Err(OrmError::MultipleObjectsReturned(format!(
                "get() returned more than one {object_name} -- it returned {n}!"
            ))),
        }
    }

    /// Runs an UPDATE and returns the number of rows affected.
    ///
    /// The queryset must have been prepared with `.update(fields)`. Values
    /// are prepared by their fields, so unknown enumeration values fail
    /// before anything is sent.
    pub async fn update_exec(&self, db: &dyn DbExecutor) -> OrmResult<u64> {
        if self.is_none {
            return Ok(0);
        }

        if self.pending_update.is_none() {
            return Err(OrmError::DatabaseError(
                "No pending update fields. Call .update(fields) before .update_exec()".to_string(),
            ));
        }

        let (sql, params) = self.to_sql(db.backend_type())?;
        db.execute_sql(&sql, &params).await
    }

    /// Returns one map per row, keyed by the projected paths.
    ///
    /// # Errors
    ///
    /// Fails if a stored value is rejected by its field (an unknown
    /// enumeration value read without `raw`).
    pub async fn values_exec(&self, db: &dyn DbExecutor) -> OrmResult<Vec<HashMap<String, Value>>> {
        let rows = self.values_list_exec(db).await?;
        let aliases: Vec<String> = self.projected()?.into_iter().map(|p| p.alias).collect();
        Ok(rows
            .into_iter()
            .map(|values| aliases.iter().cloned().zip(values).collect())
            .collect())
    }

    /// Returns one list per row, in projection order.
    pub async fn values_list_exec(&self, db: &dyn DbExecutor) -> OrmResult<Vec<Vec<Value>>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let projected = self.projected()?;
        let (sql, params) = self.values_sql(db.backend_type())?;
        let rows = db.query(&sql, &params).await?;
        rows.iter()
            .map(|row| {
                projected
                    .iter()
                    .map(|p| {
                        let _span = field_span(&M::meta().model_name, p.field.name()).entered();
                        let value = row.get::<Value>(&p.alias)?;
                        p.field.from_db_value(value, &p.expression)
                    })
                    .collect()
            })
            .collect()
    }
}
