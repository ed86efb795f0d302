//! SQL query AST and compiler.
//!
//! This module defines the [`Query`] AST that represents a database query, and
//! the [`SqlCompiler`] that translates it into parameterized SQL strings. The
//! compiler supports PostgreSQL (`$1, $2, ...`) and SQLite (`?`) parameter
//! placeholder styles.
//!
//! Filter paths are resolved against a model's fields before compilation
//! ([`WhereNode::resolve`]), which is where lookup values are converted by the
//! field they target.

use choicefield_core::error::{OrmError, OrmResult};

use super::expressions::Expression;
use super::lookups::{Lookup, Q};
use crate::enums::Member;
use crate::fields::choice::RAW;
use crate::model::ModelMeta;
use crate::value::Value;

/// The type of database backend, used by the compiler to generate
/// backend-specific SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    PostgreSQL,
    /// SQLite (uses `?` placeholders).
    SQLite,
}

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order by.
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A column to select in a query.
#[derive(Debug, Clone)]
pub enum SelectColumn {
    /// A simple column name.
    Column(String),
    /// A column expression with an alias.
    Expression(Expression, String),
    /// Literal SQL with an alias (e.g. `COUNT(*)`).
    Raw(String, String),
    /// All columns (`*`).
    Star,
}

/// A WHERE clause node in the query AST.
#[derive(Debug, Clone)]
pub enum WhereNode {
    /// A single condition.
    Condition {
        /// The column expression being compared.
        lhs: Expression,
        /// The lookup type.
        lookup: Lookup,
    },
    /// Logical AND of conditions.
    And(Vec<WhereNode>),
    /// Logical OR of conditions.
    Or(Vec<WhereNode>),
    /// Logical NOT of a condition.
    Not(Box<WhereNode>),
}

impl WhereNode {
    /// A plain `column = value` condition.
    pub fn exact(column: impl Into<String>, value: Value) -> Self {
        Self::Condition {
            lhs: Expression::col(column),
            lookup: Lookup::Exact(value),
        }
    }

    /// Resolves a `Q` object against a model's fields.
    ///
    /// Each filter path is split into a field, a chain of transforms and an
    /// optional lookup name. Lookup values are prepared by the field
    /// ([`Field::get_prep_value`](crate::fields::Field::get_prep_value)),
    /// except when a transform sits between the column and the comparison:
    /// then members are unwrapped and everything else is compared as given.
    ///
    /// # Errors
    ///
    /// [`OrmError::FieldDoesNotExist`] for an unknown field, transform or
    /// lookup name, or any error raised while preparing a value.
    pub fn resolve(q: &Q, meta: &'static ModelMeta) -> OrmResult<Self> {
        match q {
            Q::Filter { field, lookup } => {
                let resolved = meta.resolve_path(field)?;
                if let Some(name) = resolved.lookup {
                    if name != lookup.name() {
                        return Err(OrmError::FieldDoesNotExist(format!(
                            "Unsupported lookup '{name}' in '{field}' (expected '{}')",
                            lookup.name()
                        )));
                    }
                }
                let lookup = if resolved.expression.is_transform(RAW) {
                    lookup.clone().try_map_values(|v| Ok::<_, OrmError>(v.into_primitive()))?
                } else {
                    lookup
                        .clone()
                        .try_map_values(|v| resolved.field.get_prep_value(v))?
                };
                Ok(Self::Condition {
                    lhs: resolved.expression,
                    lookup,
                })
            }
            Q::And(children) => Ok(Self::And(
                children
                    .iter()
                    .map(|c| Self::resolve(c, meta))
                    .collect::<OrmResult<_>>()?,
            )),
            Q::Or(children) => Ok(Self::Or(
                children
                    .iter()
                    .map(|c| Self::resolve(c, meta))
                    .collect::<OrmResult<_>>()?,
            )),
            Q::Not(inner) => Ok(Self::Not(Box::new(Self::resolve(inner, meta)?))),
        }
    }
}

/// The complete query AST representing a SELECT statement.
#[derive(Debug, Clone)]
pub struct Query {
    /// The main table name.
    pub table: String,
    /// Columns to select.
    pub select: Vec<SelectColumn>,
    /// WHERE clause.
    pub where_clause: Option<WhereNode>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: vec![SelectColumn::Star],
            where_clause: None,
            order_by: Vec::new(),
            limit: None,
        }
    }
}

/// A generic database row for passing data between backends and the ORM.
///
/// `Row` holds a list of column names and their corresponding values. It
/// provides typed access via the [`get`](Row::get) method.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a new row from column names and values.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the number of values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        assert_eq!(
            columns.len(),
            values.len(),
            "Row column count must match value count"
        );
        Self { columns, values }
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets a typed value by column name.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist or the value cannot be
    /// converted to the requested type.
    pub fn get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self.get_value(column).ok_or_else(|| {
            OrmError::DatabaseError(format!("Column '{column}' not found in row"))
        })?;
        T::from_value(value)
    }

    /// Gets a typed value by column index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds or the value cannot be
    /// converted to the requested type.
    pub fn get_by_index<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            OrmError::DatabaseError(format!(
                "Column index {idx} out of bounds (row has {} columns)",
                self.values.len()
            ))
        })?;
        T::from_value(value)
    }

    /// Returns a reference to the raw Value at the given column name.
    pub fn get_value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

/// Trait for converting a [`Value`] to a concrete Rust type.
pub trait FromValue: Sized {
    /// Attempts to convert a value reference to this type.
    fn from_value(value: &Value) -> OrmResult<Self>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            _ => Err(OrmError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Int(i) => Self::try_from(*i).map_err(|e| {
                OrmError::DatabaseError(format!("Int value out of i32 range: {e}"))
            }),
            _ => Err(OrmError::DatabaseError(format!(
                "Expected Int, got {value:?}"
            ))),
        }
    }
}

impl FromValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as Self),
            _ => Err(OrmError::DatabaseError(format!(
                "Expected Float, got {value:?}"
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(OrmError::DatabaseError(format!(
                "Expected Bool, got {value:?}"
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(OrmError::DatabaseError(format!(
                "Expected String, got {value:?}"
            ))),
        }
    }
}

impl FromValue for Member {
    fn from_value(value: &Value) -> OrmResult<Self> {
        value.as_member().ok_or_else(|| {
            OrmError::DatabaseError(format!("Expected Enum, got {value:?}"))
        })
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> OrmResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            _ => T::from_value(value).map(Some),
        }
    }
}

/// The SQL compiler translates a [`Query`] AST into parameterized SQL.
///
/// Different backends use different placeholder styles:
/// - PostgreSQL: `$1, $2, $3, ...`
/// - SQLite: `?, ?, ?, ...`
///
/// Parameters are emitted as given; enumeration members must already have
/// been unwrapped by the field layer.
pub struct SqlCompiler {
    backend: DatabaseBackendType,
}

impl SqlCompiler {
    /// Creates a new compiler for the given backend type.
    pub const fn new(backend: DatabaseBackendType) -> Self {
        Self { backend }
    }

    /// Returns a parameter placeholder for the given 1-based index.
    fn placeholder(&self, index: usize) -> String {
        match self.backend {
            DatabaseBackendType::PostgreSQL => format!("${index}"),
            DatabaseBackendType::SQLite => "?".to_string(),
        }
    }

    /// Compiles a SELECT query into SQL and parameters.
    pub fn compile_select(&self, query: &Query) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from("SELECT ");

        // SELECT columns
        let select_parts: Vec<String> = if query.select.is_empty() {
            vec!["*".to_string()]
        } else {
            query
                .select
                .iter()
                .map(|col| match col {
                    SelectColumn::Column(name) => format!("\"{name}\""),
                    SelectColumn::Expression(expr, alias) => {
                        format!("{} AS \"{alias}\"", expr.to_sql(self.backend))
                    }
                    SelectColumn::Raw(raw, alias) => format!("{raw} AS \"{alias}\""),
                    SelectColumn::Star => "*".to_string(),
                })
                .collect()
        };
        sql.push_str(&select_parts.join(", "));

        // FROM
        sql.push_str(&format!(" FROM \"{}\"", query.table));

        // WHERE
        if let Some(ref where_clause) = query.where_clause {
            sql.push_str(" WHERE ");
            self.compile_where_node(where_clause, &mut sql, &mut params);
        }

        // ORDER BY
        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.descending { " DESC" } else { " ASC" };
                    format!("\"{}\"{dir}", o.column)
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        // LIMIT
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        (sql, params)
    }

    /// Compiles an INSERT statement.
    pub fn compile_insert(&self, table: &str, fields: &[(&str, Value)]) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        if fields.is_empty() {
            return (format!("INSERT INTO \"{table}\" DEFAULT VALUES"), params);
        }
        let columns: Vec<String> = fields.iter().map(|(name, _)| format!("\"{name}\"")).collect();
        let placeholders: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (_, val))| {
                params.push(val.clone());
                self.placeholder(i + 1)
            })
            .collect();

        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        (sql, params)
    }

    /// Compiles an UPDATE statement.
    pub fn compile_update(
        &self,
        table: &str,
        fields: &[(&str, Value)],
        where_clause: &WhereNode,
    ) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let set_parts: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(i, (name, val))| {
                params.push(val.clone());
                let ph = self.placeholder(i + 1);
                format!("\"{name}\" = {ph}")
            })
            .collect();

        let mut sql = format!("UPDATE \"{}\" SET {} WHERE ", table, set_parts.join(", "));

        self.compile_where_node(where_clause, &mut sql, &mut params);

        (sql, params)
    }

    /// Compiles a `WhereNode` into SQL, appending to the provided string.
    fn compile_where_node(&self, node: &WhereNode, sql: &mut String, params: &mut Vec<Value>) {
        match node {
            WhereNode::Condition { lhs, lookup } => {
                let column = lhs.to_sql(self.backend);
                self.compile_lookup(&column, lookup, sql, params);
            }
            WhereNode::And(children) => {
                if children.is_empty() {
                    sql.push_str("1=1");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    self.compile_where_node(child, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Or(children) => {
                if children.is_empty() {
                    sql.push_str("1=0");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    self.compile_where_node(child, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Not(inner) => {
                sql.push_str("NOT (");
                self.compile_where_node(inner, sql, params);
                sql.push(')');
            }
        }
    }

    /// Compiles a single lookup into SQL. `column` is already quoted.
    fn compile_lookup(&self, column: &str, lookup: &Lookup, sql: &mut String, params: &mut Vec<Value>) {
        match lookup {
            Lookup::Exact(val) => {
                if val.is_null() {
                    sql.push_str(&format!("{column} IS NULL"));
                } else {
                    params.push(val.clone());
                    let ph = self.placeholder(params.len());
                    sql.push_str(&format!("{column} = {ph}"));
                }
            }
            Lookup::In(vals) => {
                if vals.is_empty() {
                    sql.push_str("1=0");
                    return;
                }
                let placeholders: Vec<String> = vals
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        self.placeholder(params.len())
                    })
                    .collect();
                sql.push_str(&format!("{column} IN ({})", placeholders.join(", ")));
            }
            Lookup::Gt(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{column} > {ph}"));
            }
            Lookup::Lt(val) => {
                params.push(val.clone());
                let ph = self.placeholder(params.len());
                sql.push_str(&format!("{column} < {ph}"));
            }
            Lookup::IsNull(true) => sql.push_str(&format!("{column} IS NULL")),
            Lookup::IsNull(false) => sql.push_str(&format!("{column} IS NOT NULL")),
        }
    }
}
