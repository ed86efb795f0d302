//! DDL generation for model tables.
//!
//! Enumeration columns are declared with their storage type (`INTEGER` or
//! `VARCHAR(n)`); a member default is written as its primitive.

use crate::fields::FieldDef;
use crate::model::ModelMeta;
use crate::query::compiler::DatabaseBackendType;
use crate::value::Value;

/// Generates the default value SQL fragment for a field.
fn default_sql(field: &FieldDef) -> String {
    match field.default.clone().map(Value::into_primitive) {
        Some(Value::Null) => " DEFAULT NULL".to_string(),
        Some(Value::Bool(b)) => format!(" DEFAULT {}", if b { "TRUE" } else { "FALSE" }),
        Some(Value::Int(i)) => format!(" DEFAULT {i}"),
        Some(Value::Float(f)) => format!(" DEFAULT {f}"),
        Some(Value::String(s)) => format!(" DEFAULT '{}'", s.replace('\'', "''")),
        Some(_) | None => String::new(),
    }
}

/// Generates the SQL fragment for a column definition (type, constraints).
pub fn column_sql(field: &FieldDef, backend: DatabaseBackendType) -> String {
    let type_str = field.field_type.column_type(field.max_length, backend);
    let null_str = if field.primary_key {
        " PRIMARY KEY"
    } else if field.null {
        match backend {
            DatabaseBackendType::PostgreSQL => " NULL",
            DatabaseBackendType::SQLite => "",
        }
    } else {
        " NOT NULL"
    };
    let autoincrement = if backend == DatabaseBackendType::SQLite
        && field.primary_key
        && field.field_type.is_auto()
    {
        " AUTOINCREMENT"
    } else {
        ""
    };
    let default_str = default_sql(field);
    format!("{type_str}{null_str}{autoincrement}{default_str}")
}

/// Generates `CREATE TABLE` DDL for a model.
pub fn create_table_sql(meta: &ModelMeta, backend: DatabaseBackendType) -> String {
    let columns: Vec<String> = meta
        .fields
        .iter()
        .map(|field| {
            let def = field.def();
            format!("\"{}\" {}", def.column, column_sql(def, backend))
        })
        .collect();
    format!(
        "CREATE TABLE \"{}\" ({})",
        meta.db_table,
        columns.join(", ")
    )
}

/// Generates `DROP TABLE` DDL.
pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS \"{table}\"")
}
