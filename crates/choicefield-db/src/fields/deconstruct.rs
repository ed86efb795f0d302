//! Field specifications.
//!
//! [`Deconstructed`] is the serializable description of a field: enough to
//! rebuild an equivalent field later. Only options that differ from their
//! defaults are recorded.

use std::collections::BTreeMap;

use super::types::FieldDef;

/// A field reduced to its name, import path and non-default options.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Deconstructed {
    /// The attribute name of the field.
    pub name: &'static str,
    /// The path the field is reconstructed from.
    pub path: &'static str,
    /// Options that differ from the defaults, as JSON.
    pub kwargs: BTreeMap<String, serde_json::Value>,
}

impl Deconstructed {
    /// Creates a new specification.
    pub const fn new(
        name: &'static str,
        path: &'static str,
        kwargs: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self { name, path, kwargs }
    }

    /// Reads a boolean option, `false` when absent.
    pub fn flag(&self, key: &str) -> bool {
        self.kwargs
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Reads a string option.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.kwargs.get(key).and_then(serde_json::Value::as_str)
    }

    /// Renders the specification as a JSON document.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "path": self.path,
            "kwargs": self.kwargs,
        })
    }
}

impl FieldDef {
    /// The options of this definition that differ from a fresh
    /// [`FieldDef::new`].
    pub fn deconstruct_kwargs(&self) -> BTreeMap<String, serde_json::Value> {
        let mut kwargs = BTreeMap::new();
        if self.primary_key {
            kwargs.insert("primary_key".to_string(), serde_json::Value::Bool(true));
        }
        if self.null {
            kwargs.insert("null".to_string(), serde_json::Value::Bool(true));
        }
        if self.blank && !self.primary_key {
            kwargs.insert("blank".to_string(), serde_json::Value::Bool(true));
        }
        if let Some(max_length) = self.max_length {
            kwargs.insert("max_length".to_string(), serde_json::json!(max_length));
        }
        if let Some(default) = &self.default {
            kwargs.insert("default".to_string(), default.to_json());
        }
        if self.column != self.name {
            kwargs.insert(
                "db_column".to_string(),
                serde_json::Value::String(self.column.clone()),
            );
        }
        if self.verbose_name != self.name.replace('_', " ") {
            kwargs.insert(
                "verbose_name".to_string(),
                serde_json::Value::String(self.verbose_name.clone()),
            );
        }
        if !self.help_text.is_empty() {
            kwargs.insert(
                "help_text".to_string(),
                serde_json::Value::String(self.help_text.clone()),
            );
        }
        kwargs
    }
}
