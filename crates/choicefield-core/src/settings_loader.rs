//! Settings loading from configuration documents.
//!
//! Partial TOML or JSON documents are deep-merged over
//! [`Settings::default`], so a file only has to mention what it changes.
//!
//! ```rust,no_run
//! use choicefield_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/choicefield.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::OrmError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, OrmError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| OrmError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    let content = read(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, OrmError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| OrmError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    let content = read(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

// ============================================================
// Helpers
// ============================================================

fn read(path: &Path, format: &str) -> Result<String, OrmError> {
    std::fs::read_to_string(path).map_err(|e| {
        OrmError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, OrmError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        OrmError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        OrmError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, value) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_partial() {
        let settings = from_toml_str(
            r#"
            debug = false
            default_char_max_length = 64
            "#,
        )
        .unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.default_char_max_length, 64);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_nested_database() {
        let settings = from_toml_str(
            r#"
            [databases.default]
            name = "choices.sqlite3"
            "#,
        )
        .unwrap();
        let db = settings.database("default").unwrap();
        assert_eq!(db.name, "choices.sqlite3");
        assert_eq!(db.engine, "sqlite3");
    }

    #[test]
    fn test_from_toml_malformed() {
        let err = from_toml_str("debug = ").unwrap_err();
        assert!(matches!(err, OrmError::ConfigurationError(_)));
    }

    #[test]
    fn test_from_json_partial() {
        let settings = from_json_str(r#"{"log_level": "debug"}"#).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.default_char_max_length, 255);
    }

    #[test]
    fn test_from_json_wrong_type() {
        let err = from_json_str(r#"{"default_char_max_length": "long"}"#).unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize settings from JSON"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = from_toml_file("/nonexistent/choicefield.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    #[test]
    fn test_merge_json_override_scalar() {
        let merged = merge_json(serde_json::json!({"a": 1, "b": 2}), serde_json::json!({"b": 3}));
        assert_eq!(merged, serde_json::json!({"a": 1, "b": 3}));
    }
}
