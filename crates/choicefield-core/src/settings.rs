//! Settings for choicefield.
//!
//! [`Settings`] holds the handful of options the field layer and its
//! logging consult. Every field has a default, so partial configuration
//! documents can be merged over [`Settings::default`] by
//! [`settings_loader`](crate::settings_loader).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The `max_length` applied to text-backed enumeration columns when the
/// field declaration does not override it.
pub const DEFAULT_CHAR_MAX_LENGTH: usize = 255;

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The database engine (e.g. `sqlite3`).
    pub engine: String,
    /// The database name, or file path for SQLite (`:memory:` for in-memory).
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "sqlite3".to_string(),
            name: ":memory:".to_string(),
        }
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use choicefield_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.default_char_max_length, 255);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,

    /// The log filter directive (e.g. "info", "choicefield_db=debug").
    pub log_level: String,

    /// `max_length` for text-backed enumeration columns.
    pub default_char_max_length: usize,

    /// Database configurations, keyed by alias (e.g. "default").
    pub databases: HashMap<String, DatabaseSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert("default".to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            log_level: "info".to_string(),
            default_char_max_length: DEFAULT_CHAR_MAX_LENGTH,
            databases,
        }
    }
}

impl Settings {
    /// Returns the database configuration registered under `alias`.
    pub fn database(&self, alias: &str) -> Option<&DatabaseSettings> {
        self.databases.get(alias)
    }
}
