//! Transform registry.
//!
//! Transforms modify the column reference before a lookup is applied
//! (e.g. `LOWER(field)`). A field exposes the transforms it accepts through
//! a [`LookupRegistry`]; filter paths such as `name__lower` or `color__raw`
//! are resolved against it segment by segment.
//!
//! # Examples
//!
//! ```
//! use choicefield_db::query::custom_lookups::*;
//! use choicefield_db::query::compiler::DatabaseBackendType;
//!
//! let mut registry = LookupRegistry::new();
//! registry.register_transform(Transform::identity("raw"));
//!
//! let (transforms, lookup) = registry.resolve_chain(&["raw", "exact"]);
//! assert_eq!(transforms[0].name, "raw");
//! assert_eq!(lookup, Some("exact"));
//! assert_eq!(
//!     registry.apply_transforms("color", &transforms, DatabaseBackendType::SQLite),
//!     "\"color\""
//! );
//! ```

use std::collections::HashMap;

use crate::query::compiler::DatabaseBackendType;

/// A transform that modifies a column reference before a lookup is applied.
///
/// Each backend has its own template with a `{column}` placeholder.
#[derive(Debug, Clone)]
pub struct Transform {
    /// The name of this transform (e.g., "lower", "raw").
    pub name: String,
    /// SQL template for PostgreSQL.
    pub sql_template_pg: String,
    /// SQL template for SQLite.
    pub sql_template_sqlite: String,
}

impl Transform {
    /// Creates a new transform with the same SQL across all backends.
    pub fn new(name: impl Into<String>, sql_template: impl Into<String>) -> Self {
        let template = sql_template.into();
        Self {
            name: name.into(),
            sql_template_pg: template.clone(),
            sql_template_sqlite: template,
        }
    }

    /// Creates a new transform with per-backend SQL templates.
    pub fn with_backends(
        name: impl Into<String>,
        pg: impl Into<String>,
        sqlite: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sql_template_pg: pg.into(),
            sql_template_sqlite: sqlite.into(),
        }
    }

    /// Creates a transform that emits the column unchanged.
    ///
    /// It still marks the expression as transformed, so fields can tell a
    /// bare column read from one that went through the transform.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::new(name, "{column}")
    }

    /// Returns the SQL template for the given backend.
    pub fn sql_template(&self, backend: DatabaseBackendType) -> &str {
        match backend {
            DatabaseBackendType::PostgreSQL => &self.sql_template_pg,
            DatabaseBackendType::SQLite => &self.sql_template_sqlite,
        }
    }

    /// Applies this transform to a column expression.
    pub fn apply(&self, column_sql: &str, backend: DatabaseBackendType) -> String {
        self.sql_template(backend).replace("{column}", column_sql)
    }
}

/// A registry of transforms keyed by name.
#[derive(Debug, Clone, Default)]
pub struct LookupRegistry {
    transforms: HashMap<String, Transform>,
}

impl LookupRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new registry pre-populated with the string and numeric
    /// transforms plain columns accept.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_transform(Transform::new("lower", "LOWER({column})"));
        registry.register_transform(Transform::new("upper", "UPPER({column})"));
        registry.register_transform(Transform::with_backends(
            "length",
            "CHAR_LENGTH({column})",
            "LENGTH({column})",
        ));
        registry.register_transform(Transform::new("trim", "TRIM({column})"));
        registry.register_transform(Transform::new("abs", "ABS({column})"));

        registry
    }

    /// Registers a transform under its own name, replacing any previous one.
    pub fn register_transform(&mut self, transform: Transform) {
        self.transforms.insert(transform.name.clone(), transform);
    }

    /// Unregisters a transform by name.
    pub fn unregister_transform(&mut self, name: &str) -> Option<Transform> {
        self.transforms.remove(name)
    }

    /// Returns a reference to a registered transform.
    pub fn get_transform(&self, name: &str) -> Option<&Transform> {
        self.transforms.get(name)
    }

    /// Returns true if a transform with the given name is registered.
    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Returns the number of registered transforms.
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Resolves a chain of transforms and a final lookup from a list of
    /// path segments (the parts after the field name split by `__`).
    ///
    /// Leading segments that name a registered transform are consumed as
    /// transforms. The first segment that does not is returned as the final
    /// lookup name; `None` means every segment was a transform.
    pub fn resolve_chain<'r, 's>(
        &'r self,
        segments: &[&'s str],
    ) -> (Vec<&'r Transform>, Option<&'s str>) {
        let mut transforms = Vec::new();
        let mut remaining = segments;

        while let Some((segment, rest)) = remaining.split_first() {
            match self.transforms.get(*segment) {
                Some(transform) => {
                    transforms.push(transform);
                    remaining = rest;
                }
                None => return (transforms, Some(segment)),
            }
        }

        (transforms, None)
    }

    /// Compiles a chain of transforms applied to a column into SQL.
    pub fn apply_transforms(
        &self,
        column: &str,
        transforms: &[&Transform],
        backend: DatabaseBackendType,
    ) -> String {
        let mut result = format!("\"{column}\"");
        for transform in transforms {
            result = transform.apply(&result, backend);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_new() {
        let t = Transform::new("lower", "LOWER({column})");
        assert_eq!(t.name, "lower");
        assert_eq!(t.sql_template_pg, "LOWER({column})");
        assert_eq!(t.sql_template_sqlite, "LOWER({column})");
    }

    #[test]
    fn test_transform_apply_backend_specific() {
        let t = Transform::with_backends(
            "length",
            "CHAR_LENGTH({column})",
            "LENGTH({column})",
        );
        assert_eq!(
            t.apply("\"name\"", DatabaseBackendType::PostgreSQL),
            "CHAR_LENGTH(\"name\")"
        );
        assert_eq!(t.apply("\"name\"", DatabaseBackendType::SQLite), "LENGTH(\"name\")");
    }

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity("raw");
        assert_eq!(t.apply("\"color\"", DatabaseBackendType::SQLite), "\"color\"");
        assert_eq!(t.apply("\"color\"", DatabaseBackendType::PostgreSQL), "\"color\"");
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = LookupRegistry::with_defaults();
        assert!(registry.has_transform("lower"));
        assert!(registry.has_transform("upper"));
        assert!(registry.has_transform("length"));
        assert!(registry.has_transform("trim"));
        assert!(registry.has_transform("abs"));
        assert!(!registry.has_transform("raw"));
    }

    #[test]
    fn test_registry_register_and_unregister() {
        let mut registry = LookupRegistry::new();
        assert_eq!(registry.transform_count(), 0);
        registry.register_transform(Transform::identity("raw"));
        assert_eq!(registry.get_transform("raw").unwrap().name, "raw");
        assert!(registry.unregister_transform("raw").is_some());
        assert!(!registry.has_transform("raw"));
    }

    #[test]
    fn test_resolve_chain_single_lookup() {
        let registry = LookupRegistry::with_defaults();
        let (transforms, lookup) = registry.resolve_chain(&["in"]);
        assert!(transforms.is_empty());
        assert_eq!(lookup, Some("in"));
    }

    #[test]
    fn test_resolve_chain_multiple_transforms() {
        let registry = LookupRegistry::with_defaults();
        let (transforms, lookup) = registry.resolve_chain(&["trim", "lower", "exact"]);
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[0].name, "trim");
        assert_eq!(transforms[1].name, "lower");
        assert_eq!(lookup, Some("exact"));
    }

    #[test]
    fn test_resolve_chain_all_transforms() {
        let registry = LookupRegistry::with_defaults();
        let (transforms, lookup) = registry.resolve_chain(&["lower"]);
        assert_eq!(transforms.len(), 1);
        assert!(lookup.is_none());
    }

    #[test]
    fn test_apply_chained_transforms() {
        let registry = LookupRegistry::with_defaults();
        let trim = registry.get_transform("trim").unwrap();
        let lower = registry.get_transform("lower").unwrap();
        let sql =
            registry.apply_transforms("name", &[trim, lower], DatabaseBackendType::PostgreSQL);
        assert_eq!(sql, "LOWER(TRIM(\"name\"))");
    }

    #[test]
    fn test_empty_transforms_applied() {
        let registry = LookupRegistry::new();
        let sql = registry.apply_transforms("name", &[], DatabaseBackendType::PostgreSQL);
        assert_eq!(sql, "\"name\"");
    }
}
