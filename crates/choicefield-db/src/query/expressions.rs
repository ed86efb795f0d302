//! Column expressions.
//!
//! An [`Expression`] is what a filter or projection reads: a bare column or
//! a column wrapped in one or more [`Transform`]s. Fields receive the
//! expression alongside every value read from the database, which is how the
//! `raw` transform can opt out of value conversion.

use crate::query::compiler::DatabaseBackendType;
use crate::query::custom_lookups::Transform;

/// A column reference, possibly wrapped in transforms.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A plain column reference.
    Col(String),
    /// A transform applied to an inner expression.
    Transform {
        /// The transform being applied.
        transform: &'static Transform,
        /// The expression being transformed.
        lhs: Box<Expression>,
    },
}

impl Expression {
    /// Creates a column reference.
    pub fn col(name: impl Into<String>) -> Self {
        Self::Col(name.into())
    }

    /// Wraps `self` in `transform`.
    #[must_use]
    pub fn transformed(self, transform: &'static Transform) -> Self {
        Self::Transform {
            transform,
            lhs: Box::new(self),
        }
    }

    /// Returns `true` if the outermost node is the transform called `name`.
    pub fn is_transform(&self, name: &str) -> bool {
        matches!(self, Self::Transform { transform, .. } if transform.name == name)
    }

    /// The underlying column name.
    pub fn column(&self) -> &str {
        match self {
            Self::Col(name) => name,
            Self::Transform { lhs, .. } => lhs.column(),
        }
    }

    /// Compiles the expression into SQL for the given backend.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> String {
        match self {
            Self::Col(name) => format!("\"{name}\""),
            Self::Transform { transform, lhs } => transform.apply(&lhs.to_sql(backend), backend),
        }
    }
}
