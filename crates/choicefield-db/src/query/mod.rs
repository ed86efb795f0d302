//! Query building, compilation, and execution.
//!
//! This module contains the complete query pipeline:
//!
//! - [`lookups`] - Q objects and lookup types for filtering
//! - [`expressions`] - Column and transform expressions
//! - [`compiler`] - Query AST and SQL compilation
//! - [`queryset`] - QuerySet and Manager for lazy query building
//! - [`custom_lookups`] - Transform registry (including `raw`)

pub mod compiler;
pub mod custom_lookups;
pub mod expressions;
pub mod lookups;
pub mod queryset;

pub use compiler::{
    DatabaseBackendType, FromValue, OrderBy, Query, Row, SelectColumn, SqlCompiler, WhereNode,
};
pub use custom_lookups::{LookupRegistry, Transform};
pub use expressions::Expression;
pub use lookups::{Lookup, Q};
pub use queryset::{Manager, QuerySet};
