//! # choicefield-db
//!
//! ORM layer for choicefield. Provides [`ChoiceField`](fields::ChoiceField),
//! a column type that stores members of a statically declared enumeration as
//! their primitive values (integers or text) and hands members back when the
//! attribute is read.
//!
//! ## Architecture
//!
//! A model declares its columns as `&'static dyn` [`Field`](fields::Field)
//! values in its [`ModelMeta`](model::ModelMeta). Each enumeration attribute
//! on an instance is an [`EnumAttribute`](descriptor::EnumAttribute), which
//! keeps the stored primitive until first access and then memoizes the
//! resolved member.
//!
//! A [`QuerySet`](query::QuerySet) collects [`Q`](query::Q) filters without
//! touching the database. Filter values are resolved against the model's
//! fields when SQL is built, so members and primitives compare alike; a
//! filter or projection through the `raw` transform skips enumeration
//! coercion and works on the stored primitive.
//!
//! ## Module Overview
//!
//! - [`enums`] - Static enumeration definitions and the [`Choices`](enums::Choices) trait
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`fields`] - The [`Field`](fields::Field) contract, plain fields, and [`ChoiceField`](fields::ChoiceField)
//! - [`descriptor`] - Per-instance enumeration attributes
//! - [`model`] - The [`Model`](model::Model) trait and [`ModelMeta`](model::ModelMeta)
//! - [`query`] - Query building, lookups, transforms, and compilation
//! - [`executor`] - The [`DbExecutor`](executor::DbExecutor) trait and CRUD helpers
//! - [`schema`] - `CREATE TABLE` generation
//! - [`serializers`] - Fixture serialization

// These clippy lints are intentionally allowed for the ORM crate:
// - result_large_err: OrmError is the crate-wide error type and should be used consistently
// - format_push_string: format! with push_str is clearer than write! for SQL generation
// - doc_markdown: backtick requirements for documentation items are too strict
// - needless_pass_by_value: field hooks take owned values to mirror the conversion pipeline
// - return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::result_large_err)]
#![allow(clippy::format_push_string)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::struct_excessive_bools)]
// literal_string_with_formatting_args: template strings using {column} are intentional
#![allow(clippy::literal_string_with_formatting_args)]

pub mod descriptor;
pub mod enums;
pub mod executor;
pub mod fields;
pub mod model;
pub mod query;
pub mod schema;
pub mod serializers;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use descriptor::{AttributeState, EnumAttribute};
pub use enums::{Choices, EnumDef, EnumRegistry, Literal, Member, MemberDef};
pub use executor::{create_model, refresh_model, save_model, DbExecutor};
pub use fields::{
    ChoiceField, ChoiceFieldBuilder, Deconstructed, Field, FieldDef, FieldType, PrimitiveKind,
};
pub use model::{Model, ModelMeta, ResolvedPath};
pub use query::{
    DatabaseBackendType, Expression, Lookup, LookupRegistry, Manager, OrderBy, Query, QuerySet,
    Row, SqlCompiler, Transform, WhereNode, Q,
};
pub use serializers::{JsonSerializer, PrettyJsonSerializer, Serializer};
pub use value::Value;

pub use choicefield_core::error::{OrmError, OrmResult, ValidationError};
