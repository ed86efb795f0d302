//! Field definitions and the field contract.
//!
//! Every model column is described by a type implementing [`Field`]. The
//! trait's default methods give plain pass-through behavior backed by the
//! field's [`FieldDef`]; [`ChoiceField`] overrides the conversion hooks to
//! move between enumeration members and their stored primitives.
//!
//! The hooks run at well-defined points:
//!
//! | Hook | Called when |
//! |---|---|
//! | [`Field::to_python`] | assigning to an attribute, cleaning input |
//! | [`Field::get_prep_value`] | preparing a filter value |
//! | [`Field::get_db_prep_value`] | writing a value in INSERT/UPDATE |
//! | [`Field::from_db_value`] | reading a projected column |
//! | [`Field::value_to_string`] | serializing an instance |

pub mod choice;
pub mod deconstruct;
pub mod types;

use std::fmt;
use std::sync::LazyLock;

use choicefield_core::error::{OrmError, OrmResult};

use crate::query::custom_lookups::{LookupRegistry, Transform};
use crate::query::expressions::Expression;
use crate::value::Value;

pub use choice::{ChoiceField, ChoiceFieldBuilder, PrimitiveKind};
pub use deconstruct::Deconstructed;
pub use types::{FieldDef, FieldType};

/// Transforms available on every field.
static DEFAULT_LOOKUPS: LazyLock<LookupRegistry> = LazyLock::new(LookupRegistry::with_defaults);

/// The capability interface between a field and the ORM.
pub trait Field: fmt::Debug + Send + Sync {
    /// The column metadata backing this field.
    fn def(&self) -> &FieldDef;

    /// The attribute name.
    fn name(&self) -> &'static str {
        self.def().name
    }

    /// The database column name.
    fn column(&self) -> &str {
        &self.def().column
    }

    /// The storage type reported to schema generation.
    fn internal_type(&self) -> &'static str {
        self.def().field_type.internal_type()
    }

    /// Returns `true` if the column accepts NULL.
    fn is_nullable(&self) -> bool {
        self.def().null
    }

    /// Converts an incoming value into the field's in-memory form.
    fn to_python(&self, value: Value) -> OrmResult<Value> {
        Ok(value)
    }

    /// Converts a value for use as a query parameter.
    fn get_prep_value(&self, value: Value) -> OrmResult<Value> {
        Ok(value)
    }

    /// Converts a value for writing to the database.
    ///
    /// When `prepared` is `false` the value first goes through
    /// [`get_prep_value`](Field::get_prep_value).
    fn get_db_prep_value(&self, value: Value, prepared: bool) -> OrmResult<Value> {
        if prepared {
            Ok(value)
        } else {
            self.get_prep_value(value)
        }
    }

    /// Interprets a value read from the database through `expression`.
    fn from_db_value(&self, value: Value, expression: &Expression) -> OrmResult<Value> {
        let _ = expression;
        Ok(value)
    }

    /// Checks a value against the column constraints.
    fn validate(&self, value: &Value) -> OrmResult<()> {
        self.def().validate(value).map_err(OrmError::from)
    }

    /// Converts and validates a value, returning the converted form.
    fn clean(&self, value: Value) -> OrmResult<Value> {
        let value = self.to_python(value)?;
        self.validate(&value)?;
        Ok(value)
    }

    /// The value written by serializers.
    fn value_to_string(&self, value: Value) -> OrmResult<Value> {
        self.get_prep_value(value)
    }

    /// The transforms accepted in lookup paths through this field.
    fn lookups(&self) -> &'static LookupRegistry {
        &DEFAULT_LOOKUPS
    }

    /// Resolves a transform by name.
    fn get_transform(&self, name: &str) -> Option<&'static Transform> {
        self.lookups().get_transform(name)
    }

    /// Describes how to rebuild this field.
    fn deconstruct(&self) -> Deconstructed {
        let def = self.def();
        let mut kwargs = def.deconstruct_kwargs();
        if let Some(choices) = &def.choices {
            kwargs.insert(
                "choices".to_string(),
                serde_json::Value::Array(
                    choices
                        .iter()
                        .map(|(value, label)| serde_json::json!([value.to_json(), label]))
                        .collect(),
                ),
            );
        }
        Deconstructed::new(def.name, "choicefield.db.models.Field", kwargs)
    }

    /// Downcasts to a [`ChoiceField`].
    fn as_choice(&self) -> Option<&ChoiceField> {
        None
    }
}
