//! Per-instance holder for enumeration attributes.
//!
//! An [`EnumAttribute`] sits on a model instance for each [`ChoiceField`]. It
//! tracks whether the attribute was ever loaded, holds a primitive read from
//! the database until first access, and after that holds the resolved member.
//!
//! | State | Entered by | `get` |
//! |---|---|---|
//! | `Unset` | a row without the column, a new instance | error |
//! | `Raw(v)` | loading a row | coerce `v`, memoize, return |
//! | `Resolved(m)` | `set`, first `get` | return `m` |

use choicefield_core::error::{OrmError, OrmResult};
use tracing::trace;

use crate::enums::{Choices, Member};
use crate::fields::{ChoiceField, Field};
use crate::model::Row;
use crate::value::Value;

/// The load state of an enumeration attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeState {
    /// Never loaded or assigned.
    Unset,
    /// A stored primitive awaiting coercion.
    Raw(Value),
    /// A member, or `None` for NULL.
    Resolved(Option<Member>),
}

/// An enumeration-valued attribute of one model instance.
#[derive(Debug, Clone)]
pub struct EnumAttribute {
    field: &'static ChoiceField,
    state: AttributeState,
}

impl EnumAttribute {
    /// Creates the attribute of a freshly constructed instance.
    ///
    /// The field's default is assigned through [`set`](Self::set). A nullable
    /// field without a default starts as `None`; anything else starts unset.
    ///
    /// # Errors
    ///
    /// Fails if the declared default does not resolve to a member.
    pub fn new(field: &'static ChoiceField) -> OrmResult<Self> {
        let mut attr = Self::unset(field);
        if let Some(default) = field.default_value() {
            attr.set(default.clone())?;
        } else if field.is_nullable() {
            attr.state = AttributeState::Resolved(None);
        }
        Ok(attr)
    }

    /// An attribute with no value.
    pub const fn unset(field: &'static ChoiceField) -> Self {
        Self {
            field,
            state: AttributeState::Unset,
        }
    }

    /// An attribute holding a value read from storage.
    pub const fn loaded(field: &'static ChoiceField, value: Value) -> Self {
        Self {
            field,
            state: AttributeState::Raw(value),
        }
    }

    /// Loads the field's column from `row`, leaving the attribute unset if
    /// the row does not carry it.
    pub fn from_row(field: &'static ChoiceField, row: &Row) -> Self {
        row.get_value(field.column())
            .map_or_else(|| Self::unset(field), |value| Self::loaded(field, value.clone()))
    }

    /// The column specification behind this attribute.
    pub const fn field(&self) -> &'static ChoiceField {
        self.field
    }

    /// The current load state.
    pub const fn state(&self) -> &AttributeState {
        &self.state
    }

    /// Returns `true` unless the attribute is unset.
    pub const fn is_loaded(&self) -> bool {
        !matches!(self.state, AttributeState::Unset)
    }

    /// Reads the attribute, coercing a stored primitive on first access.
    ///
    /// # Errors
    ///
    /// [`OrmError::AttributeError`] if the attribute was never loaded, or a
    /// validation error if the stored primitive matches no member. A failed
    /// coercion leaves the primitive in place.
    pub fn get(&mut self) -> OrmResult<Option<Member>> {
        match &self.state {
            AttributeState::Unset => Err(OrmError::AttributeError(format!(
                "Found no value for '{}'",
                self.field.name()
            ))),
            AttributeState::Resolved(member) => Ok(*member),
            AttributeState::Raw(value) => {
                let member = self.field.to_member(value)?;
                trace!(field = self.field.name(), value = %value.repr(), "coerced stored value");
                self.state = AttributeState::Resolved(member);
                Ok(member)
            }
        }
    }

    /// Reads the attribute as a variant of `E`.
    ///
    /// # Errors
    ///
    /// Fails like [`get`](Self::get), or with a type error if `E` is not the
    /// field's enumeration.
    pub fn get_as<E: Choices>(&mut self) -> OrmResult<Option<E>> {
        let value = self.get()?.map_or(Value::Null, Value::Enum);
        self.field.to_choice(&value)
    }

    /// Assigns a member or a primitive. The attribute is unchanged if the
    /// value does not resolve.
    ///
    /// # Errors
    ///
    /// A validation error with code `"invalid"` for values that are not
    /// members of the field's enumeration.
    pub fn set(&mut self, value: impl Into<Value>) -> OrmResult<()> {
        let member = self.field.to_member(&value.into())?;
        self.state = AttributeState::Resolved(member);
        Ok(())
    }

    /// The names of the attributes among `attrs` that are unset.
    pub fn deferred(attrs: &[&Self]) -> Vec<&'static str> {
        attrs
            .iter()
            .filter(|attr| !attr.is_loaded())
            .map(|attr| attr.field.name())
            .collect()
    }

    /// The in-memory value: a member, `Null`, or an uncoerced primitive.
    /// An unset attribute reports `Null`; updates skip it through
    /// [`Model::deferred_fields`](crate::model::Model::deferred_fields).
    pub fn value(&self) -> Value {
        match &self.state {
            AttributeState::Unset | AttributeState::Resolved(None) => Value::Null,
            AttributeState::Raw(value) => value.clone(),
            AttributeState::Resolved(Some(member)) => Value::Enum(*member),
        }
    }

    /// The value to write to the column.
    ///
    /// # Errors
    ///
    /// Fails for unknown primitives, and for `Null` on a non-nullable column
    /// (which includes an unset attribute).
    pub fn to_db_value(&self) -> OrmResult<Value> {
        self.field.get_db_prep_value(self.value(), false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::enums::{EnumDef, Literal, MemberDef};

    static COLOR: EnumDef = EnumDef {
        name: "Color",
        members: &[
            MemberDef { name: "RED", value: Literal::Int(1), label: None },
            MemberDef { name: "GREEN", value: Literal::Int(2), label: None },
        ],
        labelled: false,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red,
        Green,
    }

    impl Choices for Color {
        fn definition() -> &'static EnumDef {
            &COLOR
        }

        fn index(self) -> usize {
            self as usize
        }

        fn from_index(index: usize) -> Option<Self> {
            match index {
                0 => Some(Self::Red),
                1 => Some(Self::Green),
                _ => None,
            }
        }
    }

    static COLOR_FIELD: LazyLock<ChoiceField> =
        LazyLock::new(|| ChoiceField::new("color", &COLOR).build().expect("int enum"));
    static NULLABLE: LazyLock<ChoiceField> = LazyLock::new(|| {
        ChoiceField::new("color", &COLOR)
            .nullable()
            .blank()
            .build()
            .expect("int enum")
    });
    static DEFAULTED: LazyLock<ChoiceField> = LazyLock::new(|| {
        ChoiceField::new("color", &COLOR)
            .default(Value::Int(2))
            .build()
            .expect("int enum")
    });

    fn red() -> Member {
        COLOR.member(0).unwrap()
    }

    #[test]
    fn test_new_states() {
        assert_eq!(EnumAttribute::new(&COLOR_FIELD).unwrap().state(), &AttributeState::Unset);
        assert_eq!(
            EnumAttribute::new(&NULLABLE).unwrap().state(),
            &AttributeState::Resolved(None)
        );
        assert_eq!(
            EnumAttribute::new(&DEFAULTED).unwrap().state(),
            &AttributeState::Resolved(COLOR.member(1))
        );
    }

    #[test]
    fn test_unset_get_fails() {
        let mut attr = EnumAttribute::new(&COLOR_FIELD).unwrap();
        assert!(!attr.is_loaded());
        let err = attr.get().unwrap_err();
        assert!(matches!(err, OrmError::AttributeError(_)));
        assert_eq!(err.to_string(), "Found no value for 'color'");
    }

    #[test]
    fn test_raw_coerced_once() {
        let mut attr = EnumAttribute::loaded(&COLOR_FIELD, Value::Int(1));
        assert_eq!(attr.state(), &AttributeState::Raw(Value::Int(1)));
        let first = attr.get().unwrap();
        assert_eq!(attr.state(), &AttributeState::Resolved(Some(red())));
        let second = attr.get().unwrap();
        assert_eq!(first, Some(red()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_raw_unknown_value() {
        let mut attr = EnumAttribute::loaded(&COLOR_FIELD, Value::Int(3));
        let err = attr.get().unwrap_err();
        assert_eq!(err.validation_code(), Some("invalid"));
        assert_eq!(attr.state(), &AttributeState::Raw(Value::Int(3)));
    }

    #[test]
    fn test_raw_null() {
        let mut attr = EnumAttribute::loaded(&NULLABLE, Value::Null);
        assert_eq!(attr.get().unwrap(), None);
        assert!(attr.is_loaded());
    }

    #[test]
    fn test_set_normalizes() {
        let mut attr = EnumAttribute::unset(&COLOR_FIELD);
        attr.set("2").unwrap();
        assert_eq!(attr.get().unwrap(), COLOR.member(1));
        attr.set(red()).unwrap();
        assert_eq!(attr.value(), Value::Enum(red()));
    }

    #[test]
    fn test_set_invalid_keeps_state() {
        let mut attr = EnumAttribute::loaded(&COLOR_FIELD, Value::Int(1));
        let err = attr.set(5).unwrap_err();
        assert_eq!(err.as_validation().unwrap().message, "5 is not a valid Color");
        assert_eq!(attr.state(), &AttributeState::Raw(Value::Int(1)));
    }

    #[test]
    fn test_get_as() {
        let mut attr = EnumAttribute::loaded(&COLOR_FIELD, Value::Int(2));
        assert_eq!(attr.get_as::<Color>().unwrap(), Some(Color::Green));
        let mut attr = EnumAttribute::new(&NULLABLE).unwrap();
        assert_eq!(attr.get_as::<Color>().unwrap(), None);
    }

    #[test]
    fn test_from_row() {
        let row = Row::new(vec!["color".into()], vec![Value::Int(2)]);
        let attr = EnumAttribute::from_row(&COLOR_FIELD, &row);
        assert_eq!(attr.state(), &AttributeState::Raw(Value::Int(2)));

        let row = Row::new(vec!["id".into()], vec![Value::Int(1)]);
        assert!(!EnumAttribute::from_row(&COLOR_FIELD, &row).is_loaded());
    }

    #[test]
    fn test_to_db_value() {
        let mut attr = EnumAttribute::unset(&COLOR_FIELD);
        assert_eq!(attr.to_db_value().unwrap_err().validation_code(), Some("null"));
        attr.set(Color::Green.member()).unwrap();
        assert_eq!(attr.to_db_value().unwrap(), Value::Int(2));

        let attr = EnumAttribute::new(&NULLABLE).unwrap();
        assert_eq!(attr.to_db_value().unwrap(), Value::Null);
    }

    #[test]
    fn test_field_access() {
        let attr = EnumAttribute::unset(&COLOR_FIELD);
        assert_eq!(attr.field().name(), "color");
        assert_eq!(attr.field().enum_def().name, "Color");
    }

    #[test]
    fn test_deferred_names_unset_attributes() {
        let loaded = EnumAttribute::loaded(&COLOR_FIELD, Value::Null);
        let unset = EnumAttribute::unset(&DEFAULTED);
        assert_eq!(EnumAttribute::deferred(&[&loaded, &unset]), vec!["color"]);
        assert!(EnumAttribute::deferred(&[&loaded]).is_empty());
    }
}
