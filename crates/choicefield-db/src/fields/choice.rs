//! The enumeration-backed field.
//!
//! A [`ChoiceField`] stores members of one [`EnumDef`] as their primitive
//! value in an integer or text column. Every value crossing the field is
//! converted: incoming primitives are cast to the enumeration's value type and
//! looked up, outgoing members are unwrapped. Reads through the `raw`
//! transform skip the conversion and yield whatever the column holds.
//!
//! ```
//! use choicefield_db::enums::{EnumDef, Literal, MemberDef};
//! use choicefield_db::fields::{ChoiceField, Field};
//! use choicefield_db::value::Value;
//!
//! static SIZE: EnumDef = EnumDef {
//!     name: "Size",
//!     members: &[
//!         MemberDef { name: "SMALL", value: Literal::Str("S"), label: Some("small") },
//!         MemberDef { name: "LARGE", value: Literal::Str("L"), label: Some("large") },
//!     ],
//!     labelled: true,
//! };
//!
//! let field = ChoiceField::new("size", &SIZE).build().unwrap();
//! assert_eq!(field.internal_type(), "CharField");
//!
//! let large = field.to_python(Value::from("L")).unwrap();
//! assert_eq!(large.to_string(), "Size.LARGE");
//! assert_eq!(field.get_prep_value(large).unwrap(), Value::from("L"));
//!
//! let err = field.to_python(Value::from("M")).unwrap_err();
//! assert_eq!(err.to_string(), "Validation error: 'M' is not a valid Size");
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use choicefield_core::error::{OrmError, OrmResult, ValidationError};
use choicefield_core::settings::Settings;
use tracing::{debug, warn};

use crate::enums::{Choices, EnumDef, EnumRegistry, Member};
use crate::query::custom_lookups::{LookupRegistry, Transform};
use crate::query::expressions::Expression;
use crate::value::{float_repr, Value};

use super::deconstruct::Deconstructed;
use super::types::{FieldDef, FieldType};
use super::Field;

/// The name of the transform that reads stored primitives unconverted.
pub const RAW: &str = "raw";

/// The import path recorded by [`ChoiceField::deconstruct`](Field::deconstruct).
pub const PATH: &str = "choicefield.ChoiceField";

/// Transforms available on every `ChoiceField`. Only `raw` is accepted.
static CHOICE_LOOKUPS: LazyLock<LookupRegistry> = LazyLock::new(|| {
    let mut registry = LookupRegistry::new();
    registry.register_transform(Transform::identity(RAW));
    registry
});

/// The primitive type an enumeration's values are stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Integer values in an `IntegerField` column.
    Int,
    /// Text values in a `CharField` column.
    Str,
}

impl PrimitiveKind {
    const fn field_type(self) -> FieldType {
        match self {
            Self::Int => FieldType::IntegerField,
            Self::Str => FieldType::CharField,
        }
    }
}

/// A field storing members of a static enumeration.
#[derive(Debug, Clone)]
pub struct ChoiceField {
    base: FieldDef,
    enum_def: &'static EnumDef,
    values: Vec<Value>,
    kind: PrimitiveKind,
}

/// Builder returned by [`ChoiceField::new`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ChoiceFieldBuilder {
    name: &'static str,
    enum_def: &'static EnumDef,
    column: Option<String>,
    null: bool,
    blank: bool,
    default: Option<Value>,
    max_length: Option<usize>,
    choices: Option<Vec<(Value, String)>>,
    verbose_name: Option<String>,
    help_text: String,
    values: Option<Vec<Value>>,
}

impl ChoiceFieldBuilder {
    /// Sets the database column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Allows NULL values in the database.
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Allows the field to be left blank in forms.
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Sets the default, given as a member or a primitive.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Overrides the column `max_length`.
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Overrides the choices derived from the enumeration.
    pub fn choices(mut self, choices: Vec<(Value, String)>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Sets the verbose (human-readable) name.
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Replaces the snapshot of member values recorded at construction.
    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    /// Builds the field with default settings.
    pub fn build(self) -> OrmResult<ChoiceField> {
        self.build_with(&Settings::default())
    }

    /// Builds the field, taking the text `max_length` default from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::TypeError`] if the enumeration's values are
    /// neither integers nor strings, or if it has no members.
    pub fn build_with(self, settings: &Settings) -> OrmResult<ChoiceField> {
        let kind = match self.enum_def.value_type_name() {
            "int" => PrimitiveKind::Int,
            "str" => PrimitiveKind::Str,
            other => {
                return Err(OrmError::TypeError(format!(
                    "Enum with values of type '{other}' is not supported"
                )))
            }
        };

        let max_length = match kind {
            PrimitiveKind::Str => self.max_length.or(Some(settings.default_char_max_length)),
            PrimitiveKind::Int => self.max_length,
        };

        let mut base = FieldDef::new(self.name, kind.field_type());
        if let Some(column) = self.column {
            base = base.column(column);
        }
        if let Some(verbose_name) = self.verbose_name {
            base = base.verbose_name(verbose_name);
        }
        base.null = self.null;
        base.blank = self.blank;
        base.default = self.default;
        base.max_length = max_length;
        base.help_text = self.help_text;
        base.choices = Some(self.choices.unwrap_or_else(|| enum_choices(self.enum_def)));

        Ok(ChoiceField {
            base,
            enum_def: self.enum_def,
            values: self.values.unwrap_or_else(|| self.enum_def.values()),
            kind,
        })
    }
}

/// `(value, label)` pairs for an enumeration: labels when it carries them,
/// member names otherwise.
pub fn enum_choices(def: &'static EnumDef) -> Vec<(Value, String)> {
    def.iter()
        .map(|member| {
            let display = if def.labelled {
                member.label()
            } else {
                member.name().to_string()
            };
            (member.value(), display)
        })
        .collect()
}

impl ChoiceField {
    /// Starts building a field for `enum_def`.
    pub const fn new(name: &'static str, enum_def: &'static EnumDef) -> ChoiceFieldBuilder {
        ChoiceFieldBuilder {
            name,
            enum_def,
            column: None,
            null: false,
            blank: false,
            default: None,
            max_length: None,
            choices: None,
            verbose_name: None,
            help_text: String::new(),
            values: None,
        }
    }

    /// Starts building a field for the enumeration behind `E`.
    pub fn of<E: Choices>(name: &'static str) -> ChoiceFieldBuilder {
        Self::new(name, E::definition())
    }

    /// The enumeration stored by this field.
    pub const fn enum_def(&self) -> &'static EnumDef {
        self.enum_def
    }

    /// The member values recorded when the field was built.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The primitive type values are stored as.
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// The declared default, if any.
    pub const fn default_value(&self) -> Option<&Value> {
        self.base.default.as_ref()
    }

    /// The `(value, label)` choices offered by this field.
    pub fn choices(&self) -> &[(Value, String)] {
        self.base.choices.as_deref().unwrap_or_default()
    }

    /// Resolves `value` to a member of this field's enumeration.
    ///
    /// `Null` resolves to `None`; members of this enumeration are returned
    /// as they are. Anything else is cast to the enumeration's value type
    /// and looked up.
    ///
    /// # Errors
    ///
    /// A [`ValidationError`] with code `"invalid"` when the cast fails or no
    /// member has the resulting value.
    pub fn to_member(&self, value: &Value) -> OrmResult<Option<Member>> {
        match value {
            Value::Null => Ok(None),
            Value::Enum(member) if member.belongs_to(self.enum_def) => Ok(Some(*member)),
            other => self
                .cast(other)
                .and_then(|primitive| {
                    self.enum_def.find_by_value(&primitive).ok_or_else(|| {
                        ValidationError::new(
                            format!("{} is not a valid {}", primitive.repr(), self.enum_def.name),
                            "invalid",
                        )
                    })
                })
                .map(Some)
                .map_err(|err| {
                    debug!(field = self.base.name, value = %other.repr(), "{}", err.message);
                    OrmError::ValidationError(err)
                }),
        }
    }

    /// Resolves `value` to a variant of the Rust enum `E`.
    ///
    /// # Errors
    ///
    /// Fails like [`to_member`](Self::to_member), or with
    /// [`OrmError::TypeError`] if `E` is not this field's enumeration.
    pub fn to_choice<E: Choices>(&self, value: &Value) -> OrmResult<Option<E>> {
        self.to_member(value)?
            .map(|member| {
                E::from_member(member).ok_or_else(|| {
                    OrmError::TypeError(format!(
                        "{member} is not a member of {}",
                        E::definition().name
                    ))
                })
            })
            .transpose()
    }

    /// Casts a non-null value to the enumeration's primitive type.
    fn cast(&self, value: &Value) -> Result<Value, ValidationError> {
        match self.kind {
            PrimitiveKind::Int => cast_int(value).map(Value::Int),
            PrimitiveKind::Str => Ok(Value::String(cast_str(value))),
        }
    }

    /// Rebuilds a field from a specification produced by
    /// [`deconstruct`](Field::deconstruct).
    ///
    /// # Errors
    ///
    /// [`OrmError::ConfigurationError`] if the specification names no
    /// enumeration or one that `registry` does not know.
    pub fn from_deconstructed(parts: &Deconstructed, registry: &EnumRegistry) -> OrmResult<Self> {
        let enum_name = parts.string("enum").ok_or_else(|| {
            OrmError::ConfigurationError(format!(
                "Field specification for '{}' names no enumeration",
                parts.name
            ))
        })?;
        let enum_def = registry.get(enum_name).ok_or_else(|| {
            OrmError::ConfigurationError(format!("Unknown enumeration '{enum_name}'"))
        })?;

        let mut builder = Self::new(parts.name, enum_def);
        if parts.flag("null") {
            builder = builder.nullable();
        }
        if parts.flag("blank") {
            builder = builder.blank();
        }
        if let Some(column) = parts.string("db_column") {
            builder = builder.column(column);
        }
        if let Some(verbose_name) = parts.string("verbose_name") {
            builder = builder.verbose_name(verbose_name);
        }
        if let Some(help_text) = parts.string("help_text") {
            builder = builder.help_text(help_text);
        }
        if let Some(max_length) = parts.kwargs.get("max_length").and_then(serde_json::Value::as_u64) {
            let max_length = usize::try_from(max_length).map_err(|e| {
                OrmError::ConfigurationError(format!("Invalid max_length {max_length}: {e}"))
            })?;
            builder = builder.max_length(max_length);
        }
        if let Some(default) = parts.kwargs.get("default") {
            builder = builder.default(Value::from_json(default));
        }
        if let Some(serde_json::Value::Array(values)) = parts.kwargs.get("_values") {
            builder = builder.values(values.iter().map(Value::from_json).collect());
        }
        builder.build()
    }
}

impl Field for ChoiceField {
    fn def(&self) -> &FieldDef {
        &self.base
    }

    fn to_python(&self, value: Value) -> OrmResult<Value> {
        Ok(self.to_member(&value)?.map_or(Value::Null, Value::Enum))
    }

    fn get_prep_value(&self, value: Value) -> OrmResult<Value> {
        Ok(self.to_python(value)?.into_primitive())
    }

    fn get_db_prep_value(&self, value: Value, prepared: bool) -> OrmResult<Value> {
        let value = if prepared {
            value
        } else {
            self.get_prep_value(value)?
        };
        if value.is_null() && !self.base.null {
            warn!(field = self.base.name, "NULL given for a non-nullable column");
            return Err(ValidationError::new("This field cannot be null.", "null").into());
        }
        Ok(value.into_primitive())
    }

    fn from_db_value(&self, value: Value, expression: &Expression) -> OrmResult<Value> {
        if expression.is_transform(RAW) {
            debug!(field = self.base.name, "returning stored value unconverted");
            return Ok(value);
        }
        self.to_python(value)
    }

    fn validate(&self, value: &Value) -> OrmResult<()> {
        let primitive = value.clone().into_primitive();
        self.base.validate(&primitive).map_err(OrmError::from)
    }

    fn lookups(&self) -> &'static LookupRegistry {
        &CHOICE_LOOKUPS
    }

    fn deconstruct(&self) -> Deconstructed {
        let mut kwargs: BTreeMap<String, serde_json::Value> = self.base.deconstruct_kwargs();
        kwargs.insert(
            "enum".to_string(),
            serde_json::Value::String(self.enum_def.name.to_string()),
        );
        kwargs.insert(
            "_values".to_string(),
            serde_json::Value::Array(self.values.iter().map(Value::to_json).collect()),
        );
        Deconstructed::new(self.base.name, PATH, kwargs)
    }

    fn as_choice(&self) -> Option<&ChoiceField> {
        Some(self)
    }
}

// ============================================================
// Casts
// ============================================================

fn invalid(message: String) -> ValidationError {
    ValidationError::new(message, "invalid")
}

fn parse_int(text: &str, shown: &str) -> Result<i64, ValidationError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| invalid(format!("invalid literal for int() with base 10: {shown}")))
}

#[allow(clippy::cast_possible_truncation)]
fn cast_int(value: &Value) -> Result<i64, ValidationError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) if f.is_nan() => {
            Err(invalid("cannot convert float NaN to integer".to_string()))
        }
        Value::Float(f) if f.is_infinite() => {
            Err(invalid("cannot convert float infinity to integer".to_string()))
        }
        Value::Float(f) => Ok(f.trunc() as i64),
        Value::String(s) => parse_int(s, &value.repr()),
        Value::Bytes(b) => parse_int(&String::from_utf8_lossy(b), &value.repr()),
        Value::Enum(member) => cast_int(&member.value()),
        other => Err(invalid(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

fn cast_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Float(f) => float_repr(*f),
        Value::Enum(member) => cast_str(&member.value()),
        other => other.repr(),
    }
}
