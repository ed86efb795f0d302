//! Plain field definitions.
//!
//! [`FieldDef`] captures the column metadata every field carries (name,
//! column, nullability, default, choices) and implements the generic half of
//! validation. [`ChoiceField`](super::ChoiceField) wraps one and layers the
//! enumeration conversions on top.

use choicefield_core::error::ValidationError;

use crate::query::compiler::DatabaseBackendType;
use crate::value::Value;

use super::Field;

/// The storage type of a model field, determining its SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing 32-bit integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// 16-bit signed integer.
    SmallIntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Boolean (true/false).
    BooleanField,
}

impl FieldType {
    /// The name reported by [`Field::internal_type`].
    pub const fn internal_type(&self) -> &'static str {
        match self {
            Self::AutoField => "AutoField",
            Self::BigAutoField => "BigAutoField",
            Self::CharField => "CharField",
            Self::TextField => "TextField",
            Self::IntegerField => "IntegerField",
            Self::BigIntegerField => "BigIntegerField",
            Self::SmallIntegerField => "SmallIntegerField",
            Self::FloatField => "FloatField",
            Self::BooleanField => "BooleanField",
        }
    }

    /// Returns `true` for auto-incrementing primary key types.
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::AutoField | Self::BigAutoField)
    }

    /// Returns the SQL column type for this field on PostgreSQL.
    pub fn pg_column_type(&self, max_length: Option<usize>) -> String {
        match self {
            Self::AutoField => "SERIAL".to_string(),
            Self::BigAutoField => "BIGSERIAL".to_string(),
            Self::CharField => match max_length {
                Some(n) => format!("VARCHAR({n})"),
                None => "VARCHAR".to_string(),
            },
            Self::TextField => "TEXT".to_string(),
            Self::IntegerField => "INTEGER".to_string(),
            Self::BigIntegerField => "BIGINT".to_string(),
            Self::SmallIntegerField => "SMALLINT".to_string(),
            Self::FloatField => "DOUBLE PRECISION".to_string(),
            Self::BooleanField => "BOOLEAN".to_string(),
        }
    }

    /// Returns the SQL column type for this field on SQLite.
    pub fn sqlite_column_type(&self, max_length: Option<usize>) -> String {
        match self {
            Self::AutoField | Self::BigAutoField | Self::IntegerField
            | Self::BigIntegerField | Self::SmallIntegerField => "INTEGER".to_string(),
            Self::CharField => match max_length {
                Some(n) => format!("VARCHAR({n})"),
                None => "TEXT".to_string(),
            },
            Self::TextField => "TEXT".to_string(),
            Self::FloatField => "REAL".to_string(),
            Self::BooleanField => "BOOL".to_string(),
        }
    }

    /// Returns the SQL column type for the given backend.
    pub fn column_type(&self, max_length: Option<usize>, backend: DatabaseBackendType) -> String {
        match backend {
            DatabaseBackendType::PostgreSQL => self.pg_column_type(max_length),
            DatabaseBackendType::SQLite => self.sqlite_column_type(max_length),
        }
    }
}

/// Complete definition of a model field's column metadata.
///
/// Construct with [`FieldDef::new`] and the builder methods. A `FieldDef`
/// is itself a [`Field`], so ordinary columns (primary keys, plain text)
/// sit next to enumeration fields in a model's field list.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The attribute name of this field.
    pub name: &'static str,
    /// The database column name (may differ from `name`).
    pub column: String,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed in the database.
    pub null: bool,
    /// Whether the field may be left blank in forms.
    pub blank: bool,
    /// Default value for new instances.
    pub default: Option<Value>,
    /// Maximum character length (for CharField and similar).
    pub max_length: Option<usize>,
    /// Human-readable help text.
    pub help_text: String,
    /// Human-readable name for the field.
    pub verbose_name: String,
    /// Allowed values as (value, display_label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
    /// Whether the field is editable in forms.
    pub editable: bool,
}

impl FieldDef {
    /// Creates a new `FieldDef` with sensible defaults.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            column: name.to_string(),
            field_type,
            primary_key: false,
            null: false,
            blank: false,
            default: None,
            max_length: None,
            help_text: String::new(),
            verbose_name: name.replace('_', " "),
            choices: None,
            editable: true,
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.blank = true;
        self
    }

    /// Allows NULL values in the database.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Allows the field to be left blank.
    #[must_use]
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets the default value for this field.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts the field to the given `(value, label)` pairs.
    #[must_use]
    pub fn choices(mut self, choices: Vec<(Value, String)>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Sets the verbose (human-readable) name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Returns `true` if a default value is declared.
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Validates a primitive value against the column constraints.
    ///
    /// Checks run in order: choices (only for non-empty values), null, blank.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if let Some(choices) = &self.choices {
            if !value.is_empty_value() && !choices.iter().any(|(option, _)| option == value) {
                return Err(ValidationError::new(
                    format!("Value {} is not a valid choice.", value.repr()),
                    "invalid_choice",
                )
                .with_param("value", value.repr()));
            }
        }

        if value.is_null() && !self.null {
            return Err(ValidationError::new("This field cannot be null.", "null"));
        }

        if !self.blank && value.is_empty_value() {
            return Err(ValidationError::new("This field cannot be blank.", "blank"));
        }

        Ok(())
    }
}

impl Field for FieldDef {
    fn def(&self) -> &FieldDef {
        self
    }
}
