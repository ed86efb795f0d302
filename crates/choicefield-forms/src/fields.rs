//! Form field definitions and type-level cleaning.
//!
//! Each [`FormFieldDef`] describes a single form field: its type, widget,
//! and metadata. The [`FormFieldType`] enum carries the type-specific
//! parsing and coercion logic dispatched by [`clean_field_value`].
//!
//! Values travel to widgets as strings through [`prepare_value`], which
//! unwraps enumeration members to their primitives.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use choicefield_core::error::OrmResult;
use choicefield_db::value::Value;

use crate::widgets::{create_widget_with_choices, WidgetType};

type CoerceFn = dyn Fn(&str) -> OrmResult<Value> + Send + Sync;

/// A shared conversion from submitted text to a typed value.
#[derive(Clone)]
pub struct Coerce(Arc<CoerceFn>);

impl Coerce {
    /// Wraps a conversion function.
    pub fn new(f: impl Fn(&str) -> OrmResult<Value> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Passes submitted text through unchanged.
    pub fn identity() -> Self {
        Self::new(|s| Ok(Value::String(s.to_string())))
    }

    /// Applies the conversion.
    pub fn call(&self, raw: &str) -> OrmResult<Value> {
        (self.0)(raw)
    }
}

impl fmt::Debug for Coerce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coerce(..)")
    }
}

/// Defines the type of a form field, including type-specific parameters.
#[derive(Debug, Clone)]
pub enum FormFieldType {
    /// A character (string) field.
    Char {
        /// Maximum length (characters).
        max_length: Option<usize>,
        /// Whether to strip leading/trailing whitespace.
        strip: bool,
    },
    /// An integer field.
    Integer,
    /// A choice field with a coercion function.
    TypedChoice {
        /// Available choices as `(value, display_label)` pairs.
        choices: Vec<(String, String)>,
        /// Converts the submitted choice into a `Value`.
        coerce: Coerce,
        /// The value produced when nothing is selected.
        empty_value: Value,
    },
}

/// Complete definition of a form field.
#[derive(Debug, Clone)]
pub struct FormFieldDef {
    /// The field name (HTML name attribute).
    pub name: String,
    /// The field type, controlling parsing and coercion.
    pub field_type: FormFieldType,
    /// Whether this field is required.
    pub required: bool,
    /// Default/initial value.
    pub initial: Option<Value>,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Human-readable label.
    pub label: String,
    /// The widget type used for rendering.
    pub widget: WidgetType,
    /// Custom error messages keyed by error code.
    pub error_messages: HashMap<String, String>,
}

impl FormFieldDef {
    /// Creates a new `FormFieldDef` with sensible defaults.
    ///
    /// The field is required by default and uses the default widget for
    /// its type.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = name.replace('_', " ");
        Self {
            name,
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label,
            widget,
            error_messages: HashMap::new(),
        }
    }

    /// Sets whether this field is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget type.
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// Sets a custom error message for a given code.
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// The options offered by a choice field; empty for other types.
    pub fn choices(&self) -> &[(String, String)] {
        match &self.field_type {
            FormFieldType::TypedChoice { choices, .. } => choices,
            _ => &[],
        }
    }

    /// Renders the field's widget with `value` as the current value.
    pub fn render(&self, value: &Value, attrs: &HashMap<String, String>) -> String {
        create_widget_with_choices(&self.widget, self.choices()).render(
            &self.name,
            &prepare_value(value),
            attrs,
        )
    }

    fn message(&self, code: &str, default: impl FnOnce() -> String) -> String {
        self.error_messages.get(code).cloned().unwrap_or_else(default)
    }
}

/// Converts a value to the text a widget displays.
///
/// Members become their primitive value; `Null` shows nothing.
pub fn prepare_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Enum(member) => prepare_value(&member.value()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Returns the default widget type for a given form field type.
pub fn default_widget_for_field_type(field_type: &FormFieldType) -> WidgetType {
    match field_type {
        FormFieldType::Char { .. } => WidgetType::TextInput,
        FormFieldType::Integer => WidgetType::NumberInput,
        FormFieldType::TypedChoice { .. } => WidgetType::Select,
    }
}

/// Cleans (validates and coerces) a raw form input string into a typed `Value`.
///
/// This performs:
/// 1. Required check (if `required` and value is empty/None)
/// 2. Type coercion and type-specific validation (length, choices)
///
/// Returns the cleaned `Value` or a list of error messages.
pub fn clean_field_value(field: &FormFieldDef, raw: Option<&str>) -> Result<Value, Vec<String>> {
    let raw_str = raw.unwrap_or("");
    let is_empty = raw_str.is_empty();

    if field.required && is_empty {
        return Err(vec![
            field.message("required", || "This field is required.".to_string())
        ]);
    }

    if is_empty {
        return Ok(match &field.field_type {
            FormFieldType::TypedChoice { empty_value, .. } => empty_value.clone(),
            _ => field.initial.clone().unwrap_or(Value::Null),
        });
    }

    let mut errors = Vec::new();

    let value = match &field.field_type {
        FormFieldType::Char { max_length, strip } => {
            let s = if *strip { raw_str.trim() } else { raw_str };
            if let Some(max) = max_length {
                let len = s.chars().count();
                if len > *max {
                    errors.push(format!(
                        "Ensure this value has at most {max} characters (it has {len})."
                    ));
                }
            }
            Value::String(s.to_string())
        }

        FormFieldType::Integer => match raw_str.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                errors.push(field.message("invalid", || "Enter a whole number.".to_string()));
                Value::Null
            }
        },

        FormFieldType::TypedChoice {
            choices, coerce, ..
        } => {
            let invalid_choice = || {
                field.message("invalid_choice", || {
                    format!(
                        "Select a valid choice. {raw_str} is not one of the available choices."
                    )
                })
            };
            if !choices.iter().any(|(v, _)| v == raw_str) {
                errors.push(invalid_choice());
                Value::Null
            } else {
                match coerce.call(raw_str) {
                    Ok(v) => v,
                    Err(_) => {
                        errors.push(invalid_choice());
                        Value::Null
                    }
                }
            }
        }
    };

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}
