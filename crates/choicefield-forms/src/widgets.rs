//! Widget system for rendering HTML form elements.
//!
//! Widgets are the bridge between form fields and their HTML representation.
//! Each widget knows how to render itself as HTML, extract a value from
//! submitted form data, and generate an appropriate `id` attribute for
//! its `<label>` element.

use std::collections::HashMap;
use std::fmt;

use crate::form::FormData;

/// Enumerates the built-in widget types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<select>`.
    Select,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::Select => "Select",
        };
        write!(f, "{name}")
    }
}

/// A trait for HTML form widgets.
///
/// Widgets are responsible for:
/// - Rendering an HTML element for a given field name and value
/// - Extracting the raw value from submitted form data
/// - Generating the `id` attribute for an associated `<label>` element
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The current value to display (if any)
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: &Option<String>, attrs: &HashMap<String, String>)
        -> String;

    /// Extracts a raw string value from the submitted form data.
    ///
    /// Returns `None` if no value was submitted for this field name.
    fn value_from_data(&self, data: &FormData, name: &str) -> Option<String> {
        data.get(name).cloned()
    }

    /// Returns the HTML `id` attribute value for a label targeting this widget.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats an HTML attributes map into a string like ` key="value" key2="value2"`.
fn render_attrs(attrs: &HashMap<String, String>) -> String {
    if attrs.is_empty() {
        return String::new();
    }
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{v}""#))
        .collect();
    parts.sort(); // deterministic output for testing
    parts.join("")
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(
        &self,
        name: &str,
        value: &Option<String>,
        attrs: &HashMap<String, String>,
    ) -> String {
        let val = value.as_deref().unwrap_or("");
        format!(
            r#"<input type="text" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }
}

/// A `<input type="number">` widget.
#[derive(Debug, Clone)]
pub struct NumberInput;

impl Widget for NumberInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::NumberInput
    }

    fn render(
        &self,
        name: &str,
        value: &Option<String>,
        attrs: &HashMap<String, String>,
    ) -> String {
        let val = value.as_deref().unwrap_or("");
        format!(
            r#"<input type="number" name="{name}" value="{val}"{} />"#,
            render_attrs(attrs)
        )
    }
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a new `Select` widget with the given choices.
    pub fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(
        &self,
        name: &str,
        value: &Option<String>,
        attrs: &HashMap<String, String>,
    ) -> String {
        let current = value.as_deref().unwrap_or("");
        let mut options = String::new();
        for (val, label) in &self.choices {
            let selected = if val == current { " selected" } else { "" };
            options.push_str(&format!(
                r#"<option value="{val}"{selected}>{label}</option>"#
            ));
        }
        format!(
            r#"<select name="{name}"{}>{options}</select>"#,
            render_attrs(attrs)
        )
    }
}

/// Creates a boxed widget from a `WidgetType`, handing `choices` to
/// choice-based widgets.
pub fn create_widget_with_choices(
    widget_type: &WidgetType,
    choices: &[(String, String)],
) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(TextInput),
        WidgetType::NumberInput => Box::new(NumberInput),
        WidgetType::Select => Box::new(Select::new(choices.to_vec())),
    }
}
