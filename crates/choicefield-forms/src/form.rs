//! Form trait and `BaseForm` implementation.
//!
//! The [`Form`] trait is the core abstraction for form types. It supports
//! async validation, data binding from submitted key/value pairs, and
//! HTML rendering of its fields.
//!
//! [`BaseForm`] provides a concrete, general-purpose implementation of the
//! `Form` trait that can be constructed from a list of field definitions.

use std::collections::HashMap;

use async_trait::async_trait;
use choicefield_db::value::Value;

use crate::fields::{clean_field_value, prepare_value, FormFieldDef};
use crate::widgets::create_widget_with_choices;

/// Submitted form data, keyed by field name.
pub type FormData = HashMap<String, String>;

/// The core form trait. All form types implement this.
///
/// `is_valid()` and `clean()` are async so implementations can consult the
/// database during validation.
#[async_trait]
pub trait Form: Send + Sync {
    /// Returns the form's field definitions.
    fn fields(&self) -> &[FormFieldDef];

    /// Returns the initial (default) values for fields.
    fn initial(&self) -> &HashMap<String, Value>;

    /// Binds raw form data to this form.
    fn bind(&mut self, data: &FormData);

    /// Returns `true` if this form has been bound to data.
    fn is_bound(&self) -> bool;

    /// Validates the form. Returns `true` if valid.
    ///
    /// After calling this, `errors()` and `cleaned_data()` are populated.
    async fn is_valid(&mut self) -> bool;

    /// Returns per-field validation errors.
    ///
    /// Keys are field names, values are lists of error messages.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Returns the cleaned (validated and coerced) data.
    fn cleaned_data(&self) -> &HashMap<String, Value>;

    /// Cross-field validation hook. The default implementation does nothing.
    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }
}

/// A general-purpose form implementation.
pub struct BaseForm {
    field_defs: Vec<FormFieldDef>,
    initial_data: HashMap<String, Value>,
    bound: bool,
    raw_data: HashMap<String, Option<String>>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
}

impl BaseForm {
    /// Creates a new `BaseForm` with the given field definitions.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            field_defs: fields,
            initial_data: HashMap::new(),
            bound: false,
            raw_data: HashMap::new(),
            errors: HashMap::new(),
            cleaned_data: HashMap::new(),
        }
    }

    /// Sets initial values for fields, overriding the fields' own initials.
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.initial_data = initial;
        self
    }

    /// Returns the field definition named `name`.
    pub fn field(&self, name: &str) -> Option<&FormFieldDef> {
        self.field_defs.iter().find(|f| f.name == name)
    }

    /// The text a field's widget shows: submitted data when bound,
    /// otherwise the prepared initial value.
    pub fn value_for(&self, field: &FormFieldDef) -> Option<String> {
        if self.bound {
            return self.raw_data.get(&field.name).cloned().flatten();
        }
        self.initial_data
            .get(&field.name)
            .or(field.initial.as_ref())
            .and_then(prepare_value)
    }

    /// Renders one field's widget, or `None` for an unknown name.
    pub fn render_field(&self, name: &str) -> Option<String> {
        let field = self.field(name)?;
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), format!("id_{}", field.name));
        let widget = create_widget_with_choices(&field.widget, field.choices());
        Some(widget.render(&field.name, &self.value_for(field), &attrs))
    }

    /// Renders every field as `<p>` blocks with labels and error lists.
    pub fn as_p(&self) -> String {
        let mut html = String::new();
        for field in &self.field_defs {
            html.push_str("<p>");
            if let Some(errors) = self.errors.get(&field.name) {
                html.push_str(r#"<ul class="errorlist">"#);
                for error in errors {
                    html.push_str(&format!("<li>{error}</li>"));
                }
                html.push_str("</ul>");
            }
            html.push_str(&format!(
                r#"<label for="id_{}">{}:</label> "#,
                field.name, field.label
            ));
            html.push_str(&self.render_field(&field.name).unwrap_or_default());
            html.push_str("</p>");
        }
        html
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.field_defs
    }

    fn initial(&self) -> &HashMap<String, Value> {
        &self.initial_data
    }

    fn bind(&mut self, data: &FormData) {
        self.bound = true;
        self.raw_data.clear();
        self.errors.clear();
        self.cleaned_data.clear();
        for field in &self.field_defs {
            let widget = create_widget_with_choices(&field.widget, field.choices());
            self.raw_data
                .insert(field.name.clone(), widget.value_from_data(data, &field.name));
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    async fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }

        self.errors.clear();
        self.cleaned_data.clear();

        for field in &self.field_defs {
            let raw = self.raw_data.get(&field.name).cloned().flatten();
            match clean_field_value(field, raw.as_deref()) {
                Ok(value) => {
                    self.cleaned_data.insert(field.name.clone(), value);
                }
                Err(errors) => {
                    self.errors.insert(field.name.clone(), errors);
                }
            }
        }

        if self.errors.is_empty() {
            if let Err(form_errors) = self.clean().await {
                for (name, errors) in form_errors {
                    self.errors.entry(name).or_default().extend(errors);
                }
            }
        }

        if !self.errors.is_empty() {
            self.cleaned_data.clear();
        }
        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }
}
