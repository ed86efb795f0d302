//! Model-backed forms that derive their fields from ORM model metadata.
//!
//! [`formfield_for`] turns one model field into a [`FormFieldDef`]. For a
//! [`ChoiceField`] that is a [`FormFieldType::TypedChoice`] over the
//! members' primitives, coerced back through the field so cleaned data
//! holds members. [`ModelFormConfig`] and [`generate_form_fields`] do the
//! same for a whole model, and [`model_form`] builds a bound-ready
//! [`BaseForm`] pre-filled from an instance.

use std::collections::HashMap;

use choicefield_db::fields::{ChoiceField, Field, FieldDef, FieldType};
use choicefield_db::model::{Model, ModelMeta};
use choicefield_db::value::Value;

use crate::fields::{prepare_value, Coerce, FormFieldDef, FormFieldType};
use crate::form::BaseForm;

/// The label of the empty option offered by optional choice fields.
pub const BLANK_CHOICE_LABEL: &str = "---------";

/// Configuration for generating a model-backed form.
///
/// Specifies which model fields to include/exclude and allows overriding
/// labels and help texts for the generated form fields.
#[derive(Debug)]
pub struct ModelFormConfig {
    /// The model metadata to generate fields from.
    pub model_meta: &'static ModelMeta,
    /// Which model fields to include in the form.
    pub fields: ModelFormFields,
    /// Label overrides keyed by field name.
    pub labels: HashMap<String, String>,
    /// Help text overrides keyed by field name.
    pub help_texts: HashMap<String, String>,
}

/// Specifies which model fields to include in a model form.
#[derive(Debug, Clone)]
pub enum ModelFormFields {
    /// Include all editable fields.
    All,
    /// Include only the specified fields.
    Include(Vec<String>),
    /// Include all fields except the specified ones.
    Exclude(Vec<String>),
}

impl ModelFormFields {
    fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(names) => names.iter().any(|n| n == name),
            Self::Exclude(names) => !names.iter().any(|n| n == name),
        }
    }
}

impl ModelFormConfig {
    /// Creates a new `ModelFormConfig` with all fields included.
    pub fn new(model_meta: &'static ModelMeta) -> Self {
        Self {
            model_meta,
            fields: ModelFormFields::All,
            labels: HashMap::new(),
            help_texts: HashMap::new(),
        }
    }

    /// Sets which fields to include.
    pub fn with_fields(mut self, fields: ModelFormFields) -> Self {
        self.fields = fields;
        self
    }

    /// Adds a label override for a specific field.
    pub fn with_label(mut self, field_name: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field_name.into(), label.into());
        self
    }

    /// Adds a help text override for a specific field.
    pub fn with_help_text(
        mut self,
        field_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.help_texts.insert(field_name.into(), text.into());
        self
    }
}

/// `"text choice"` -> `"Text choice"`.
fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Builds the form field for one model field.
///
/// The field is required unless the model field allows blank. Choice
/// fields get an empty `---------` option when they allow blank or have
/// no default.
pub fn formfield_for(field: &'static dyn Field) -> FormFieldDef {
    let def = field.def();
    let field_type = match field.as_choice() {
        Some(choice) => choice_form_type(choice),
        None => plain_form_type(field, def),
    };

    let mut form_field = FormFieldDef::new(def.name, field_type)
        .required(!def.blank)
        .label(capfirst(&def.verbose_name))
        .help_text(def.help_text.clone());
    if let Some(default) = &def.default {
        form_field.initial = Some(default.clone());
    }
    form_field
}

fn choice_form_type(choice: &'static ChoiceField) -> FormFieldType {
    let def = choice.def();
    let mut choices = Vec::with_capacity(choice.choices().len() + 1);
    if def.blank || !def.has_default() {
        choices.push((String::new(), BLANK_CHOICE_LABEL.to_string()));
    }
    choices.extend(
        choice
            .choices()
            .iter()
            .map(|(value, label)| (prepare_value(value).unwrap_or_default(), label.clone())),
    );
    FormFieldType::TypedChoice {
        choices,
        coerce: Coerce::new(move |raw| choice.to_python(Value::from(raw))),
        empty_value: if def.null {
            Value::Null
        } else {
            Value::String(String::new())
        },
    }
}

fn plain_form_type(field: &'static dyn Field, def: &FieldDef) -> FormFieldType {
    if let Some(choices) = &def.choices {
        let mut options = vec![(String::new(), BLANK_CHOICE_LABEL.to_string())];
        options.extend(
            choices
                .iter()
                .map(|(value, label)| (prepare_value(value).unwrap_or_default(), label.clone())),
        );
        return FormFieldType::TypedChoice {
            choices: options,
            coerce: Coerce::new(move |raw| field.to_python(Value::from(raw))),
            empty_value: Value::Null,
        };
    }
    match def.field_type {
        FieldType::IntegerField
        | FieldType::BigIntegerField
        | FieldType::SmallIntegerField
        | FieldType::AutoField
        | FieldType::BigAutoField => FormFieldType::Integer,
        FieldType::CharField => FormFieldType::Char {
            max_length: def.max_length,
            strip: true,
        },
        FieldType::TextField | FieldType::FloatField | FieldType::BooleanField => {
            FormFieldType::Char {
                max_length: None,
                strip: false,
            }
        }
    }
}

/// Generates form field definitions from a model form configuration.
///
/// Primary keys and non-editable fields are skipped.
pub fn generate_form_fields(config: &ModelFormConfig) -> Vec<FormFieldDef> {
    config
        .model_meta
        .fields
        .iter()
        .copied()
        .filter(|field| {
            let def = field.def();
            def.editable && !def.primary_key && config.fields.includes(def.name)
        })
        .map(|field| {
            let name = field.name();
            let mut form_field = formfield_for(field);
            if let Some(label) = config.labels.get(name) {
                form_field.label = label.clone();
            }
            if let Some(help_text) = config.help_texts.get(name) {
                form_field.help_text = help_text.clone();
            }
            form_field
        })
        .collect()
}

/// Builds a form for `M`, pre-filled from `instance` when given.
pub fn model_form<M: Model>(config: &ModelFormConfig, instance: Option<&M>) -> BaseForm {
    let form = BaseForm::new(generate_form_fields(config));
    match instance {
        Some(instance) => form.with_initial(
            instance
                .field_values()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        ),
        None => form,
    }
}
