//! # choicefield-forms
//!
//! Form layer for choicefield. Provides form field definitions with
//! type-level cleaning, HTML widgets, a general-purpose [`BaseForm`], and
//! the bridge that derives form fields from model fields.
//!
//! Enumeration columns become [`FormFieldType::TypedChoice`] fields whose
//! options are the members' primitives; values handed to a widget are
//! unwrapped from members first, so the stored option renders `selected`.
//!
//! ## Module Overview
//!
//! - [`fields`] - Form field definitions and cleaning
//! - [`widgets`] - Widget trait and built-in widgets
//! - [`form`] - The [`Form`] trait and [`BaseForm`]
//! - [`model_form`] - Form fields derived from [`ModelMeta`](choicefield_db::model::ModelMeta)

// needless_pass_by_value: builder methods take owned values for ergonomics
// return_self_not_must_use: builder pattern methods are self-documenting
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::format_push_string)]
#![allow(clippy::ref_option)]

pub mod fields;
pub mod form;
pub mod model_form;
pub mod widgets;

pub use fields::{clean_field_value, prepare_value, Coerce, FormFieldDef, FormFieldType};
pub use form::{BaseForm, Form, FormData};
pub use model_form::{
    formfield_for, generate_form_fields, model_form, ModelFormConfig, ModelFormFields,
};
pub use widgets::{Select, Widget, WidgetType};
