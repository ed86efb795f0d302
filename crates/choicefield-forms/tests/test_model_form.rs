//! Integration tests for model forms over enumeration fields.
//!
//! These tests build forms from a model instance, render them, and bind
//! submitted data the way an admin change view would.

use std::sync::LazyLock;

use choicefield_core::error::OrmResult;
use choicefield_db::descriptor::EnumAttribute;
use choicefield_db::enums::{EnumDef, Literal, MemberDef};
use choicefield_db::fields::{ChoiceField, Field, FieldDef, FieldType};
use choicefield_db::model::{Model, ModelMeta, Row};
use choicefield_db::value::Value;
use choicefield_forms::form::{Form, FormData};
use choicefield_forms::model_form::{model_form, ModelFormConfig};

static STRING_ENUM: EnumDef = EnumDef {
    name: "StringEnum",
    members: &[
        MemberDef { name: "A", value: Literal::Str("A"), label: None },
        MemberDef { name: "B", value: Literal::Str("B"), label: None },
    ],
    labelled: false,
};

static INTEGER_ENUM: EnumDef = EnumDef {
    name: "IntegerEnum",
    members: &[
        MemberDef { name: "THREE", value: Literal::Int(3), label: None },
        MemberDef { name: "FOUR", value: Literal::Int(4), label: None },
    ],
    labelled: false,
};

static ID: LazyLock<FieldDef> =
    LazyLock::new(|| FieldDef::new("id", FieldType::AutoField).primary_key());
static STR_ENUM: LazyLock<ChoiceField> =
    LazyLock::new(|| ChoiceField::new("str_enum", &STRING_ENUM).build().expect("str enum"));
static INT_ENUM: LazyLock<ChoiceField> =
    LazyLock::new(|| ChoiceField::new("int_enum", &INTEGER_ENUM).build().expect("int enum"));

struct NativeEnumModel {
    id: Option<i64>,
    str_enum: EnumAttribute,
    int_enum: EnumAttribute,
}

impl Model for NativeEnumModel {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "test_app",
                "NativeEnumModel",
                vec![&*ID as &dyn Field, &*STR_ENUM, &*INT_ENUM],
            )
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        self.id.map(Value::Int)
    }

    fn set_pk(&mut self, value: Value) {
        self.id = value.as_int();
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("str_enum", self.str_enum.value()),
            ("int_enum", self.int_enum.value()),
        ]
    }

    fn deferred_fields(&self) -> Vec<&'static str> {
        EnumAttribute::deferred(&[&self.str_enum, &self.int_enum])
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            str_enum: EnumAttribute::from_row(&STR_ENUM, row),
            int_enum: EnumAttribute::from_row(&INT_ENUM, row),
        })
    }
}

fn stored() -> NativeEnumModel {
    let row = Row::new(
        vec!["id".into(), "str_enum".into(), "int_enum".into()],
        vec![Value::Int(1), Value::from("B"), Value::Int(4)],
    );
    NativeEnumModel::from_row(&row).unwrap()
}

fn data(pairs: &[(&str, &str)]) -> FormData {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_renders_selections_for_stored_values() {
    let config = ModelFormConfig::new(NativeEnumModel::meta());
    let form = model_form(&config, Some(&stored()));
    let html = form.as_p();
    assert!(html.contains(r#"<option value="B" selected>B</option>"#));
    assert!(html.contains(r#"<option value="4" selected>FOUR</option>"#));
}

#[test]
fn test_renders_selections_for_resolved_members() {
    let mut instance = stored();
    instance.str_enum.set(STRING_ENUM.member(0).unwrap()).unwrap();
    let config = ModelFormConfig::new(NativeEnumModel::meta());
    let html = model_form(&config, Some(&instance)).as_p();
    assert!(html.contains(r#"<option value="A" selected>A</option>"#));
}

#[tokio::test]
async fn test_rejects_value_outside_choices() {
    let config = ModelFormConfig::new(NativeEnumModel::meta());
    let mut form = model_form(&config, Some(&stored()));
    form.bind(&data(&[("str_enum", "1"), ("int_enum", "3")]));
    assert!(!form.is_valid().await);
    assert_eq!(form.errors().len(), 1);
    assert_eq!(
        form.errors()["str_enum"][0],
        "Select a valid choice. 1 is not one of the available choices."
    );
}

#[tokio::test]
async fn test_valid_submission_cleans_to_members() {
    let config = ModelFormConfig::new(NativeEnumModel::meta());
    let mut form = model_form::<NativeEnumModel>(&config, None);
    form.bind(&data(&[("str_enum", "A"), ("int_enum", "3")]));
    assert!(form.is_valid().await);

    let mut instance = stored();
    instance.str_enum.set(form.cleaned_data()["str_enum"].clone()).unwrap();
    instance.int_enum.set(form.cleaned_data()["int_enum"].clone()).unwrap();
    assert_eq!(instance.str_enum.get().unwrap(), STRING_ENUM.member(0));
    assert_eq!(instance.int_enum.get().unwrap(), INTEGER_ENUM.member(0));
}
