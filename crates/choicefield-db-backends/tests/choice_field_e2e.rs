//! End-to-end tests for enumeration fields against an in-memory SQLite
//! database.
//!
//! Each test creates its own database, builds the tables from model
//! metadata, and drives the ORM through `SqliteBackend`: saving and
//! updating instances, filtering, projecting with `values`, the `raw`
//! transform, fixtures, and model forms.

use std::sync::LazyLock;

use choicefield_core::error::{OrmError, OrmResult};
use choicefield_db::descriptor::EnumAttribute;
use choicefield_db::enums::Choices;
use choicefield_db::executor::{create_model, refresh_model, save_model};
use choicefield_db::fields::{ChoiceField, Field, FieldDef, FieldType};
use choicefield_db::model::{Model, ModelMeta, Row};
use choicefield_db::query::{DatabaseBackendType, Lookup, Manager, Q};
use choicefield_db::schema::create_table_sql;
use choicefield_db::serializers::{deserialize, serialize, JsonSerializer};
use choicefield_db::value::Value;
use choicefield_db_backends::base::DatabaseBackend;
use choicefield_db_backends::SqliteBackend;
use choicefield_forms::form::{Form, FormData};
use choicefield_forms::model_form::{model_form, ModelFormConfig};
use choicefield_macros::Choices;

// ── Enumerations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
#[choices(labelled)]
enum TextChoice {
    #[choice(value = "FIRST", label = "first")]
    First,
    #[choice(value = "SECOND", label = "second")]
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
#[choices(labelled)]
enum IntChoice {
    #[choice(value = 1, label = "one")]
    One,
    #[choice(value = 2, label = "two")]
    Two,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
#[choices(name = "InlinedModel.InlinedEnum")]
enum InlinedEnum {
    #[choice(value = 0, name = "VALUE")]
    Zero,
}

// ── Fields ──────────────────────────────────────────────────────────────

static ID: LazyLock<FieldDef> =
    LazyLock::new(|| FieldDef::new("id", FieldType::AutoField).primary_key());

static TEXT_CHOICE: LazyLock<ChoiceField> =
    LazyLock::new(|| ChoiceField::of::<TextChoice>("text_choice").build().expect("str enum"));
static INT_CHOICE: LazyLock<ChoiceField> =
    LazyLock::new(|| ChoiceField::of::<IntChoice>("int_choice").build().expect("int enum"));

static NULLABLE_CHOICE: LazyLock<ChoiceField> = LazyLock::new(|| {
    ChoiceField::of::<IntChoice>("choice")
        .nullable()
        .blank()
        .build()
        .expect("int enum")
});

static INLINED_DEFAULT: LazyLock<ChoiceField> = LazyLock::new(|| {
    ChoiceField::of::<InlinedEnum>("inlined_default")
        .default(InlinedEnum::Zero)
        .build()
        .expect("int enum")
});
static INLINED_ENUM: LazyLock<ChoiceField> =
    LazyLock::new(|| ChoiceField::of::<InlinedEnum>("inlined_enum").build().expect("int enum"));

// ── Models ──────────────────────────────────────────────────────────────

struct ChoiceModel {
    id: Option<i64>,
    text_choice: EnumAttribute,
    int_choice: EnumAttribute,
}

impl ChoiceModel {
    fn new() -> Self {
        Self {
            id: None,
            text_choice: EnumAttribute::new(&TEXT_CHOICE).unwrap(),
            int_choice: EnumAttribute::new(&INT_CHOICE).unwrap(),
        }
    }

    fn with(text: impl Into<Value>, int: impl Into<Value>) -> Self {
        let mut instance = Self::new();
        instance.text_choice.set(text).unwrap();
        instance.int_choice.set(int).unwrap();
        instance
    }

    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for ChoiceModel {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "test_app",
                "ChoiceModel",
                vec![&*ID as &dyn Field, &*TEXT_CHOICE, &*INT_CHOICE],
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
            ("text_choice", self.text_choice.value()),
            ("int_choice", self.int_choice.value()),
        ]
    }

    fn deferred_fields(&self) -> Vec<&'static str> {
        EnumAttribute::deferred(&[&self.text_choice, &self.int_choice])
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            text_choice: EnumAttribute::from_row(&TEXT_CHOICE, row),
            int_choice: EnumAttribute::from_row(&INT_CHOICE, row),
        })
    }
}

struct NullableModel {
    id: Option<i64>,
    choice: EnumAttribute,
}

impl NullableModel {
    fn new() -> Self {
        Self {
            id: None,
            choice: EnumAttribute::new(&NULLABLE_CHOICE).unwrap(),
        }
    }

    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for NullableModel {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "test_app",
                "NullableModel",
                vec![&*ID as &dyn Field, &*NULLABLE_CHOICE],
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
        vec![("id", self.id.into()), ("choice", self.choice.value())]
    }

    fn deferred_fields(&self) -> Vec<&'static str> {
        EnumAttribute::deferred(&[&self.choice])
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            choice: EnumAttribute::from_row(&NULLABLE_CHOICE, row),
        })
    }
}

struct InlinedModel {
    id: Option<i64>,
    inlined_default: EnumAttribute,
    inlined_enum: EnumAttribute,
}

impl InlinedModel {
    fn new() -> Self {
        Self {
            id: None,
            inlined_default: EnumAttribute::new(&INLINED_DEFAULT).unwrap(),
            inlined_enum: EnumAttribute::new(&INLINED_ENUM).unwrap(),
        }
    }

    fn objects() -> Manager<Self> {
        Manager::new()
    }
}

impl Model for InlinedModel {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "test_app",
                "InlinedModel",
                vec![&*ID as &dyn Field, &*INLINED_DEFAULT, &*INLINED_ENUM],
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
            ("inlined_default", self.inlined_default.value()),
            ("inlined_enum", self.inlined_enum.value()),
        ]
    }

    fn deferred_fields(&self) -> Vec<&'static str> {
        EnumAttribute::deferred(&[&self.inlined_default, &self.inlined_enum])
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            inlined_default: EnumAttribute::from_row(&INLINED_DEFAULT, row),
            inlined_enum: EnumAttribute::from_row(&INLINED_ENUM, row),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

async fn setup() -> SqliteBackend {
    let db = SqliteBackend::memory().unwrap();
    for meta in [ChoiceModel::meta(), NullableModel::meta(), InlinedModel::meta()] {
        db.execute(&create_table_sql(meta, DatabaseBackendType::SQLite), &[])
            .await
            .unwrap();
    }
    db
}

async fn setup_with_instance() -> (SqliteBackend, ChoiceModel) {
    let db = setup().await;
    let mut instance = ChoiceModel::with(TextChoice::Second, IntChoice::One);
    create_model(&mut instance, &db).await.unwrap();
    (db, instance)
}

async fn stored_row(db: &SqliteBackend) -> Row {
    db.query_one(
        "SELECT \"text_choice\", \"int_choice\" FROM \"test_app_choicemodel\"",
        &[],
    )
    .await
    .unwrap()
}

fn validation_message(err: &OrmError) -> &str {
    &err.as_validation().expect("validation error").message
}

// ── Saving ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_errors_saving_unpopulated() {
    let db = setup().await;
    let mut instance = ChoiceModel::new();
    let err = save_model(&mut instance, &db, None).await.unwrap_err();
    assert_eq!(err.validation_code(), Some("null"));
    assert!(instance.id.is_none());
}

#[tokio::test]
async fn test_can_save_to_database_with_enum() {
    let db = setup().await;
    let mut instance = ChoiceModel::with(TextChoice::First, IntChoice::Two);
    save_model(&mut instance, &db, None).await.unwrap();
    assert_eq!(instance.id, Some(1));

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "FIRST");
    assert_eq!(row.get::<i64>("int_choice").unwrap(), 2);

    let mut fetched = ChoiceModel::objects().all().get_exec(&db).await.unwrap();
    assert_eq!(fetched.text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::First));
    assert_eq!(fetched.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
}

#[tokio::test]
async fn test_can_save_to_database_with_enum_value() {
    let db = setup().await;
    let mut instance = ChoiceModel::with("SECOND", 1);
    assert_eq!(instance.text_choice.get().unwrap(), Some(TextChoice::Second.member()));
    assert_eq!(instance.int_choice.get().unwrap(), Some(IntChoice::One.member()));
    save_model(&mut instance, &db, None).await.unwrap();

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "SECOND");
    assert_eq!(row.get::<i64>("int_choice").unwrap(), 1);
}

#[tokio::test]
async fn test_raises_validation_error_assigning_unknown_enum_value() {
    let mut instance = ChoiceModel::new();
    let err = instance.int_choice.set(3).unwrap_err();
    assert_eq!(validation_message(&err), "3 is not a valid IntChoice");
    let err = instance.text_choice.set("THIRD").unwrap_err();
    assert_eq!(validation_message(&err), "'THIRD' is not a valid TextChoice");
    let err = instance.int_choice.set("abc").unwrap_err();
    assert!(validation_message(&err).contains("invalid literal"));
}

#[tokio::test]
async fn test_casts_to_enum_type_from_db_value() {
    let db = setup().await;
    db.execute(
        "INSERT INTO \"test_app_choicemodel\" (\"text_choice\", \"int_choice\") VALUES (?, ?)",
        &[Value::from("FIRST"), Value::Int(2)],
    )
    .await
    .unwrap();

    let mut instance = ChoiceModel::objects().all().get_exec(&db).await.unwrap();
    assert_eq!(instance.text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::First));
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
}

#[tokio::test]
async fn test_defaults_nullable_field_to_none() {
    let db = setup().await;
    let mut instance = NullableModel::new();
    assert_eq!(instance.choice.get().unwrap(), None);
    save_model(&mut instance, &db, None).await.unwrap();

    let mut fetched = NullableModel::objects().all().get_exec(&db).await.unwrap();
    assert_eq!(fetched.choice.get().unwrap(), None);
}

#[tokio::test]
async fn test_can_save_with_inlined_enum_and_default() {
    let db = setup().await;
    let mut instance = InlinedModel::new();
    assert_eq!(instance.inlined_default.get_as::<InlinedEnum>().unwrap(), Some(InlinedEnum::Zero));
    instance.inlined_enum.set(InlinedEnum::Zero).unwrap();
    save_model(&mut instance, &db, None).await.unwrap();

    let mut fetched = InlinedModel::objects().all().get_exec(&db).await.unwrap();
    assert_eq!(fetched.inlined_default.get_as::<InlinedEnum>().unwrap(), Some(InlinedEnum::Zero));
    assert_eq!(fetched.inlined_enum.get_as::<InlinedEnum>().unwrap(), Some(InlinedEnum::Zero));
    assert_eq!(
        fetched.inlined_enum.get().unwrap().map(|m| m.name()),
        Some("VALUE")
    );
}

// ── Filtering ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_can_equals_filter_on_enum() {
    let (db, _) = setup_with_instance().await;
    let qs = ChoiceModel::objects()
        .filter(Q::filter("text_choice", Lookup::Exact(TextChoice::Second.into())))
        .filter(Q::filter("int_choice", Lookup::Exact(IntChoice::One.into())));
    assert!(qs.exists_exec(&db).await.unwrap());

    let qs = ChoiceModel::objects()
        .filter(Q::filter("int_choice", Lookup::Exact(IntChoice::Two.into())));
    assert!(!qs.exists_exec(&db).await.unwrap());
}

#[tokio::test]
async fn test_can_equals_filter_on_enum_value() {
    let (db, _) = setup_with_instance().await;
    let qs = ChoiceModel::objects()
        .filter(Q::filter("text_choice", Lookup::Exact(Value::from("SECOND"))))
        .filter(Q::filter("int_choice", Lookup::Exact(Value::Int(1))));
    assert_eq!(qs.count_exec(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_can_filter_in_enum() {
    let (db, _) = setup_with_instance().await;
    let qs = ChoiceModel::objects()
        .filter(Q::filter("int_choice__in", Lookup::in_members(IntChoice::definition())));
    assert!(qs.exists_exec(&db).await.unwrap());
    let qs = ChoiceModel::objects()
        .filter(Q::filter("text_choice__in", Lookup::in_members(TextChoice::definition())));
    assert!(qs.exists_exec(&db).await.unwrap());
}

#[tokio::test]
async fn test_can_filter_equals_none() {
    let db = setup().await;
    create_model(&mut NullableModel::new(), &db).await.unwrap();
    let qs = NullableModel::objects().filter(Q::filter("choice", Lookup::Exact(Value::Null)));
    assert!(qs.exists_exec(&db).await.unwrap());
    let qs = NullableModel::objects().filter(Q::filter("choice", Lookup::IsNull(true)));
    assert_eq!(qs.count_exec(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_filter_with_unknown_value_fails() {
    let (db, _) = setup_with_instance().await;
    let qs = ChoiceModel::objects()
        .filter(Q::filter("int_choice", Lookup::Exact(Value::Int(1337))));
    let err = qs.exists_exec(&db).await.unwrap_err();
    assert_eq!(validation_message(&err), "1337 is not a valid IntChoice");
}

#[tokio::test]
async fn test_can_filter_unknown_values_with_raw() {
    let db = setup().await;
    let mut instance = ChoiceModel::with(TextChoice::Second, IntChoice::One);
    create_model(&mut instance, &db).await.unwrap();
    let mut inlined = InlinedModel::new();
    inlined.inlined_enum.set(InlinedEnum::Zero).unwrap();
    create_model(&mut inlined, &db).await.unwrap();

    db.execute(
        "UPDATE \"test_app_choicemodel\" SET \"text_choice\" = 'UNKNOWN', \"int_choice\" = 1337",
        &[],
    )
    .await
    .unwrap();
    db.execute(
        "UPDATE \"test_app_inlinedmodel\" SET \"inlined_default\" = 1337, \"inlined_enum\" = 1338",
        &[],
    )
    .await
    .unwrap();

    let choices = ChoiceModel::objects()
        .filter(Q::filter("text_choice__raw", Lookup::Exact(Value::from("UNKNOWN"))))
        .filter(Q::filter("int_choice__raw", Lookup::Exact(Value::Int(1337))))
        .values_list(vec!["text_choice__raw", "int_choice__raw"])
        .values_list_exec(&db)
        .await
        .unwrap();
    assert_eq!(choices, vec![vec![Value::from("UNKNOWN"), Value::Int(1337)]]);

    let inlines = InlinedModel::objects()
        .filter(Q::filter("inlined_default__raw", Lookup::Exact(Value::Int(1337))))
        .filter(Q::filter("inlined_enum__raw", Lookup::Exact(Value::Int(1338))))
        .values_list(vec!["inlined_default__raw", "inlined_enum__raw"])
        .values_list_exec(&db)
        .await
        .unwrap();
    assert_eq!(inlines, vec![vec![Value::Int(1337), Value::Int(1338)]]);
}

// ── Updating ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_can_do_database_update_with_enum() {
    let (db, _) = setup_with_instance().await;
    let updated = ChoiceModel::objects()
        .all()
        .update(vec![
            ("text_choice", TextChoice::First.into()),
            ("int_choice", IntChoice::Two.into()),
        ])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "FIRST");
    assert_eq!(row.get::<i64>("int_choice").unwrap(), 2);
}

#[tokio::test]
async fn test_can_do_database_update_with_enum_value() {
    let (db, _) = setup_with_instance().await;
    let target = || {
        ChoiceModel::objects()
            .filter(Q::filter("text_choice", Lookup::Exact(TextChoice::First.into())))
            .filter(Q::filter("int_choice", Lookup::Exact(IntChoice::Two.into())))
    };
    assert!(!target().exists_exec(&db).await.unwrap());

    let updated = ChoiceModel::objects()
        .all()
        .update(vec![("text_choice", Value::from("FIRST")), ("int_choice", Value::Int(2))])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert!(target().exists_exec(&db).await.unwrap());
}

#[tokio::test]
async fn test_errors_updating_to_unknown_value() {
    let (db, _) = setup_with_instance().await;
    let cases: [(&'static str, Value, &str); 2] = [
        ("text_choice", Value::from("UNKNOWN"), "'UNKNOWN' is not a valid TextChoice"),
        ("int_choice", Value::Int(1337), "1337 is not a valid IntChoice"),
    ];
    for (field, value, message) in cases {
        let err = ChoiceModel::objects()
            .all()
            .update(vec![(field, value)])
            .update_exec(&db)
            .await
            .unwrap_err();
        assert_eq!(validation_message(&err), message);
    }

    let err = NullableModel::objects()
        .all()
        .update(vec![("choice", Value::Int(1337))])
        .update_exec(&db)
        .await
        .unwrap_err();
    assert_eq!(validation_message(&err), "1337 is not a valid IntChoice");

    let err = InlinedModel::objects()
        .all()
        .update(vec![("inlined_default", Value::Int(1337))])
        .update_exec(&db)
        .await
        .unwrap_err();
    assert_eq!(validation_message(&err), "1337 is not a valid InlinedModel.InlinedEnum");

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "SECOND");
}

#[tokio::test]
async fn test_can_do_application_update_with_enum() {
    let (db, mut instance) = setup_with_instance().await;
    instance.text_choice.set(TextChoice::First).unwrap();
    instance.int_choice.set(IntChoice::Two).unwrap();
    save_model(&mut instance, &db, Some(&["text_choice", "int_choice"]))
        .await
        .unwrap();
    assert_eq!(instance.text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::First));

    refresh_model(&mut instance, &db).await.unwrap();
    assert_eq!(instance.text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::First));
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
}

#[tokio::test]
async fn test_can_do_application_update_with_enum_value() {
    let (db, mut instance) = setup_with_instance().await;
    instance.text_choice.set("FIRST").unwrap();
    instance.int_choice.set(2).unwrap();
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
    save_model(&mut instance, &db, Some(&["text_choice", "int_choice"]))
        .await
        .unwrap();

    refresh_model(&mut instance, &db).await.unwrap();
    assert_eq!(instance.text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::First));
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
}

#[tokio::test]
async fn test_can_do_database_update_to_null() {
    let db = setup().await;
    let mut instance = NullableModel::new();
    instance.choice.set(IntChoice::Two).unwrap();
    create_model(&mut instance, &db).await.unwrap();

    let updated = NullableModel::objects()
        .all()
        .update(vec![("choice", Value::Null)])
        .update_exec(&db)
        .await
        .unwrap();
    assert_eq!(updated, 1);
}

#[tokio::test]
async fn test_can_do_application_update_to_null() {
    let db = setup().await;
    let mut instance = NullableModel::new();
    instance.choice.set(IntChoice::Two).unwrap();
    create_model(&mut instance, &db).await.unwrap();

    instance.choice.set(Value::Null).unwrap();
    save_model(&mut instance, &db, Some(&["choice"])).await.unwrap();
    assert_eq!(instance.choice.get().unwrap(), None);
    refresh_model(&mut instance, &db).await.unwrap();
    assert_eq!(instance.choice.get().unwrap(), None);
}

#[tokio::test]
async fn test_update_to_null_on_non_nullable_fails() {
    let (db, _) = setup_with_instance().await;
    let err = ChoiceModel::objects()
        .all()
        .update(vec![("int_choice", Value::Null)])
        .update_exec(&db)
        .await
        .unwrap_err();
    assert_eq!(err.validation_code(), Some("null"));
}

// ── Attribute access ────────────────────────────────────────────────────

#[tokio::test]
async fn test_errors_when_value_is_not_loaded_from_db() {
    let (db, _) = setup_with_instance().await;
    let mut instance = ChoiceModel::objects()
        .all()
        .only(vec!["int_choice"])
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::One));

    let err = instance.text_choice.get().unwrap_err();
    let err = instance.attribute_error(err);
    assert!(matches!(err, OrmError::AttributeError(_)));
    assert!(err.to_string().contains("Found no value"));
    assert!(err.to_string().contains("ChoiceModel object (1)"));
}

#[tokio::test]
async fn test_saving_keeps_unloaded_nullable_value() {
    let db = setup().await;
    let mut instance = NullableModel::new();
    instance.choice.set(IntChoice::Two).unwrap();
    create_model(&mut instance, &db).await.unwrap();

    let mut loaded = NullableModel::objects()
        .all()
        .only(vec![])
        .get_exec(&db)
        .await
        .unwrap();
    assert!(!loaded.choice.is_loaded());
    save_model(&mut loaded, &db, None).await.unwrap();

    let stored = NullableModel::objects()
        .all()
        .values(vec!["choice__raw"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(stored[0]["choice__raw"], Value::Int(2));
}

#[tokio::test]
async fn test_saving_partially_loaded_instance_updates_loaded_fields() {
    let (db, _) = setup_with_instance().await;
    let mut loaded = ChoiceModel::objects()
        .all()
        .only(vec!["int_choice"])
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(loaded.deferred_fields(), vec!["text_choice"]);
    loaded.int_choice.set(IntChoice::Two).unwrap();
    save_model(&mut loaded, &db, None).await.unwrap();

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "SECOND");
    assert_eq!(row.get::<i64>("int_choice").unwrap(), 2);
}

#[tokio::test]
async fn test_refresh_reloads_stored_values() {
    let (db, mut instance) = setup_with_instance().await;
    db.execute("UPDATE \"test_app_choicemodel\" SET \"int_choice\" = 2", &[])
        .await
        .unwrap();
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::One));
    refresh_model(&mut instance, &db).await.unwrap();
    assert_eq!(instance.int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::Two));
}

#[test]
fn test_get_db_prep_value_handles_prepared_enum() {
    let value = INLINED_ENUM
        .get_db_prep_value(InlinedEnum::Zero.into(), true)
        .unwrap();
    assert_eq!(value, Value::Int(0));
}

// ── Serialization and projections ───────────────────────────────────────

#[tokio::test]
async fn test_can_serialize_and_parse() {
    let (db, _) = setup_with_instance().await;
    let instances = ChoiceModel::objects().all().execute_query(&db).await.unwrap();
    let data = serialize(&JsonSerializer, &instances).unwrap();
    assert!(data.contains(r#""text_choice":"SECOND""#));

    let mut parsed: Vec<ChoiceModel> = deserialize(&JsonSerializer, &data).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].text_choice.get_as::<TextChoice>().unwrap(), Some(TextChoice::Second));
    assert_eq!(parsed[0].int_choice.get_as::<IntChoice>().unwrap(), Some(IntChoice::One));

    let mut inlined = InlinedModel::new();
    inlined.inlined_enum.set(InlinedEnum::Zero).unwrap();
    create_model(&mut inlined, &db).await.unwrap();
    let inlines = InlinedModel::objects().all().execute_query(&db).await.unwrap();
    let data = serialize(&JsonSerializer, &inlines).unwrap();
    let mut parsed: Vec<InlinedModel> = deserialize(&JsonSerializer, &data).unwrap();
    assert_eq!(parsed[0].inlined_enum.get_as::<InlinedEnum>().unwrap(), Some(InlinedEnum::Zero));
}

#[tokio::test]
async fn test_raw_lookup_returns_enum_values() {
    let (db, _) = setup_with_instance().await;
    create_model(&mut NullableModel::new(), &db).await.unwrap();

    let choices = ChoiceModel::objects()
        .all()
        .values(vec!["text_choice__raw", "int_choice__raw"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(choices.len(), 1);
    assert_eq!(choices[0]["text_choice__raw"], Value::from("SECOND"));
    assert_eq!(choices[0]["int_choice__raw"], Value::Int(1));

    let nullables = NullableModel::objects()
        .all()
        .values(vec!["choice__raw"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(nullables[0]["choice__raw"], Value::Null);
}

#[tokio::test]
async fn test_raw_lookup_returns_stored_values() {
    let (db, _) = setup_with_instance().await;
    db.execute(
        "UPDATE \"test_app_choicemodel\" SET \"text_choice\" = 'UNKNOWN', \"int_choice\" = 1337",
        &[],
    )
    .await
    .unwrap();

    let choices = ChoiceModel::objects()
        .all()
        .values(vec!["text_choice__raw", "int_choice__raw"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(choices[0]["text_choice__raw"], Value::from("UNKNOWN"));
    assert_eq!(choices[0]["int_choice__raw"], Value::Int(1337));
}

#[tokio::test]
async fn test_queryset_values_returns_enum_instances() {
    let (db, _) = setup_with_instance().await;
    create_model(&mut NullableModel::new(), &db).await.unwrap();

    let choices = ChoiceModel::objects()
        .all()
        .values(vec!["text_choice", "int_choice"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(choices[0]["text_choice"], TextChoice::Second.into());
    assert_eq!(choices[0]["int_choice"], IntChoice::One.into());

    let nullables = NullableModel::objects()
        .all()
        .values(vec!["choice"])
        .values_exec(&db)
        .await
        .unwrap();
    assert_eq!(nullables[0]["choice"], Value::Null);
}

#[tokio::test]
async fn test_errors_fetching_row_with_unknown_enum_value() {
    let (db, _) = setup_with_instance().await;
    db.execute("UPDATE \"test_app_choicemodel\" SET \"text_choice\" = 'UNKNOWN'", &[])
        .await
        .unwrap();

    let err = ChoiceModel::objects()
        .all()
        .values(vec![])
        .values_exec(&db)
        .await
        .unwrap_err();
    assert_eq!(validation_message(&err), "'UNKNOWN' is not a valid TextChoice");

    // Loading instances defers coercion until the attribute is read.
    let mut instance = ChoiceModel::objects().all().get_exec(&db).await.unwrap();
    let err = instance.text_choice.get().unwrap_err();
    assert_eq!(validation_message(&err), "'UNKNOWN' is not a valid TextChoice");
}

// ── Forms ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_form_renders_stored_selection() {
    let (db, _) = setup_with_instance().await;
    let instance = ChoiceModel::objects().all().get_exec(&db).await.unwrap();
    let config = ModelFormConfig::new(ChoiceModel::meta());
    let html = model_form(&config, Some(&instance)).as_p();
    assert!(html.contains(r#"<option value="SECOND" selected>second</option>"#));
    assert!(html.contains(r#"<option value="1" selected>one</option>"#));
}

#[tokio::test]
async fn test_form_rejects_value_outside_choices_and_saves_valid_data() {
    let (db, mut instance) = setup_with_instance().await;
    let config = ModelFormConfig::new(ChoiceModel::meta());

    let mut form = model_form(&config, Some(&instance));
    let data: FormData = [("text_choice", "FIRST"), ("int_choice", "3")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    form.bind(&data);
    assert!(!form.is_valid().await);
    assert_eq!(
        form.errors()["int_choice"],
        vec!["Select a valid choice. 3 is not one of the available choices.".to_string()]
    );

    let mut form = model_form(&config, Some(&instance));
    let data: FormData = [("text_choice", "FIRST"), ("int_choice", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    form.bind(&data);
    assert!(form.is_valid().await);
    let cleaned = form.cleaned_data();
    instance.text_choice.set(cleaned["text_choice"].clone()).unwrap();
    instance.int_choice.set(cleaned["int_choice"].clone()).unwrap();
    save_model(&mut instance, &db, None).await.unwrap();

    let row = stored_row(&db).await;
    assert_eq!(row.get::<String>("text_choice").unwrap(), "FIRST");
    assert_eq!(row.get::<i64>("int_choice").unwrap(), 2);
}
