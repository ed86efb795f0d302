//! Drives the whole stack through the meta-crate: settings, logging, the
//! derive, a SQLite database opened from configuration, and a model form.

use choicefield::core::settings_loader;
use choicefield::db::schema::create_table_sql;
use choicefield::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
#[choices(crate = "choicefield::db", labelled)]
enum Size {
    #[choice(value = "S", label = "small")]
    Small,
    #[choice(value = "XL", label = "extra large")]
    ExtraLarge,
}

const SETTINGS: &str = r#"
debug = false
log_level = "choicefield_db=debug"
default_char_max_length = 2

[databases.default]
engine = "sqlite3"
name = ":memory:"
"#;

static SETTINGS_LOADED: LazyLock<Settings> =
    LazyLock::new(|| settings_loader::from_toml_str(SETTINGS).expect("valid settings"));

static ID: LazyLock<FieldDef> =
    LazyLock::new(|| FieldDef::new("id", FieldType::AutoField).primary_key());
static SIZE: LazyLock<ChoiceField> = LazyLock::new(|| {
    ChoiceField::of::<Size>("size")
        .default(Size::Small)
        .build_with(&SETTINGS_LOADED)
        .expect("str enum")
});

struct Shirt {
    id: Option<i64>,
    size: EnumAttribute,
}

impl Model for Shirt {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> =
            LazyLock::new(|| ModelMeta::new("shop", "Shirt", vec![&*ID as &dyn Field, &*SIZE]));
        &META
    }

    fn pk(&self) -> Option<Value> {
        self.id.map(Value::Int)
    }

    fn set_pk(&mut self, value: Value) {
        self.id = value.as_int();
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("size", self.size.value())]
    }

    fn deferred_fields(&self) -> Vec<&'static str> {
        EnumAttribute::deferred(&[&self.size])
    }

    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            size: EnumAttribute::from_row(&SIZE, row),
        })
    }
}

async fn connect() -> SqliteBackend {
    setup_logging(&SETTINGS_LOADED);
    let database = SETTINGS_LOADED.database("default").expect("default database");
    let config = DatabaseConfig::from_settings(database).unwrap();
    let db = SqliteBackend::from_config(&config).unwrap();
    db.execute(&create_table_sql(Shirt::meta(), DatabaseBackend::backend_type(&db)), &[])
        .await
        .unwrap();
    db
}

#[test]
fn test_settings_shape_the_field() {
    assert!(!SETTINGS_LOADED.debug);
    assert_eq!(SIZE.def().max_length, Some(2));
    assert_eq!(Size::definition().name, "Size");
    assert_eq!(
        SIZE.choices(),
        &[
            (Value::from("S"), "small".to_string()),
            (Value::from("XL"), "extra large".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_save_and_reload_through_configured_backend() {
    let db = connect().await;
    let mut shirt = Shirt {
        id: None,
        size: EnumAttribute::new(&SIZE).unwrap(),
    };
    assert_eq!(shirt.size.get_as::<Size>().unwrap(), Some(Size::Small));
    shirt.size.set(Size::ExtraLarge).unwrap();
    save_model(&mut shirt, &db, None).await.unwrap();

    let objects: Manager<Shirt> = Manager::new();
    let mut loaded = objects
        .filter(Q::filter("size", Lookup::Exact(Value::from("XL"))))
        .get_exec(&db)
        .await
        .unwrap();
    assert_eq!(loaded.size.get_as::<Size>().unwrap(), Some(Size::ExtraLarge));

    let html = model_form(&ModelFormConfig::new(Shirt::meta()), Some(&loaded)).as_p();
    assert!(html.contains(r#"<option value="XL" selected>extra large</option>"#));
}
