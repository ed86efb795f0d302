//! Model trait and metadata for the ORM.
//!
//! The [`Model`] trait is the core abstraction that all ORM models implement.
//! It provides access to metadata, field values, and construction from
//! database rows. Enumeration columns are held on the instance as
//! [`EnumAttribute`](crate::descriptor::EnumAttribute)s and their column
//! specifications live in the model's static [`ModelMeta`].

use choicefield_core::error::{OrmError, OrmResult};

use crate::fields::{ChoiceField, Field};
use crate::query::expressions::Expression;
use crate::value::Value;

/// A database row abstraction used for constructing model instances.
pub use crate::query::compiler::Row;

/// The core trait for all ORM models.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use choicefield_core::OrmResult;
/// use choicefield_db::descriptor::EnumAttribute;
/// use choicefield_db::enums::{EnumDef, Literal, MemberDef};
/// use choicefield_db::fields::{ChoiceField, Field, FieldDef, FieldType};
/// use choicefield_db::model::{Model, ModelMeta, Row};
/// use choicefield_db::value::Value;
///
/// static COLOR: EnumDef = EnumDef {
///     name: "Color",
///     members: &[
///         MemberDef { name: "RED", value: Literal::Int(1), label: None },
///         MemberDef { name: "GREEN", value: Literal::Int(2), label: None },
///     ],
///     labelled: false,
/// };
///
/// static ID: LazyLock<FieldDef> =
///     LazyLock::new(|| FieldDef::new("id", FieldType::BigAutoField).primary_key());
/// static PAINT_COLOR: LazyLock<ChoiceField> =
///     LazyLock::new(|| ChoiceField::new("color", &COLOR).build().expect("int enum"));
///
/// struct Paint {
///     id: Option<i64>,
///     color: EnumAttribute,
/// }
///
/// impl Model for Paint {
///     fn meta() -> &'static ModelMeta {
///         static META: LazyLock<ModelMeta> = LazyLock::new(|| {
///             ModelMeta::new("shop", "Paint", vec![&*ID as &dyn Field, &*PAINT_COLOR])
///         });
///         &META
///     }
///
///     fn pk(&self) -> Option<Value> { self.id.map(Value::Int) }
///     fn set_pk(&mut self, value: Value) { self.id = value.as_int(); }
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", self.id.into()), ("color", self.color.value())]
///     }
///     fn deferred_fields(&self) -> Vec<&'static str> {
///         EnumAttribute::deferred(&[&self.color])
///     }
///     fn from_row(row: &Row) -> OrmResult<Self> {
///         Ok(Paint {
///             id: row.get("id")?,
///             color: EnumAttribute::from_row(&PAINT_COLOR, row),
///         })
///     }
/// }
///
/// let mut paint = Paint { id: None, color: EnumAttribute::new(&PAINT_COLOR).unwrap() };
/// assert_eq!(Paint::table_name(), "shop_paint");
/// let err = paint.color.get().map_err(|e| paint.attribute_error(e)).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "Found no value for 'color' on 'Paint' instance 'Paint object (None)'"
/// );
/// ```
pub trait Model: Send + Sync + Sized + 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        &Self::meta().db_table
    }

    /// Returns the primary key value, or `None` if unsaved.
    fn pk(&self) -> Option<Value>;

    /// Sets the primary key value on this instance (used after INSERT).
    fn set_pk(&mut self, value: Value);

    /// Returns the name of the primary key field (e.g., "id").
    fn pk_field_name() -> &'static str {
        "id"
    }

    /// Returns all attribute name-value pairs for this instance.
    ///
    /// Enumeration attributes report their in-memory value (a member,
    /// `Null`, or a not yet coerced primitive).
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Names of the attributes that were never loaded, such as those left
    /// out by [`QuerySet::only`](crate::query::queryset::QuerySet::only).
    ///
    /// Saving an instance with a primary key leaves these columns untouched.
    fn deferred_fields(&self) -> Vec<&'static str>;

    /// Returns field name-value pairs excluding the primary key.
    /// Used for INSERT operations where the PK is auto-generated.
    fn non_pk_field_values(&self) -> Vec<(&'static str, Value)> {
        let pk_name = Self::pk_field_name();
        self.field_values()
            .into_iter()
            .filter(|(name, _)| *name != pk_name)
            .collect()
    }

    /// Constructs a model instance from a database row.
    ///
    /// Columns missing from the row leave their attributes unloaded.
    fn from_row(row: &Row) -> OrmResult<Self>;

    /// The instance description used in error messages.
    fn instance_str(&self) -> String {
        let pk = self.pk().map_or_else(|| "None".to_string(), |pk| pk.to_string());
        format!("{} object ({pk})", Self::meta().object_name)
    }

    /// Adds this instance to an attribute error raised by one of its
    /// attributes. Other errors pass through.
    fn attribute_error(&self, err: OrmError) -> OrmError {
        err.on_instance(Self::meta().object_name, &self.instance_str())
    }
}

/// Metadata about a model.
#[derive(Debug)]
pub struct ModelMeta {
    /// The application label (e.g., "shop").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g., "paint").
    pub model_name: String,
    /// The class-style model name (e.g., "Paint").
    pub object_name: &'static str,
    /// The database table name.
    pub db_table: String,
    /// Human-readable singular name.
    pub verbose_name: String,
    /// Field definitions for this model, in column order.
    pub fields: Vec<&'static dyn Field>,
}

/// A filter or projection path resolved against a model.
#[derive(Debug, Clone)]
pub struct ResolvedPath<'p> {
    /// The field the path starts at.
    pub field: &'static dyn Field,
    /// The column wrapped in every transform named by the path.
    pub expression: Expression,
    /// The trailing lookup name, if the path ends with one.
    pub lookup: Option<&'p str>,
}

impl ModelMeta {
    /// Builds metadata with the conventional `{app_label}_{model_name}`
    /// table name.
    pub fn new(
        app_label: &'static str,
        object_name: &'static str,
        fields: Vec<&'static dyn Field>,
    ) -> Self {
        let model_name = object_name.to_lowercase();
        Self {
            app_label,
            db_table: format!("{app_label}_{model_name}"),
            verbose_name: model_name.clone(),
            model_name,
            object_name,
            fields,
        }
    }

    /// The `app_label.model_name` label used by serializers.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Looks a field up by attribute name.
    pub fn field(&self, name: &str) -> Option<&'static dyn Field> {
        self.fields.iter().copied().find(|f| f.name() == name)
    }

    /// Looks a field up by attribute name.
    ///
    /// # Errors
    ///
    /// [`OrmError::FieldDoesNotExist`] if the model has no such field.
    pub fn get_field(&self, name: &str) -> OrmResult<&'static dyn Field> {
        self.field(name).ok_or_else(|| {
            OrmError::FieldDoesNotExist(format!("{} has no field named '{name}'", self.object_name))
        })
    }

    /// Looks an enumeration field up by attribute name.
    ///
    /// # Errors
    ///
    /// [`OrmError::FieldDoesNotExist`] if the field is missing or is not a
    /// [`ChoiceField`].
    pub fn choice_field(&self, name: &str) -> OrmResult<&'static ChoiceField> {
        self.get_field(name)?.as_choice().ok_or_else(|| {
            OrmError::FieldDoesNotExist(format!(
                "{}.{name} is not an enumeration field",
                self.object_name
            ))
        })
    }

    /// The primary key field, if one is declared.
    pub fn pk_field(&self) -> Option<&'static dyn Field> {
        self.fields.iter().copied().find(|f| f.def().primary_key)
    }

    /// Resolves `field__transform__lookup` paths.
    ///
    /// # Errors
    ///
    /// [`OrmError::FieldDoesNotExist`] if the field is unknown or anything
    /// follows the lookup name.
    pub fn resolve_path<'p>(&self, path: &'p str) -> OrmResult<ResolvedPath<'p>> {
        let segments: Vec<&'p str> = path.split("__").collect();
        let (name, rest) = segments
            .split_first()
            .ok_or_else(|| OrmError::FieldDoesNotExist(path.to_string()))?;
        let field = self.get_field(name)?;

        let (transforms, lookup) = field.lookups().resolve_chain(rest);
        if lookup.is_some() && transforms.len() + 1 != rest.len() {
            return Err(OrmError::FieldDoesNotExist(format!(
                "Cannot resolve '{path}': nothing may follow a lookup"
            )));
        }

        let expression = transforms
            .into_iter()
            .fold(Expression::col(field.column()), Expression::transformed);
        Ok(ResolvedPath {
            field,
            expression,
            lookup,
        })
    }
}
