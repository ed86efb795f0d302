//! Fixture serialization for model instances.
//!
//! Instances are written as `{"model": "app.model", "pk": .., "fields": {..}}`
//! objects. Each value goes through the field's
//! [`value_to_string`](crate::fields::Field::value_to_string), so enumeration
//! members are stored as their primitives; loading feeds the primitives back
//! through a [`Row`] and [`Model::from_row`].
//!
//! ## Serializers
//!
//! - [`JsonSerializer`] - Compact JSON serialization
//! - [`PrettyJsonSerializer`] - Pretty-printed JSON serialization

use choicefield_core::error::{OrmError, OrmResult};

use crate::model::{Model, Row};
use crate::value::Value;

/// A serializer for converting fixture objects to and from strings.
pub trait Serializer: Send + Sync {
    /// Serializes a slice of JSON objects into a string.
    fn serialize(&self, objects: &[serde_json::Value]) -> OrmResult<String>;

    /// Deserializes a string into a vector of JSON objects.
    fn deserialize(&self, data: &str) -> OrmResult<Vec<serde_json::Value>>;
}

/// Compact JSON serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, objects: &[serde_json::Value]) -> OrmResult<String> {
        serde_json::to_string(objects).map_err(|e| OrmError::SerializationError(e.to_string()))
    }

    fn deserialize(&self, data: &str) -> OrmResult<Vec<serde_json::Value>> {
        serde_json::from_str(data).map_err(|e| OrmError::SerializationError(e.to_string()))
    }
}

/// Pretty-printed JSON serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonSerializer;

impl Serializer for PrettyJsonSerializer {
    fn serialize(&self, objects: &[serde_json::Value]) -> OrmResult<String> {
        serde_json::to_string_pretty(objects)
            .map_err(|e| OrmError::SerializationError(e.to_string()))
    }

    fn deserialize(&self, data: &str) -> OrmResult<Vec<serde_json::Value>> {
        serde_json::from_str(data).map_err(|e| OrmError::SerializationError(e.to_string()))
    }
}

/// Converts one instance into its fixture object.
///
/// # Errors
///
/// Fails if an attribute holds a value its field rejects.
pub fn to_fixture<M: Model>(instance: &M) -> OrmResult<serde_json::Value> {
    let meta = M::meta();
    let mut fields = serde_json::Map::new();
    for (name, value) in instance.non_pk_field_values() {
        let field = meta.get_field(name)?;
        fields.insert(name.to_string(), field.value_to_string(value)?.to_json());
    }
    Ok(serde_json::json!({
        "model": meta.label(),
        "pk": instance.pk().unwrap_or(Value::Null).to_json(),
        "fields": fields,
    }))
}

/// Rebuilds an instance from a fixture object.
///
/// # Errors
///
/// [`OrmError::SerializationError`] if the object is malformed or belongs to
/// another model; otherwise whatever [`Model::from_row`] reports.
pub fn from_fixture<M: Model>(object: &serde_json::Value) -> OrmResult<M> {
    let meta = M::meta();
    let label = object.get("model").and_then(serde_json::Value::as_str);
    if label != Some(meta.label().as_str()) {
        return Err(OrmError::SerializationError(format!(
            "Expected an object of model '{}', got {}",
            meta.label(),
            label.unwrap_or("none")
        )));
    }
    let fields = object
        .get("fields")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| OrmError::SerializationError("Missing 'fields' object".to_string()))?;

    let mut columns = Vec::new();
    let mut values = Vec::new();
    if let Some(pk) = meta.pk_field() {
        columns.push(pk.column().to_string());
        values.push(object.get("pk").map_or(Value::Null, Value::from_json));
    }
    for (name, json) in fields {
        let field = meta.get_field(name)?;
        columns.push(field.column().to_string());
        values.push(Value::from_json(json));
    }
    M::from_row(&Row::new(columns, values))
}

/// Serializes instances with `serializer`.
pub fn serialize<M: Model>(serializer: &dyn Serializer, instances: &[M]) -> OrmResult<String> {
    let objects = instances.iter().map(to_fixture).collect::<OrmResult<Vec<_>>>()?;
    serializer.serialize(&objects)
}

/// Deserializes instances with `serializer`.
pub fn deserialize<M: Model>(serializer: &dyn Serializer, data: &str) -> OrmResult<Vec<M>> {
    serializer.deserialize(data)?.iter().map(from_fixture).collect()
}
