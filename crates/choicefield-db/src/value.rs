//! ORM value types for representing database values in a backend-agnostic way.
//!
//! The [`Value`] enum is the core type used throughout the ORM to represent
//! field values, query parameters, and results. Besides the usual SQL scalars
//! it carries [`Value::Enum`], the erased form of a resolved enumeration
//! member, which fields unwrap to its primitive before anything reaches a
//! database backend.

use std::fmt;

use crate::enums::Member;

/// A backend-agnostic representation of a database value.
///
/// # Examples
///
/// ```
/// use choicefield_db::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// SQL NULL.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// Raw binary data.
    Bytes(Vec<u8>),
    /// A JSON value.
    Json(serde_json::Value),
    /// A list of values (for IN clauses).
    List(Vec<Value>),
    /// A resolved enumeration member. Serializes as its primitive value.
    #[serde(skip_deserializing)]
    Enum(Member),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Json(j) => write!(f, "{j}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Enum(member) => write!(f, "{member}"),
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Member> for Value {
    fn from(v: Member) -> Self {
        Self::Enum(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Self::Null,
        }
    }
}

impl Value {
    /// Returns `true` if this value is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to extract an integer value.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract an enumeration member.
    pub const fn as_member(&self) -> Option<Member> {
        match self {
            Self::Enum(m) => Some(*m),
            _ => None,
        }
    }

    /// Returns `true` for the values a field treats as "empty" when checking
    /// `blank` (NULL, the empty string, an empty list).
    pub fn is_empty_value(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(l) => l.is_empty(),
            _ => false,
        }
    }

    /// Replaces an enumeration member by its primitive value; anything else
    /// is returned unchanged.
    #[must_use]
    pub fn into_primitive(self) -> Self {
        match self {
            Self::Enum(member) => member.value(),
            other => other,
        }
    }

    /// The short type name used in conversion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "dict",
            Self::List(_) => "list",
            Self::Enum(member) => member.definition().name,
        }
    }

    /// Renders the value the way it is quoted inside error messages:
    /// strings single-quoted, numbers bare, NULL as `None`.
    ///
    /// ```
    /// use choicefield_db::value::Value;
    ///
    /// assert_eq!(Value::from("THIRD").repr(), "'THIRD'");
    /// assert_eq!(Value::from(3).repr(), "3");
    /// assert_eq!(Value::Null.repr(), "None");
    /// ```
    pub fn repr(&self) -> String {
        match self {
            Self::Null => "None".to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => float_repr(*f),
            Self::String(s) => quote(s),
            Self::Bytes(b) => format!("b{}", quote(&String::from_utf8_lossy(b))),
            Self::Json(j) => j.to_string(),
            Self::List(vals) => {
                let inner: Vec<String> = vals.iter().map(Self::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Enum(member) => format!("{member:?}"),
        }
    }

    /// Converts this value into JSON for fixtures and field specifications.
    ///
    /// Enumeration members become their primitive value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::json!(i),
            Self::Float(f) => serde_json::json!(f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::String(String::from_utf8_lossy(b).into_owned()),
            Self::Json(j) => j.clone(),
            Self::List(vals) => serde_json::Value::Array(vals.iter().map(Self::to_json).collect()),
            Self::Enum(member) => member.value().to_json(),
        }
    }

    /// Converts plain JSON into a value. Objects are kept as [`Value::Json`].
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(_) => Self::Json(json.clone()),
        }
    }
}

/// Quotes a string with single quotes, switching to double quotes when the
/// string itself contains a single quote.
fn quote(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        format!("\"{s}\"")
    } else {
        format!("'{}'", s.replace('\'', "\\'"))
    }
}

/// Formats a float keeping a trailing `.0` on integral values.
pub(crate) fn float_repr(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let s = if f > 0.0 { "inf" } else { "-inf" };
        s.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}
