//! Statically declared enumerations.
//!
//! An [`EnumDef`] is the table a [`ChoiceField`](crate::fields::ChoiceField)
//! is built from: an ordered list of named members, each bound to one
//! primitive [`Literal`] and optionally to a display label. Members are
//! addressed by [`Member`], a copyable handle whose identity is the
//! definition's address plus the member's position.
//!
//! Rust enums opt in by implementing [`Choices`], normally through
//! `#[derive(Choices)]` from `choicefield-macros`.
//!
//! ```
//! use choicefield_db::enums::{EnumDef, Literal, MemberDef};
//!
//! static COLOR: EnumDef = EnumDef {
//!     name: "Color",
//!     members: &[
//!         MemberDef { name: "RED", value: Literal::Int(1), label: None },
//!         MemberDef { name: "GREEN", value: Literal::Int(2), label: None },
//!     ],
//!     labelled: false,
//! };
//!
//! let red = COLOR.find_by_name("RED").unwrap();
//! assert_eq!(red.to_string(), "Color.RED");
//! assert_eq!(COLOR.find_by_literal(&Literal::Int(2)).unwrap().name(), "GREEN");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ptr;

use crate::value::Value;

/// A primitive value bound to an enumeration member.
///
/// Only `Int` and `Str` can back a column; the other kinds exist so that
/// unsupported enumerations can be described and rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// An integer value.
    Int(i64),
    /// A text value.
    Str(&'static str),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A list value.
    List(&'static [Literal]),
}

impl Literal {
    /// The type name reported when the literal kind is not supported.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
        }
    }

    /// Converts the literal into a [`Value`].
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::Int(*i),
            Self::Str(s) => Value::String((*s).to_string()),
            Self::Float(f) => Value::Float(*f),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => Value::List(items.iter().map(Self::to_value).collect()),
        }
    }

    /// Returns `true` if `value` is the primitive this literal denotes.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Int(a), Value::Int(b)) => a == b,
            (Self::Str(a), Value::String(b)) => *a == b.as_str(),
            (Self::Float(a), Value::Float(b)) => a == b,
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::List(_), Value::List(_)) => self.to_value() == *value,
            _ => false,
        }
    }
}

/// One declared member of an enumeration.
#[derive(Debug)]
pub struct MemberDef {
    /// The member name (e.g. `RED`).
    pub name: &'static str,
    /// The primitive value stored in the database.
    pub value: Literal,
    /// The display label, if the enumeration carries labels.
    pub label: Option<&'static str>,
}

/// A statically declared enumeration.
#[derive(Debug)]
pub struct EnumDef {
    /// The qualified name used in messages and field specifications
    /// (e.g. `Color`, `InlinedModel.InlinedEnum`).
    pub name: &'static str,
    /// The members, in declaration order.
    pub members: &'static [MemberDef],
    /// Whether the enumeration carries its own display labels.
    pub labelled: bool,
}

impl EnumDef {
    /// Returns the member handle at `index`.
    pub fn member(&'static self, index: usize) -> Option<Member> {
        (index < self.members.len()).then_some(Member { def: self, index })
    }

    /// Iterates over all members in declaration order.
    pub fn iter(&'static self) -> impl Iterator<Item = Member> {
        (0..self.members.len()).map(move |index| Member { def: self, index })
    }

    /// Returns the number of members.
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the enumeration declares no members.
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Finds the member whose value equals `literal`.
    pub fn find_by_literal(&'static self, literal: &Literal) -> Option<Member> {
        self.iter().find(|m| m.literal() == *literal)
    }

    /// Finds the member whose value equals the primitive `value`.
    pub fn find_by_value(&'static self, value: &Value) -> Option<Member> {
        self.iter().find(|m| m.literal().matches(value))
    }

    /// Finds a member by name.
    pub fn find_by_name(&'static self, name: &str) -> Option<Member> {
        self.iter().find(|m| m.name() == name)
    }

    /// The type name of the first member's value, or `NoneType` for an
    /// empty enumeration.
    pub fn value_type_name(&self) -> &'static str {
        self.members
            .first()
            .map_or("NoneType", |m| m.value.type_name())
    }

    /// Returns the primitive values of all members.
    pub fn values(&'static self) -> Vec<Value> {
        self.iter().map(|m| m.value()).collect()
    }
}

/// A handle to one member of a static [`EnumDef`].
///
/// Two handles are equal only if they point into the same definition at the
/// same position, so members of different enumerations never compare equal
/// even when their primitive values coincide.
#[derive(Clone, Copy)]
pub struct Member {
    def: &'static EnumDef,
    index: usize,
}

impl Member {
    /// The enumeration this member belongs to.
    pub const fn definition(&self) -> &'static EnumDef {
        self.def
    }

    /// The member's position in its enumeration.
    pub const fn index(&self) -> usize {
        self.index
    }

    fn declared(&self) -> &'static MemberDef {
        &self.def.members[self.index]
    }

    /// The member name.
    pub fn name(&self) -> &'static str {
        self.declared().name
    }

    /// The member's literal value.
    pub fn literal(&self) -> Literal {
        self.declared().value
    }

    /// The member's primitive value.
    pub fn value(&self) -> Value {
        self.declared().value.to_value()
    }

    /// The display label: the declared label, otherwise the title-cased name.
    pub fn label(&self) -> String {
        self.declared()
            .label
            .map_or_else(|| title_case(self.name()), str::to_string)
    }

    /// Returns `true` if this member belongs to `def`.
    pub fn belongs_to(&self, def: &EnumDef) -> bool {
        ptr::eq(self.def, def)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.def, other.def) && self.index == other.index
    }
}

impl Eq for Member {}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.def.name, self.name())
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}: {}>", self.def.name, self.name(), self.value().repr())
    }
}

impl serde::Serialize for Member {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// `"IN_PROGRESS"` -> `"In Progress"`.
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A Rust enum backed by a static [`EnumDef`].
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Choices)]
/// #[choices(labelled)]
/// enum IntChoice {
///     #[choice(value = 1, label = "one")]
///     One,
///     #[choice(value = 2, label = "two")]
///     Two,
/// }
/// ```
pub trait Choices: Copy + 'static {
    /// The static definition of this enumeration.
    fn definition() -> &'static EnumDef;

    /// The position of `self` in the definition.
    fn index(self) -> usize;

    /// The variant at `index`.
    fn from_index(index: usize) -> Option<Self>;

    /// The erased member handle for `self`.
    fn member(self) -> Member {
        Member {
            def: Self::definition(),
            index: self.index(),
        }
    }

    /// Recovers the variant from a member of this enumeration.
    fn from_member(member: Member) -> Option<Self> {
        if member.belongs_to(Self::definition()) {
            Self::from_index(member.index())
        } else {
            None
        }
    }

    /// `self` as a [`Value::Enum`].
    fn to_value(self) -> Value {
        Value::Enum(self.member())
    }
}

/// Resolves enumeration names back to their definitions.
///
/// Used when rebuilding a field from its serialized specification, where
/// the enumeration is referenced by name.
#[derive(Debug, Default, Clone)]
pub struct EnumRegistry {
    enums: HashMap<&'static str, &'static EnumDef>,
}

impl EnumRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its name, replacing any previous one.
    pub fn register(&mut self, def: &'static EnumDef) {
        self.enums.insert(def.name, def);
    }

    /// Registers the definition behind a [`Choices`] type.
    pub fn register_choices<E: Choices>(&mut self) {
        self.register(E::definition());
    }

    /// Looks a definition up by name.
    pub fn get(&self, name: &str) -> Option<&'static EnumDef> {
        self.enums.get(name).copied()
    }

    /// Returns the number of registered enumerations.
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}
