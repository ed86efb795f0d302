//! Query lookups and Q objects for building complex filters.
//!
//! This module provides the [`Lookup`] enum for field-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators.
//!
//! Lookup values may be enumeration members or plain primitives; the field
//! named by the filter path converts them before compilation.
//!
//! # Examples
//!
//! ```
//! use choicefield_db::query::lookups::{Q, Lookup};
//! use choicefield_db::value::Value;
//!
//! // int_choice = 1
//! let q = Q::filter("int_choice", Lookup::Exact(Value::from(1)));
//!
//! // int_choice = 1 OR text_choice = 'SECOND'
//! let either = q | Q::filter("text_choice", Lookup::Exact(Value::from("SECOND")));
//!
//! // NOT(choice IS NULL)
//! let negated = !Q::filter("choice", Lookup::IsNull(true));
//! ```

use std::ops;

use crate::enums::EnumDef;
use crate::value::Value;

/// A field-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`field = value`, or `IS NULL` for a null value).
    Exact(Value),
    /// Membership test (`field IN (values...)`).
    In(Vec<Value>),
    /// Greater than (`field > value`).
    Gt(Value),
    /// Less than (`field < value`).
    Lt(Value),
    /// NULL test (`field IS NULL` or `field IS NOT NULL`).
    IsNull(bool),
}

impl Lookup {
    /// Membership in every member of `def`.
    pub fn in_members(def: &'static EnumDef) -> Self {
        Self::In(def.iter().map(Value::Enum).collect())
    }

    /// The lookup name as written in a filter path.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exact(_) => "exact",
            Self::In(_) => "in",
            Self::Gt(_) => "gt",
            Self::Lt(_) => "lt",
            Self::IsNull(_) => "isnull",
        }
    }

    /// Applies `f` to every value carried by the lookup.
    pub(crate) fn try_map_values<E>(
        self,
        mut f: impl FnMut(Value) -> Result<Value, E>,
    ) -> Result<Self, E> {
        Ok(match self {
            Self::Exact(v) => Self::Exact(f(v)?),
            Self::In(vs) => Self::In(vs.into_iter().map(f).collect::<Result<_, _>>()?),
            Self::Gt(v) => Self::Gt(f(v)?),
            Self::Lt(v) => Self::Lt(f(v)?),
            Self::IsNull(b) => Self::IsNull(b),
        })
    }
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT)
/// operators to build arbitrarily complex WHERE clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field path (e.g. `color` or `color__raw`).
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND/OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
