//! Parsing of `#[choice(value = ...)]` expressions.
//!
//! Darling hands the value over as a `syn::Expr`. Integer, string, float,
//! and boolean literals (optionally negated) are accepted, as are arrays of
//! them; the last three kinds compile but are rejected when a field is
//! built over the enumeration.

use darling::FromMeta;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, Lit, UnOp};

/// A literal member value, ready to be emitted as a `Literal` constructor.
#[derive(Debug, Clone)]
pub enum ChoiceValue {
    Int(i64),
    Str(String),
    Float(f64),
    Bool(bool),
    List(Vec<ChoiceValue>),
}

impl ChoiceValue {
    fn from_lit(lit: &Lit, negate: bool) -> darling::Result<Self> {
        match lit {
            Lit::Int(int) => {
                let value: i64 = int.base10_parse()?;
                Ok(Self::Int(if negate { -value } else { value }))
            }
            Lit::Float(float) => {
                let value: f64 = float.base10_parse()?;
                Ok(Self::Float(if negate { -value } else { value }))
            }
            Lit::Str(s) if !negate => Ok(Self::Str(s.value())),
            Lit::Bool(b) if !negate => Ok(Self::Bool(b.value)),
            _ => Err(darling::Error::unexpected_lit_type(lit)),
        }
    }

    /// Emits `#krate::enums::Literal::...`.
    pub fn to_tokens(&self, krate: &syn::Path) -> TokenStream {
        match self {
            Self::Int(i) if *i < 0 => {
                let magnitude = i.unsigned_abs();
                quote! { #krate::enums::Literal::Int((#magnitude as i64).wrapping_neg()) }
            }
            Self::Int(i) => quote! { #krate::enums::Literal::Int(#i) },
            Self::Str(s) => quote! { #krate::enums::Literal::Str(#s) },
            Self::Float(f) if f.is_sign_negative() => {
                let magnitude = f.abs();
                quote! { #krate::enums::Literal::Float(-#magnitude) }
            }
            Self::Float(f) => quote! { #krate::enums::Literal::Float(#f) },
            Self::Bool(b) => quote! { #krate::enums::Literal::Bool(#b) },
            Self::List(items) => {
                let items = items.iter().map(|item| item.to_tokens(krate));
                quote! { #krate::enums::Literal::List(&[#(#items),*]) }
            }
        }
    }
}

impl FromMeta for ChoiceValue {
    fn from_expr(expr: &Expr) -> darling::Result<Self> {
        match expr {
            Expr::Lit(lit) => Self::from_lit(&lit.lit, false),
            Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match &*unary.expr {
                Expr::Lit(lit) => Self::from_lit(&lit.lit, true),
                other => Err(darling::Error::unexpected_expr_type(other)),
            },
            Expr::Array(array) => array
                .elems
                .iter()
                .map(Self::from_expr)
                .collect::<darling::Result<Vec<_>>>()
                .map(Self::List),
            Expr::Group(group) => Self::from_expr(&group.expr),
            Expr::Paren(paren) => Self::from_expr(&paren.expr),
            _ => Err(darling::Error::unexpected_expr_type(expr)),
        }
        .map_err(|e| e.with_span(expr))
    }

    fn from_value(lit: &Lit) -> darling::Result<Self> {
        Self::from_lit(lit, false)
    }
}
