//! `#[derive(Choices)]` implementation.
//!
//! This module generates a static `EnumDef` for a fieldless enum, an
//! implementation of `choicefield_db::enums::Choices` over it, and a
//! `From<Enum> for Value` conversion.

use darling::{FromDeriveInput, FromVariant};
use proc_macro2::{Literal, TokenStream};
use quote::quote;
use syn::DeriveInput;

use crate::literal::ChoiceValue;

/// Enum-level attributes parsed from `#[choices(...)]`.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(choices), supports(enum_unit))]
pub struct ChoicesOpts {
    pub ident: syn::Ident,
    pub data: darling::ast::Data<ChoiceOpts, ()>,

    /// The enumeration name; defaults to the type name.
    #[darling(default)]
    pub name: Option<String>,

    /// Whether variants carry display labels.
    #[darling(default)]
    pub labelled: bool,

    /// Path to the ORM crate.
    #[darling(default, rename = "crate")]
    pub krate: Option<syn::Path>,
}

/// Per-variant attributes parsed from `#[choice(...)]`.
#[derive(Debug, FromVariant)]
#[darling(attributes(choice))]
pub struct ChoiceOpts {
    pub ident: syn::Ident,

    /// The stored primitive.
    pub value: ChoiceValue,

    /// Display label.
    #[darling(default)]
    pub label: Option<String>,

    /// Member name override.
    #[darling(default)]
    pub name: Option<String>,
}

/// `InProgress` -> `IN_PROGRESS`, `HTTPError` -> `HTTP_ERROR`.
pub fn upper_snake(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Generates the `Choices` implementation for the given derive input.
pub fn derive_choices_impl(input: DeriveInput) -> TokenStream {
    let opts = match ChoicesOpts::from_derive_input(&input) {
        Ok(o) => o,
        Err(e) => return e.write_errors(),
    };

    let enum_name = &opts.ident;
    let name = opts.name.clone().unwrap_or_else(|| enum_name.to_string());
    let labelled = opts.labelled;
    let krate = opts
        .krate
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::choicefield_db));

    let variants = match opts.data.as_ref().take_enum() {
        Some(variants) => variants,
        None => {
            return darling::Error::unsupported_shape("struct")
                .with_span(&input.ident)
                .write_errors()
        }
    };

    let mut errors = darling::Error::accumulator();
    for variant in &variants {
        if variant.label.is_some() && !labelled {
            errors.push(
                darling::Error::custom("`label` requires #[choices(labelled)] on the enum")
                    .with_span(&variant.ident),
            );
        }
    }
    if let Err(e) = errors.finish() {
        return e.write_errors();
    }

    let member_tokens: Vec<TokenStream> = variants
        .iter()
        .map(|v| {
            let member_name = v
                .name
                .clone()
                .unwrap_or_else(|| upper_snake(&v.ident.to_string()));
            let value = v.value.to_tokens(&krate);
            let label = match &v.label {
                Some(label) => quote! { ::core::option::Option::Some(#label) },
                None => quote! { ::core::option::Option::None },
            };
            quote! {
                #krate::enums::MemberDef { name: #member_name, value: #value, label: #label }
            }
        })
        .collect();

    let idents: Vec<&syn::Ident> = variants.iter().map(|v| &v.ident).collect();
    let indices: Vec<Literal> = (0..variants.len()).map(Literal::usize_unsuffixed).collect();

    quote! {
        impl #krate::enums::Choices for #enum_name {
            fn definition() -> &'static #krate::enums::EnumDef {
                static DEFINITION: #krate::enums::EnumDef = #krate::enums::EnumDef {
                    name: #name,
                    members: &[#(#member_tokens),*],
                    labelled: #labelled,
                };
                &DEFINITION
            }

            fn index(self) -> usize {
                match self {
                    #(Self::#idents => #indices,)*
                }
            }

            fn from_index(index: usize) -> ::core::option::Option<Self> {
                match index {
                    #(#indices => ::core::option::Option::Some(Self::#idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::core::convert::From<#enum_name> for #krate::value::Value {
            fn from(choice: #enum_name) -> Self {
                Self::Enum(#krate::enums::Choices::member(choice))
            }
        }
    }
}
