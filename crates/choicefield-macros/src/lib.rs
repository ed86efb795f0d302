//! # choicefield-macros
//!
//! Procedural macros for choicefield. Provides `#[derive(Choices)]`, which
//! turns a fieldless Rust enum into a static enumeration definition usable
//! by `ChoiceField`.
//!
//! This crate is independent of all other choicefield crates because
//! proc-macro crates cannot depend on crates that use them. Generated code
//! refers to `::choicefield_db` unless `#[choices(crate = "...")]` names
//! another path.

mod choices;
mod literal;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `choicefield_db::enums::Choices` for a fieldless enum.
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
///
/// Enum-level options (`#[choices(...)]`):
///
/// - `name = "..."` - the enumeration name used in messages (defaults to the type name)
/// - `labelled` - the variants carry display labels
/// - `crate = "..."` - path to the `choicefield_db` crate
///
/// Variant options (`#[choice(...)]`):
///
/// - `value = ...` - the stored primitive (required)
/// - `label = "..."` - the display label (requires `labelled`)
/// - `name = "..."` - the member name (defaults to the variant in `UPPER_SNAKE` case)
#[proc_macro_derive(Choices, attributes(choices, choice))]
pub fn derive_choices(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    choices::derive_choices_impl(input).into()
}
