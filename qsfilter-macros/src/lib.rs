use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Error, Fields, GenericArgument, LitStr, PathArguments, Result, Type, TypePath,
    parse_macro_input, spanned::Spanned,
};

mod schema_derive;

/// Derive `DeclaredSchema` and `FilterTarget` for a struct with named fields.
///
/// Field attributes:
/// - `#[filter(filterable)]`, `#[filter(sortable)]`: expose the field to clients.
/// - `#[filter(rename = "name")]`: declare the field under another name; the
///   struct field becomes its source attribute.
/// - `#[filter(kind = "numeric")]`: override the kind inferred from the type.
/// - `#[filter(skip)]`: leave the field out of the schema.
///
/// Computed fields are declared on the struct:
/// `#[filter(computed(name = "comment_count", kind = "numeric"))]`.
///
/// ```text
/// #[derive(FilterSchema)]
/// #[filter(computed(name = "comment_count", kind = "numeric"))]
/// struct Node {
///     #[filter(filterable, sortable)]
///     title: String,
///     #[filter(filterable, sortable, rename = "date_created")]
///     created: DateTime<Utc>,
///     description: String,
/// }
/// ```
#[proc_macro_derive(FilterSchema, attributes(filter))]
pub fn derive_filter_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match schema_derive::ParsedSchema::from_input(&input) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
