//! Derive macro for oxide-record models.
//!
//! This crate provides `#[derive(Model)]`, which wires a struct holding a
//! `Record` to its table and primary key.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Member, parse_macro_input};

/// Derives `oxide_record::Model` for a struct.
///
/// # Attributes
///
/// - `#[model(table = "table_name")]` - SQL table name (optional, defaults to
///   snake_case of the struct name)
/// - `#[model(primary_key = "column")]` - primary key column (optional,
///   defaults to `id`)
/// - `#[model(hooks)]` - the struct implements `Hooks` itself; without it an
///   empty `Hooks` impl is generated
///
/// # Field Attributes
///
/// - `#[record]` - marks the `Record` field. A field named `record` is used
///   when no field is marked.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, Model)]
/// #[model(table = "blog_posts", primary_key = "post_id")]
/// struct Post {
///     #[record]
///     data: Record,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model, record))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_model_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_model_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let attrs = parse_model_attrs(&input.attrs, struct_name)?;
    let record = find_record_field(input)?;

    let table = &attrs.table;
    let primary_key = &attrs.primary_key;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let hooks_impl = if attrs.hooks {
        quote! {}
    } else {
        quote! {
            impl #impl_generics ::oxide_record::Hooks for #struct_name #ty_generics #where_clause {}
        }
    };

    Ok(quote! {
        impl #impl_generics ::oxide_record::Model for #struct_name #ty_generics #where_clause {
            fn definition() -> ::oxide_record::ResourceDefinition {
                ::oxide_record::ResourceDefinition::new(#table, #primary_key)
            }

            fn record(&self) -> &::oxide_record::Record {
                &self.#record
            }

            fn record_mut(&mut self) -> &mut ::oxide_record::Record {
                &mut self.#record
            }
        }

        #hooks_impl
    })
}

struct ModelAttrs {
    table: String,
    primary_key: String,
    hooks: bool,
}

fn parse_model_attrs(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<ModelAttrs> {
    let mut result = ModelAttrs {
        table: to_snake_case(&struct_name.to_string()),
        primary_key: String::from("id"),
        hooks: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("model") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                result.table = parse_str_value(&meta)?;
            } else if meta.path.is_ident("primary_key") {
                result.primary_key = parse_str_value(&meta)?;
            } else if meta.path.is_ident("hooks") {
                result.hooks = true;
            } else {
                return Err(meta.error("expected `table`, `primary_key` or `hooks`"));
            }
            Ok(())
        })?;
    }

    if result.table.is_empty() {
        return Err(syn::Error::new_spanned(struct_name, "table name cannot be empty"));
    }
    if result.primary_key.is_empty() {
        return Err(syn::Error::new_spanned(struct_name, "primary key cannot be empty"));
    }
    Ok(result)
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = &value {
        if let Lit::Str(s) = &lit.lit {
            return Ok(s.value());
        }
    }
    Err(syn::Error::new_spanned(value, "expected a string literal"))
}

fn find_record_field(input: &DeriveInput) -> syn::Result<Member> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Model derive only supports structs",
        ));
    };

    let fields: Vec<(Member, &syn::Field)> = match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(|ident| (Member::Named(ident), f)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| (Member::from(i), f))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let marked: Vec<&Member> = fields
        .iter()
        .filter(|(_, f)| f.attrs.iter().any(|a| a.path().is_ident("record")))
        .map(|(member, _)| member)
        .collect();

    match marked.as_slice() {
        [member] => Ok((*member).clone()),
        [] => fields
            .iter()
            .find(|(member, _)| matches!(member, Member::Named(ident) if ident == "record"))
            .map(|(member, _)| member.clone())
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    input,
                    "Model derive needs a field named `record` or marked #[record]",
                )
            }),
        _ => Err(syn::Error::new_spanned(
            input,
            "only one field can be marked #[record]",
        )),
    }
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
