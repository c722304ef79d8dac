//! Derive macro for rowforge entity field registration.
//!
//! This crate provides the `#[derive(Entity)]` macro that generates an
//! entity's static field table and value accessors, replacing any form
//! of runtime type inspection.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Type, parse_macro_input};

/// Derives the `Entity` trait for a struct.
///
/// # Attributes
///
/// - `#[entity(table = "table_name")]` - Specifies the default table
///   name (optional, defaults to snake_case of the struct name)
///
/// # Field Attributes
///
/// - `#[field(primary_key)]` - Marks the field as (part of) the primary key
/// - `#[field(ignore)]` - Excludes the field from persistence
/// - `#[field(blob)]` - Binds the field as a binary large object
/// - `#[field(clob)]` - Binds the field as a character large object
/// - `#[field(json)]` - Binds the field as a JSON document column
/// - `#[field(column = "column_name")]` - Overrides the convention-derived
///   column name
///
/// # Example
///
/// ```ignore
/// use rowforge_derive::Entity;
///
/// #[derive(Entity)]
/// #[entity(table = "customers")]
/// struct Customer {
///     #[field(primary_key)]
///     id: Option<i64>,
///     first_name: String,
///     #[field(json)]
///     settings: serde_json::Value,
///     #[field(ignore)]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, field))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_entity_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_entity_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity derive only supports structs",
            ));
        }
    };

    // Collect field information
    let mut field_infos: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let field_name = field.ident.as_ref().unwrap();
        let attrs = parse_field_attrs(&field.attrs)?;

        field_infos.push(FieldInfo {
            name: field_name.clone(),
            ty: field.ty.clone(),
            column: attrs.column,
            primary_key: attrs.primary_key,
            ignore: attrs.ignore,
            lob: attrs.lob,
        });
    }

    if !field_infos
        .iter()
        .any(|f| f.primary_key && !f.ignore)
    {
        return Err(syn::Error::new_spanned(
            struct_name,
            "Entity derive requires at least one #[field(primary_key)] field",
        ));
    }

    // Generate the static field table
    let specs: Vec<TokenStream2> = field_infos
        .iter()
        .map(|info| {
            let name = info.name.to_string();
            let column = match &info.column {
                Some(c) => quote! { ::core::option::Option::Some(#c) },
                None => quote! { ::core::option::Option::None },
            };
            let primary_key = info.primary_key;
            let ignore = info.ignore;
            let lob = match info.lob {
                LobAttr::None => quote! { ::rowforge_core::param::LobKind::None },
                LobAttr::Blob => quote! { ::rowforge_core::param::LobKind::Blob },
                LobAttr::Clob => quote! { ::rowforge_core::param::LobKind::Clob },
                LobAttr::Json => quote! { ::rowforge_core::param::LobKind::Json },
            };

            quote! {
                ::rowforge_core::schema::FieldSpec {
                    name: #name,
                    column: #column,
                    primary_key: #primary_key,
                    ignore: #ignore,
                    lob: #lob,
                }
            }
        })
        .collect();

    // Generate value accessor arms for persistable fields
    let value_arms: Vec<TokenStream2> = field_infos
        .iter()
        .filter(|info| !info.ignore)
        .map(|info| {
            let name = info.name.to_string();
            let ident = &info.name;
            quote! {
                #name => ::rowforge_core::value::ToSqlValue::to_sql_value(self.#ident.clone()),
            }
        })
        .collect();

    // Generate key write-back arms for primary-key fields
    let pk_arms: Vec<TokenStream2> = field_infos
        .iter()
        .filter(|info| info.primary_key && !info.ignore)
        .map(|info| {
            let name = info.name.to_string();
            let ident = &info.name;
            let ty = &info.ty;
            quote! {
                #name => {
                    self.#ident =
                        <#ty as ::rowforge_core::value::FromSqlValue>::from_sql_value(value)?;
                    ::core::result::Result::Ok(())
                }
            }
        })
        .collect();

    let expanded = quote! {
        impl ::rowforge_core::schema::Entity for #struct_name {
            const TABLE: &'static str = #table_name;

            const FIELDS: &'static [::rowforge_core::schema::FieldSpec] = &[
                #(#specs),*
            ];

            fn value_of(&self, field: &str) -> ::rowforge_core::value::SqlValue {
                match field {
                    #(#value_arms)*
                    _ => ::rowforge_core::value::SqlValue::Null,
                }
            }

            fn write_pk(
                &mut self,
                field: &str,
                value: &::rowforge_core::value::SqlValue,
            ) -> ::rowforge_core::error::Result<()> {
                match field {
                    #(#pk_arms)*
                    other => ::core::result::Result::Err(
                        ::rowforge_core::error::CoreError::UnknownField {
                            field: other.to_string(),
                        },
                    ),
                }
            }
        }
    };

    Ok(expanded)
}

struct FieldInfo {
    name: Ident,
    ty: Type,
    column: Option<String>,
    primary_key: bool,
    ignore: bool,
    lob: LobAttr,
}

#[derive(Clone, Copy)]
enum LobAttr {
    None,
    Blob,
    Clob,
    Json,
}

struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    ignore: bool,
    lob: LobAttr,
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("entity") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(lit) = value {
                        if let Lit::Str(s) = lit.lit {
                            table_name = Some(s.value());
                        }
                    }
                }
                Ok(())
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    // Default to snake_case of struct name
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs {
        column: None,
        primary_key: false,
        ignore: false,
        lob: LobAttr::None,
    };

    for attr in attrs {
        if attr.path().is_ident("field") {
            // Handle empty attribute like #[field]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("ignore") {
                    result.ignore = true;
                } else if meta.path.is_ident("blob") {
                    result.lob = LobAttr::Blob;
                } else if meta.path.is_ident("clob") {
                    result.lob = LobAttr::Clob;
                } else if meta.path.is_ident("json") {
                    result.lob = LobAttr::Json;
                } else if meta.path.is_ident("column") {
                    let value: Expr = meta.value()?.parse()?;
                    if let Expr::Lit(lit) = value {
                        if let Lit::Str(s) = lit.lit {
                            result.column = Some(s.value());
                        }
                    }
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
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
