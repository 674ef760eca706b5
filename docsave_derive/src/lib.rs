use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input, spanned::Spanned};

/// Implements `docsave::Entity` for a struct.
///
/// The identifier is bound to the field marked `#[entity(id)]`, or else to a
/// field named `id` or `ID`. The field must be an integer type; conversions to
/// and from the store's `i64` identifiers are checked. Container options:
///
/// - `#[entity(kind = "...")]` overrides the kind derived from the type name
/// - `#[entity(before_save)]` / `#[entity(after_save)]` opt into the hooks;
///   the type must implement `docsave::BeforeSave` / `docsave::AfterSave`
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct EntityOptions {
    kind: Option<String>,
    before_save: bool,
    after_save: bool,
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;
    let options = parse_entity_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity can only be derived for structs",
            ));
        }
    };

    let id_field = match &data_struct.fields {
        Fields::Named(fields) => find_id_field(fields)?,
        Fields::Unnamed(fields) => {
            reject_id_markers(fields.unnamed.iter())?;
            None
        }
        Fields::Unit => None,
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let identity_methods = id_field.map(|IdField { ident, ty }| {
        let field_name = ident.to_string();
        let field_name = field_name.trim_start_matches("r#");
        quote! {
            fn identifier(&self) -> ::std::result::Result<i64, ::docsave::IdentifierError> {
                <i64 as ::std::convert::TryFrom<#ty>>::try_from(self.#ident).map_err(|_| {
                    ::docsave::IdentifierError::Unrepresentable {
                        type_name: ::std::any::type_name::<Self>(),
                        field: #field_name,
                        value: ::std::string::ToString::to_string(&self.#ident),
                    }
                })
            }

            fn set_identifier(
                &mut self,
                id: i64,
            ) -> ::std::result::Result<(), ::docsave::IdentifierError> {
                self.#ident = <#ty as ::std::convert::TryFrom<i64>>::try_from(id).map_err(|_| {
                    ::docsave::IdentifierError::OutOfRange {
                        type_name: ::std::any::type_name::<Self>(),
                        field: #field_name,
                        id,
                    }
                })?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let kind_method = options.kind.map(|kind| {
        quote! {
            fn entity_kind() -> ::std::string::String {
                ::std::string::String::from(#kind)
            }
        }
    });

    let before_save_method = options.before_save.then(|| {
        quote! {
            fn before_save_hook(&mut self) -> ::std::option::Option<&mut dyn ::docsave::BeforeSave> {
                ::std::option::Option::Some(self)
            }
        }
    });

    let after_save_method = options.after_save.then(|| {
        quote! {
            fn after_save_hook(&mut self) -> ::std::option::Option<&mut dyn ::docsave::AfterSave> {
                ::std::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::docsave::Entity for #struct_name #ty_generics #where_clause {
            #identity_methods
            #kind_method
            #before_save_method
            #after_save_method
        }
    })
}

fn parse_entity_options(attrs: &[syn::Attribute]) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions {
        kind: None,
        before_save: false,
        after_save: false,
    };

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                let kind = lit.value();
                if kind.is_empty() {
                    return Err(syn::Error::new(lit.span(), "entity kind must not be empty"));
                }
                options.kind = Some(kind);
                return Ok(());
            }

            if meta.path.is_ident("before_save") {
                options.before_save = true;
                return Ok(());
            }

            if meta.path.is_ident("after_save") {
                options.after_save = true;
                return Ok(());
            }

            Err(meta.error(
                "Unsupported entity attribute. Supported: kind = \"...\", before_save, after_save",
            ))
        })?;
    }

    Ok(options)
}

/// True when the field carries `#[entity(id)]`.
fn has_id_marker(field: &syn::Field) -> syn::Result<bool> {
    let mut marked = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                marked = true;
                return Ok(());
            }
            Err(meta.error("Unsupported entity field attribute. Supported: id"))
        })?;
    }
    Ok(marked)
}

fn reject_id_markers<'a>(fields: impl Iterator<Item = &'a syn::Field>) -> syn::Result<()> {
    for field in fields {
        if has_id_marker(field)? {
            return Err(syn::Error::new(
                field.span(),
                "#[entity(id)] requires a named field",
            ));
        }
    }
    Ok(())
}

struct IdField {
    ident: Ident,
    ty: Type,
}

/// Rejects field types that cannot hold an integer identifier.
fn check_id_type(field: &syn::Field) -> syn::Result<()> {
    if let Type::Path(path) = &field.ty {
        if let Some(segment) = path.path.segments.last() {
            let name = segment.ident.to_string();
            if matches!(
                name.as_str(),
                "f32" | "f64" | "bool" | "char" | "String" | "str" | "Option"
            ) {
                return Err(syn::Error::new(
                    field.ty.span(),
                    format!("identifier field must be an integer type, found `{name}`"),
                ));
            }
        }
    }
    Ok(())
}

fn find_id_field(fields: &syn::FieldsNamed) -> syn::Result<Option<IdField>> {
    let mut marked: Option<&syn::Field> = None;
    let mut by_name = Vec::<&syn::Field>::new();

    for field in &fields.named {
        let Some(ident) = &field.ident else {
            continue;
        };

        if has_id_marker(field)? {
            if marked.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field may be marked #[entity(id)]",
                ));
            }
            marked = Some(field);
        }

        let name = ident.to_string();
        let name = name.trim_start_matches("r#");
        if name == "id" || name == "ID" {
            by_name.push(field);
        }
    }

    if marked.is_none() && by_name.len() > 1 {
        return Err(syn::Error::new(
            fields.span(),
            "both `id` and `ID` fields found; mark one with #[entity(id)]",
        ));
    }

    let Some(field) = marked.or_else(|| by_name.pop()) else {
        return Ok(None);
    };
    check_id_type(field)?;
    Ok(field.ident.clone().map(|ident| IdField {
        ident,
        ty: field.ty.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expand_error(input: DeriveInput) -> String {
        match expand_entity(input) {
            Ok(_) => panic!("expansion should fail"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn test_float_identifier_is_rejected() {
        let message = expand_error(parse_quote! {
            struct Gauge {
                id: f64,
                level: f64,
            }
        });
        assert_eq!(message, "identifier field must be an integer type, found `f64`");
    }

    #[test]
    fn test_marked_string_identifier_is_rejected() {
        let message = expand_error(parse_quote! {
            struct Tag {
                #[entity(id)]
                slug: String,
            }
        });
        assert!(message.contains("`String`"));
    }

    #[test]
    fn test_identifier_conversions_are_checked() {
        let tokens = expand_entity(parse_quote! {
            struct Ticket {
                id: u8,
                title: String,
            }
        })
        .unwrap()
        .to_string();
        assert!(tokens.contains("TryFrom"));
        assert!(!tokens.contains(" as i64"));
        assert!(!tokens.contains("as _"));
    }

    #[test]
    fn test_conflicting_id_fields_need_marker() {
        let message = expand_error(parse_quote! {
            #[allow(non_snake_case)]
            struct Mixed {
                id: i64,
                ID: i64,
            }
        });
        assert!(message.contains("mark one with #[entity(id)]"));
    }
}
