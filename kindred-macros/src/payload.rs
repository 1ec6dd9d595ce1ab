//! `#[derive(Payload)]`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{quote, quote_spanned};
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Fields, Lit, LitStr, Member, Meta,
    parse_macro_input, spanned::Spanned,
};

const ATTR: &str = "content_type";

pub fn derive_payload_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let declared = declared_content_type(&input.attrs, input.ident.span())?;
    let instance = instance_field(&input.data)?.map(|(member, span)| {
        quote_spanned! {span=>
            fn content_type(&self) -> ::core::option::Option<::kindred::ContentType> {
                ::core::convert::Into::into(::core::clone::Clone::clone(&self.#member))
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::kindred::ContentTyped for #name #ty_generics #where_clause {
            const CONTENT_TYPE: &'static str = #declared;
        }

        impl #impl_generics ::kindred::Payload for #name #ty_generics #where_clause {
            #instance

            fn declared_content_type(&self) -> ::core::option::Option<&'static str> {
                ::core::option::Option::Some(<Self as ::kindred::ContentTyped>::CONTENT_TYPE)
            }
        }
    })
}

/// The container-level `#[content_type = "..."]`, validated.
fn declared_content_type(attrs: &[Attribute], span: Span) -> syn::Result<LitStr> {
    let mut found = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident(ATTR)) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate `content_type` attribute"));
        }
        let Meta::NameValue(meta) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                attr,
                "expected `#[content_type = \"a.b.c\"]`",
            ));
        };
        let Expr::Lit(ExprLit {
            lit: Lit::Str(lit), ..
        }) = &meta.value
        else {
            return Err(syn::Error::new_spanned(
                &meta.value,
                "content type must be a string literal",
            ));
        };
        validate(lit)?;
        found = Some(lit.clone());
    }

    found.ok_or_else(|| {
        syn::Error::new(
            span,
            "missing `#[content_type = \"...\"]` attribute for `#[derive(Payload)]`",
        )
    })
}

fn validate(lit: &LitStr) -> syn::Result<()> {
    let value = lit.value();
    let message = if value.is_empty() {
        Some("content type must not be empty")
    } else if value.contains('+') {
        Some("payload content type must not contain a `+` suffix")
    } else if value.chars().any(char::is_whitespace) {
        Some("content type must not contain whitespace")
    } else if value.split('.').any(str::is_empty) {
        Some("content type must not contain empty `.` segments")
    } else {
        None
    };
    match message {
        Some(message) => Err(syn::Error::new_spanned(lit, message)),
        None => Ok(()),
    }
}

/// The field marked `#[content_type]`, if any.
fn instance_field(data: &Data) -> syn::Result<Option<(Member, Span)>> {
    let fields = match data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) | Data::Union(_) => return Ok(None),
    };
    let members: Vec<(Member, &syn::Field)> = match fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|f| f.ident.clone().map(|ident| (Member::Named(ident), f)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(i, f)| (Member::Unnamed(i.into()), f))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let mut found = None;
    for (member, field) in members {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident(ATTR)) else {
            continue;
        };
        if !matches!(attr.meta, Meta::Path(_)) {
            return Err(syn::Error::new_spanned(
                attr,
                "field attribute takes no value: `#[content_type]`",
            ));
        }
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "only one field may be marked `#[content_type]`",
            ));
        }
        found = Some((member, field.ty.span()));
    }
    Ok(found)
}
