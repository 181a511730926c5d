//! Argument validation for the marker attributes.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::meta::ParseNestedMeta;
use syn::spanned::Spanned;
use syn::{Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    fn marker(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }

    fn from_attr(attr: &Attribute) -> Option<Self> {
        let last = attr.path().segments.last()?;
        if last.ident == "get" {
            Some(Method::Get)
        } else if last.ident == "post" {
            Some(Method::Post)
        } else {
            None
        }
    }
}

/// Parse `path = "..."` from attribute arguments; empty arguments are fine.
fn parse_path_args(args: TokenStream) -> syn::Result<Option<LitStr>> {
    let mut path = None;
    if args.is_empty() {
        return Ok(path);
    }
    let parser = syn::meta::parser(|meta| parse_path_key(meta, &mut path));
    syn::parse::Parser::parse2(parser, args)?;
    Ok(path)
}

fn parse_path_key(meta: ParseNestedMeta, path: &mut Option<LitStr>) -> syn::Result<()> {
    if meta.path.is_ident("path") {
        if path.is_some() {
            return Err(meta.error("duplicate `path`"));
        }
        *path = Some(meta.value()?.parse()?);
        Ok(())
    } else {
        Err(meta.error("unknown key; only `path = \"...\"` is supported"))
    }
}

pub fn expand_endpoint(args: TokenStream, mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some(base) = parse_path_args(args)? {
        if !base.value().starts_with('/') {
            return Err(syn::Error::new(base.span(), "endpoint path must start with '/'"));
        }
    }
    if let Some((_, trait_path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            trait_path.span(),
            "#[endpoint] must be placed on an inherent impl block",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "#[endpoint] impl blocks cannot be generic",
        ));
    }

    let mut errors: Option<syn::Error> = None;
    for impl_item in &mut item.items {
        let ImplItem::Fn(func) = impl_item else {
            continue;
        };
        let mut kept = Vec::with_capacity(func.attrs.len());
        for attr in std::mem::take(&mut func.attrs) {
            let Some(method) = Method::from_attr(&attr) else {
                kept.push(attr);
                continue;
            };
            let result = handler_args(&attr).and_then(|_| check_handler(method, func));
            if let Err(err) = result {
                match errors.as_mut() {
                    Some(all) => all.combine(err),
                    None => errors = Some(err),
                }
            }
        }
        func.attrs = kept;
    }

    match errors {
        Some(err) => Err(err),
        None => Ok(item.into_token_stream()),
    }
}

pub fn expand_handler(method: Method, args: TokenStream, item: ImplItemFn) -> syn::Result<TokenStream> {
    parse_path_args(args)?;
    check_handler(method, &item)?;
    Ok(item.into_token_stream())
}

fn handler_args(attr: &Attribute) -> syn::Result<Option<LitStr>> {
    match &attr.meta {
        syn::Meta::Path(_) => Ok(None),
        syn::Meta::List(list) => parse_path_args(list.tokens.clone()),
        syn::Meta::NameValue(nv) => Err(syn::Error::new(
            nv.span(),
            "expected `(path = \"...\")` arguments",
        )),
    }
}

fn check_handler(method: Method, func: &ImplItemFn) -> syn::Result<()> {
    let sig = &func.sig;
    if let Some(asyncness) = sig.asyncness {
        return Err(syn::Error::new(asyncness.span(), "handlers cannot be async"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(sig.generics.span(), "handlers cannot be generic"));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                sig.span(),
                format!("#[{}] handlers must take `&self`", method.marker()),
            ));
        }
    }

    let expected = match method {
        Method::Get => 0,
        Method::Post => 1,
    };
    let found = inputs.count();
    if found != expected {
        return Err(syn::Error::new(
            sig.inputs.span(),
            format!(
                "#[{}] handlers take {expected} argument(s) besides `&self`, found {found}",
                method.marker()
            ),
        ));
    }
    Ok(())
}
