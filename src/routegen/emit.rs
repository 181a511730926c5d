// src/routegen/emit.rs

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use crate::errors::GenerationError;
use crate::host::loader::DEFAULT_ENTRY_SYMBOL;
use crate::routegen::model::RouteTable;
use crate::types::HttpMethod;

/// Header written above the generated tokens.
pub const GENERATED_HEADER: &str = "// @generated by hotserve. Do not edit; changes are overwritten on the next build.\n";

/// Knobs for the generated source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Name of the generated `RequestHandlers` implementation.
    pub struct_name: String,
    /// Exported constructor symbol looked up by the dynamic loader.
    pub entry_symbol: String,
    /// Crate through which the runtime contract is reached.
    pub runtime_crate: String,
    /// Also emit the in-process `serve(port)` entry point.
    pub emit_serve: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            struct_name: "AppRequestHandlers".to_string(),
            entry_symbol: DEFAULT_ENTRY_SYMBOL.to_string(),
            runtime_crate: "hotserve".to_string(),
            emit_serve: true,
        }
    }
}

/// Render `table` as a Rust source unit meant to be `include!`d at the
/// crate root of the application.
pub fn emit(table: &RouteTable, options: &EmitOptions) -> Result<String, GenerationError> {
    let struct_name = ident(&options.struct_name, "struct name")?;
    let entry_symbol = ident(&options.entry_symbol, "entry symbol")?;
    let rt = ident(&options.runtime_crate, "runtime crate")?;

    let var_names = endpoint_var_names(table);

    let creators = table.endpoints().iter().zip(&var_names).map(|(endpoint, var)| {
        let ty = endpoint_type(&endpoint.type_path);
        quote! {
            let #var = ::std::sync::Arc::new(<#ty as ::std::default::Default>::default());
        }
    });

    let registrations = (0..table.endpoints().len()).flat_map(|index| {
        let var = &var_names[index];
        let rt = &rt;
        table.routes_of(index).into_iter().map(move |route| {
            let path = &route.path;
            let method = format_ident!("{}", route.handler);
            match route.method {
                HttpMethod::Get => quote! {
                    {
                        let endpoint = ::std::sync::Arc::clone(&#var);
                        get_handlers.insert(
                            #path.to_string(),
                            ::std::boxed::Box::new(move || -> ::std::option::Option<::std::string::String> {
                                ::#rt::http::IntoBody::into_body(endpoint.#method())
                            }),
                        );
                    }
                },
                HttpMethod::Post => quote! {
                    {
                        let endpoint = ::std::sync::Arc::clone(&#var);
                        post_handlers.insert(
                            #path.to_string(),
                            ::std::boxed::Box::new(move |body: ::std::string::String| -> ::std::option::Option<::std::string::String> {
                                ::#rt::http::IntoBody::into_body(endpoint.#method(body))
                            }),
                        );
                    }
                },
            }
        })
    });

    let serve = options.emit_serve.then(|| {
        quote! {
            /// Serve this application in-process on `port` without reloading.
            pub fn serve(port: u16) -> ::#rt::Result<()> {
                ::#rt::http::serve_static(::std::boxed::Box::new(#struct_name::new()), port)
            }
        }
    });

    let tokens: TokenStream = quote! {
        pub struct #struct_name {
            get_handlers: ::#rt::http::GetHandlers,
            post_handlers: ::#rt::http::PostHandlers,
        }

        impl #struct_name {
            #[allow(unused_mut, unused_variables)]
            pub fn new() -> Self {
                #(#creators)*

                let mut get_handlers: ::#rt::http::GetHandlers = ::std::collections::HashMap::new();
                let mut post_handlers: ::#rt::http::PostHandlers = ::std::collections::HashMap::new();

                #(#registrations)*

                Self {
                    get_handlers,
                    post_handlers,
                }
            }
        }

        impl ::std::default::Default for #struct_name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::#rt::http::RequestHandlers for #struct_name {
            fn get_handlers(&self) -> &::#rt::http::GetHandlers {
                &self.get_handlers
            }

            fn post_handlers(&self) -> &::#rt::http::PostHandlers {
                &self.post_handlers
            }
        }

        /// Constructor looked up by the reloading host.
        #[unsafe(no_mangle)]
        pub fn #entry_symbol() -> ::std::boxed::Box<dyn ::#rt::http::RequestHandlers> {
            ::std::boxed::Box::new(#struct_name::new())
        }

        #serve
    };

    Ok(format!("{GENERATED_HEADER}{tokens}\n"))
}

fn ident(name: &str, what: &str) -> Result<Ident, GenerationError> {
    syn::parse_str::<Ident>(name).map_err(|e| GenerationError::Malformed {
        location: format!("{what} \"{name}\""),
        message: e.to_string(),
    })
}

fn endpoint_type(type_path: &[String]) -> TokenStream {
    let segments = type_path.iter().map(|s| format_ident!("{}", s));
    quote! { crate #(:: #segments)* }
}

/// Local variable per endpoint: the snake-cased type name, suffixed when two
/// endpoints share a type name.
fn endpoint_var_names(table: &RouteTable) -> Vec<Ident> {
    let mut seen = HashSet::new();
    table
        .endpoints()
        .iter()
        .enumerate()
        .map(|(index, endpoint)| {
            let base = snake_case(endpoint.type_name());
            let name = if seen.insert(base.clone()) {
                base
            } else {
                format!("{base}_{index}")
            };
            format_ident!("{}", name)
        })
        .collect()
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    format!("{out}_endpoint")
}
