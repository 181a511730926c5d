//! Marker attributes for hotserve endpoints.
//!
//! The attributes carry no runtime behaviour. The route generator reads them
//! from source at build time; these macros only make them legal Rust and
//! reject malformed arguments early, with a span pointing at the mistake.
//!
//! ```ignore
//! use hotserve::endpoint;
//!
//! #[derive(Default)]
//! pub struct MainResource;
//!
//! #[endpoint(path = "/")]
//! impl MainResource {
//!     #[get]
//!     pub fn index(&self) -> String { "Hello from the index\n".into() }
//!
//!     #[get(path = "hello")]
//!     pub fn hello(&self) -> &'static str { "Hello world!\n" }
//!
//!     #[post]
//!     pub fn echo(&self, body: String) -> String { format!("Got body: {body}") }
//! }
//! ```
//!
//! # Attributes
//!
//! - `#[endpoint]` / `#[endpoint(path = "/base")]` on an inherent impl block.
//!   The base path defaults to `/` and must start with `/`.
//! - `#[get]` / `#[get(path = "sub")]` on a method taking `&self`.
//! - `#[post]` / `#[post(path = "sub")]` on a method taking `&self` and the
//!   request body.
//!
//! `#[endpoint]` validates and removes the method markers inside its block,
//! so only `endpoint` needs to be in scope there. `get` and `post` expand on
//! their own only when used outside an endpoint block.

mod markers;

use proc_macro::TokenStream;
use syn::{ImplItemFn, ItemImpl, parse_macro_input};

/// Mark an inherent impl block as an HTTP endpoint.
#[proc_macro_attribute]
pub fn endpoint(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    markers::expand_endpoint(args.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Mark a method as a GET handler.
#[proc_macro_attribute]
pub fn get(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ImplItemFn);
    markers::expand_handler(markers::Method::Get, args.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Mark a method as a POST handler.
#[proc_macro_attribute]
pub fn post(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ImplItemFn);
    markers::expand_handler(markers::Method::Post, args.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
