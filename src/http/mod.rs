// src/http/mod.rs

//! The dispatch contract between the serving engine and an application.
//!
//! An application exposes two maps keyed by joined route path: GET handlers
//! producing a body, POST handlers turning the request body into a body.
//! The route generator emits an implementation of [`RequestHandlers`] that
//! fills those maps; the host wraps whichever implementation is current in a
//! [`Dispatch`] for the engine in [`server`].

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, LazyLock};

use tracing::info;

use crate::errors::Result;
use crate::types::HttpMethod;

pub mod server;

pub use server::{HttpServer, ServerHandle};

/// Handler for a GET route. `None` means "no content".
pub type GetHandler = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// Handler for a POST route, called with the raw request body.
pub type PostHandler = Box<dyn Fn(String) -> Option<String> + Send + Sync>;

pub type GetHandlers = HashMap<String, GetHandler>;
pub type PostHandlers = HashMap<String, PostHandler>;

static NO_GET_HANDLERS: LazyLock<GetHandlers> = LazyLock::new(HashMap::new);
static NO_POST_HANDLERS: LazyLock<PostHandlers> = LazyLock::new(HashMap::new);

/// Conversion of a handler's return value into a response body.
///
/// Generated dispatch code funnels every handler result through this trait,
/// so handlers may return `String`, `&str` or an `Option` of either.
pub trait IntoBody {
    fn into_body(self) -> Option<String>;
}

impl IntoBody for String {
    fn into_body(self) -> Option<String> {
        Some(self)
    }
}

impl IntoBody for &str {
    fn into_body(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl<T: IntoBody> IntoBody for Option<T> {
    fn into_body(self) -> Option<String> {
        self.and_then(IntoBody::into_body)
    }
}

/// A parsed request as seen by an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: HttpMethod,
    /// Path without query string, e.g. `/hello`.
    pub path: String,
    pub body: Option<String>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

/// Route handlers of one application instance.
///
/// Implementations are created once per loaded generation and shared by all
/// request threads, hence `Send + Sync`.
pub trait RequestHandlers: Send + Sync {
    fn get_handlers(&self) -> &GetHandlers {
        &NO_GET_HANDLERS
    }

    fn post_handlers(&self) -> &PostHandlers {
        &NO_POST_HANDLERS
    }

    /// Look up the handler for `request` and run it.
    fn handle(&self, request: &Request) -> Option<String> {
        match request.method {
            HttpMethod::Get => self.get_handlers().get(&request.path).and_then(|h| h()),
            HttpMethod::Post => self
                .post_handlers()
                .get(&request.path)
                .and_then(|h| h(request.body.clone().unwrap_or_default())),
        }
    }

    /// Release hook, invoked once when a newer generation has replaced this
    /// one. Use it to close resources the application opened itself.
    fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What the serving engine calls for every request.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, request: &Request) -> Option<String>;
}

/// A fixed handler set, used when an application is served without the
/// reloading host.
pub struct StaticDispatch {
    handlers: Box<dyn RequestHandlers>,
}

impl StaticDispatch {
    pub fn new(handlers: Box<dyn RequestHandlers>) -> Self {
        Self { handlers }
    }
}

impl Dispatch for StaticDispatch {
    fn dispatch(&self, request: &Request) -> Option<String> {
        self.handlers.handle(request)
    }
}

/// Serve `handlers` on `port` until the process ends.
///
/// This is what the generated `serve` entry point calls.
pub fn serve_static(handlers: Box<dyn RequestHandlers>, port: u16) -> Result<()> {
    let server = HttpServer::bind(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)?;
    info!(addr = %server.local_addr(), "serving static route table");
    let handle = server.spawn(Arc::new(StaticDispatch::new(handlers)), 4);
    handle.join();
    Ok(())
}
