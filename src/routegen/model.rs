// src/routegen/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::HttpMethod;

/// A marked handler method of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMethod {
    pub method: HttpMethod,
    /// Method name, e.g. `hello`.
    pub name: String,
    /// Sub path from the marker, `""` if none was given.
    pub sub_path: String,
}

/// An `impl` block marked `#[endpoint]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Module path segments below the crate root followed by the type name,
    /// e.g. `["app", "main_resource", "MainResource"]`.
    pub type_path: Vec<String>,
    pub base_path: String,
    /// In declaration order.
    pub handlers: Vec<HandlerMethod>,
    /// File the impl block was found in.
    pub source: PathBuf,
}

impl Endpoint {
    pub fn type_name(&self) -> &str {
        self.type_path.last().map(String::as_str).unwrap_or_default()
    }

    /// `crate::`-qualified type path as it appears in generated code.
    pub fn qualified_name(&self) -> String {
        format!("crate::{}", self.type_path.join("::"))
    }

    /// `file:Type::method`, used in diagnostics.
    pub fn location(&self, handler: &str) -> String {
        format!("{}:{}::{}", self.source.display(), self.type_name(), handler)
    }
}

/// One entry of the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method: HttpMethod,
    /// Joined path.
    pub path: String,
    /// Index into [`RouteTable::endpoints`].
    pub endpoint: usize,
    pub handler: String,
}

/// Collision-free routes of all discovered endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) routes: BTreeMap<(HttpMethod, String), RouteEntry>,
}

impl RouteTable {
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Routes sorted by method, then path.
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn lookup(&self, method: HttpMethod, path: &str) -> Option<&RouteEntry> {
        self.routes.get(&(method, path.to_string()))
    }

    /// Routes of one endpoint, GET before POST, each in declaration order.
    pub fn routes_of(&self, endpoint: usize) -> Vec<&RouteEntry> {
        let Some(ep) = self.endpoints.get(endpoint) else {
            return Vec::new();
        };
        let mut handlers: Vec<&HandlerMethod> = ep.handlers.iter().collect();
        handlers.sort_by_key(|h| h.method);
        handlers
            .into_iter()
            .filter_map(|h| {
                self.routes
                    .values()
                    .find(|r| r.endpoint == endpoint && r.method == h.method && r.handler == h.name)
            })
            .collect()
    }
}
