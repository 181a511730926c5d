// src/routegen/table.rs

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::errors::GenerationError;
use crate::routegen::join::join_paths;
use crate::routegen::model::{Endpoint, RouteEntry, RouteTable};

impl RouteTable {
    /// Join every handler's path and build the dispatch table.
    ///
    /// Two handlers of the same HTTP method resolving to the same path are
    /// rejected; the same path under GET and POST is fine.
    pub fn build(endpoints: Vec<Endpoint>) -> Result<Self, GenerationError> {
        let mut routes: BTreeMap<_, RouteEntry> = BTreeMap::new();

        for (index, endpoint) in endpoints.iter().enumerate() {
            for handler in &endpoint.handlers {
                let path = join_paths(&endpoint.base_path, &handler.sub_path);
                let entry = RouteEntry {
                    method: handler.method,
                    path: path.clone(),
                    endpoint: index,
                    handler: handler.name.clone(),
                };

                match routes.entry((handler.method, path)) {
                    Entry::Occupied(existing) => {
                        let first = existing.get();
                        return Err(GenerationError::DuplicateRoute {
                            method: handler.method,
                            path: first.path.clone(),
                            first: endpoints[first.endpoint].location(&first.handler),
                            second: endpoint.location(&handler.name),
                        });
                    }
                    Entry::Vacant(slot) => {
                        debug!(method = %entry.method, path = %entry.path, handler = %entry.handler, "route");
                        slot.insert(entry);
                    }
                }
            }
        }

        Ok(Self { endpoints, routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routegen::model::HandlerMethod;
    use crate::types::HttpMethod;

    fn endpoint(name: &str, base: &str, handlers: &[(HttpMethod, &str, &str)]) -> Endpoint {
        Endpoint {
            type_path: vec![name.to_string()],
            base_path: base.to_string(),
            handlers: handlers
                .iter()
                .map(|(method, name, sub)| HandlerMethod {
                    method: *method,
                    name: name.to_string(),
                    sub_path: sub.to_string(),
                })
                .collect(),
            source: "src/lib.rs".into(),
        }
    }

    #[test]
    fn same_path_different_methods_is_fine() {
        let table = RouteTable::build(vec![endpoint(
            "Main",
            "/",
            &[(HttpMethod::Get, "index", ""), (HttpMethod::Post, "submit", "")],
        )])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(HttpMethod::Post, "/").unwrap().handler, "submit");
    }

    #[test]
    fn collision_across_endpoints_is_rejected() {
        let err = RouteTable::build(vec![
            endpoint("A", "/api", &[(HttpMethod::Get, "one", "x")]),
            endpoint("B", "/api/", &[(HttpMethod::Get, "two", "/x")]),
        ])
        .unwrap_err();
        match err {
            GenerationError::DuplicateRoute { method, path, first, second } => {
                assert_eq!(method, HttpMethod::Get);
                assert_eq!(path, "/api/x");
                assert!(first.ends_with("A::one"), "{first}");
                assert!(second.ends_with("B::two"), "{second}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
