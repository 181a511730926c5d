// src/http/server.rs

//! Thin adapter over `tiny_http`.
//!
//! Wire parsing and socket handling stay inside `tiny_http`; this module only
//! maps a request to [`Request`], asks the [`Dispatch`] for a body and turns
//! the answer into a response: a non-empty body is `200 OK` as `text/plain`,
//! anything else is `404 Not Found` without a body.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Context;
use tiny_http::{Method, Response, Server, StatusCode};
use tracing::{debug, info, warn};

use super::{Dispatch, Request};
use crate::errors::{HotserveError, Result};
use crate::types::HttpMethod;

/// A bound listening socket that has not started serving yet.
pub struct HttpServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer").field("addr", &self.addr).finish()
    }
}

impl HttpServer {
    /// Bind `interface:port`. Port 0 picks a free port; see [`local_addr`].
    ///
    /// [`local_addr`]: HttpServer::local_addr
    pub fn bind(interface: IpAddr, port: u16) -> Result<Self> {
        let requested = SocketAddr::new(interface, port);
        let server = Server::http(requested)
            .map_err(|e| HotserveError::Server(format!("cannot bind {requested}: {e}")))?;
        let addr = server.server_addr().to_ip().unwrap_or(requested);
        Ok(Self {
            server: Arc::new(server),
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start `workers` request threads, all dispatching through `dispatch`.
    pub fn spawn(self, dispatch: Arc<dyn Dispatch>, workers: usize) -> ServerHandle {
        let workers = workers.max(1);
        info!(addr = %self.addr, workers, "http server started");

        let threads = (0..workers)
            .filter_map(|i| {
                let server = Arc::clone(&self.server);
                let dispatch = Arc::clone(&dispatch);
                thread::Builder::new()
                    .name(format!("hotserve-http-{i}"))
                    .spawn(move || request_loop(&server, dispatch.as_ref()))
                    .map_err(|e| warn!(worker = i, error = %e, "failed to spawn http worker"))
                    .ok()
            })
            .collect();

        ServerHandle {
            server: self.server,
            addr: self.addr,
            threads,
        }
    }
}

/// Running server. Dropping it does not stop the workers; call
/// [`ServerHandle::shutdown`].
pub struct ServerHandle {
    server: Arc<Server>,
    addr: SocketAddr,
    threads: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle")
            .field("addr", &self.addr)
            .field("workers", &self.threads.len())
            .finish()
    }
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wake every worker out of its blocking receive and wait for them.
    ///
    /// Requests already being handled run to completion.
    pub fn shutdown(self) {
        for _ in &self.threads {
            self.server.unblock();
        }
        self.join();
    }

    /// Block until all workers have exited.
    pub fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                warn!("http worker panicked");
            }
        }
        debug!(addr = %self.addr, "http server stopped");
    }
}

fn request_loop(server: &Server, dispatch: &dyn Dispatch) {
    // `recv` fails once the server is unblocked.
    while let Ok(request) = server.recv() {
        if let Err(err) = handle_request(request, dispatch) {
            warn!(error = %err, "request error");
        }
    }
}

fn handle_request(mut request: tiny_http::Request, dispatch: &dyn Dispatch) -> anyhow::Result<()> {
    let method = match request.method() {
        Method::Get => Some(HttpMethod::Get),
        Method::Post => Some(HttpMethod::Post),
        _ => None,
    };
    let path = request_path(request.url()).to_string();

    let body = match method {
        Some(method) => {
            let body = read_body(&mut request)?;
            let parsed = Request { method, path, body };
            let answer = dispatch.dispatch(&parsed);
            debug!(
                method = %parsed.method,
                path = %parsed.path,
                found = answer.is_some(),
                "dispatched request"
            );
            answer
        }
        None => None,
    };

    let response = match body.filter(|b| !b.is_empty()) {
        // `from_string` already labels the body as `text/plain`.
        Some(body) => Response::from_string(body),
        None => Response::from_string(String::new()).with_status_code(StatusCode(404)),
    };

    request.respond(response).context("writing response")?;
    Ok(())
}

/// Read the whole body. Invalid UTF-8 is replaced rather than rejected.
fn read_body(request: &mut tiny_http::Request) -> anyhow::Result<Option<String>> {
    let mut bytes = Vec::new();
    request
        .as_reader()
        .read_to_end(&mut bytes)
        .context("reading request body")?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Strip the query string and fragment from a request target.
pub fn request_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
