// src/lib.rs

//! Example application for `hotserve`.
//!
//! Build it, then serve it with reloading:
//!
//! ```text
//! cargo build
//! hotserve serve target/debug hello_app:hotserve_entry
//! ```
//!
//! Rebuilding while the host runs swaps in the new code.

pub mod app;

include!(concat!(env!("OUT_DIR"), "/app_request_handlers.rs"));
