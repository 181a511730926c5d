// src/routegen/mod.rs

//! Build-time route table generation.
//!
//! The generator never runs while serving. It is invoked from an
//! application's `build.rs` (see [`build::generate_for_build`]) or by the
//! `hotserve generate` command and proceeds in four steps:
//!
//! 1. [`scan`]: parse every `.rs` file below the source root with `syn` and
//!    collect the `#[endpoint]` impl blocks and their `#[get]`/`#[post]`
//!    methods.
//! 2. [`join`]: combine base and sub paths.
//! 3. [`table`]: build the `(method, path)` table and reject collisions.
//! 4. [`emit`]: write a Rust source unit with the dispatch table, the
//!    exported constructor and a `serve` entry point.
//!
//! Nothing is written unless all four steps succeed.

pub mod build;
pub mod emit;
pub mod join;
pub mod model;
pub mod scan;
pub mod table;

pub use build::{GENERATED_FILE_NAME, Generated, generate, generate_for_build, render};
pub use emit::{EmitOptions, emit};
pub use join::join_paths;
pub use model::{Endpoint, HandlerMethod, RouteEntry, RouteTable};
pub use scan::{ScanOutput, scan_sources};
