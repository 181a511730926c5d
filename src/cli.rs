// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::host::loader::EntryPointId;

/// Command-line arguments for `hotserve`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hotserve",
    version,
    about = "Serve a compiled web application and hot-swap it whenever it is rebuilt.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HOTSERVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the application, serve it and reload it on every rebuild.
    Serve(ServeArgs),

    /// Generate the route table source unit for an application.
    Generate(GenerateArgs),

    /// Print the route table of an application without writing anything.
    Routes(RoutesArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Directory the application's library is built into, e.g.
    /// `target/debug`.
    #[arg(value_name = "ARTIFACT_DIR")]
    pub artifact_dir: PathBuf,

    /// Constructor to call, as `[library:]symbol`, e.g.
    /// `hello_app:hotserve_entry`.
    #[arg(value_name = "ENTRY_POINT", default_value = "hotserve_entry")]
    pub entry_point: EntryPointId,

    /// Path to the config file (TOML).
    ///
    /// Default: `Hotserve.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Port to listen on; overrides `[server].port`.
    #[arg(long, value_name = "N")]
    pub port: Option<u16>,

    /// Interface to bind; overrides `[server].interface`.
    #[arg(long, value_name = "IP")]
    pub interface: Option<IpAddr>,
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Source root of the application (the directory holding `lib.rs`).
    #[arg(long, value_name = "DIR")]
    pub src: PathBuf,

    /// File to write.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Name of the generated handler struct.
    #[arg(long, value_name = "NAME", default_value = "AppRequestHandlers")]
    pub struct_name: String,

    /// Exported constructor symbol.
    #[arg(long, value_name = "NAME", default_value = "hotserve_entry")]
    pub entry_symbol: String,

    /// Crate name the generated code uses to reach the runtime.
    #[arg(long, value_name = "NAME", default_value = "hotserve")]
    pub runtime_crate: String,
}

#[derive(Debug, Clone, Args)]
pub struct RoutesArgs {
    /// Source root of the application.
    #[arg(long, value_name = "DIR")]
    pub src: PathBuf,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_arguments() {
        let args = CliArgs::try_parse_from([
            "hotserve",
            "--log-level",
            "debug",
            "serve",
            "target/debug",
            "hello_app:hotserve_entry",
            "--port",
            "0",
        ])
        .unwrap();
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.artifact_dir, PathBuf::from("target/debug"));
        assert_eq!(serve.entry_point.library(), Some("hello_app"));
        assert_eq!(serve.port, Some(0));
        assert!(serve.config.is_none());
    }

    #[test]
    fn bad_entry_point_is_a_usage_error() {
        assert!(CliArgs::try_parse_from(["hotserve", "serve", "out", "not a symbol"]).is_err());
    }
}
