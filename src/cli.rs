// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Value flags are `Option`s so that [`crate::config::Settings`] can tell an
//! explicit flag apart from a value that should fall back to `devloop.toml`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "devloop",
    version,
    about = "A live reload utility for web applications: watch, rebuild, restart, proxy.",
    long_about = None
)]
pub struct CliArgs {
    /// Port for the proxy server (default 3000).
    #[arg(short = 'p', long, global = true, value_name = "PORT")]
    pub port: Option<u16>,

    /// Port the application listens on; exported to it as `PORT` (default 3001).
    #[arg(short = 'a', long, global = true, value_name = "PORT")]
    pub app_port: Option<u16>,

    /// Name of the generated binary file (default `devloop-bin`).
    #[arg(short = 'b', long, global = true, value_name = "NAME")]
    pub bin: Option<String>,

    /// Path to watch files from (default `.`).
    #[arg(short = 't', long, global = true, value_name = "PATH")]
    pub path: Option<String>,

    /// Scan this many parent folders up from `--path` (useful for monorepos).
    #[arg(long, global = true, value_name = "N")]
    pub scan_lower: Option<usize>,

    /// Comma separated paths to ignore files in.
    #[arg(short = 'e', long, global = true, value_name = "LIST")]
    pub exclude: Option<String>,

    /// Comma separated args to give to the application.
    #[arg(short = 'u', long, global = true, value_name = "LIST")]
    pub run_args: Option<String>,

    /// Source file extension that triggers a rebuild (default `go`).
    #[arg(long, global = true, value_name = "EXT")]
    pub ext: Option<String>,

    /// Run the server immediately after it's built.
    #[arg(short = 'i', long, global = true)]
    pub immediate: bool,

    /// Use godep when building.
    #[arg(short = 'g', long, global = true)]
    pub godep: bool,

    /// Send desktop notifications when rebuilding.
    #[arg(short = 'n', long, global = true)]
    pub notify: bool,

    /// Disable filesystem events and rely on interval scanning only.
    #[arg(long, global = true)]
    pub poll_only: bool,

    /// Path to an optional TOML config file (default `devloop.toml` if present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the proxy and rebuild loop in the current working directory.
    #[command(alias = "r")]
    Run,
    /// Display environment variables set by the .env file.
    #[command(alias = "e")]
    Env,
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
