// src/cli.rs

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Stdio server that installs, runs and supervises Node.js projects in
/// containers.
#[derive(Debug, Clone, Parser)]
#[command(name = "nodejob", version, long_about = None)]
pub struct CliArgs {
    /// TOML settings file. Defaults to `./Nodejob.toml` when that exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Engine CLI to drive (e.g. `podman`); overrides `[engine].binary`.
    #[arg(long, value_name = "BINARY")]
    pub engine: Option<String>,

    /// Node.js base image; overrides `[engine].image`.
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,

    /// Log verbosity; takes precedence over `NODEJOB_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective settings and tool list, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Equivalent `EnvFilter` directive.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
