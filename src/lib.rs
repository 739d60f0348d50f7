// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod manifest;
pub mod server;
pub mod supervisor;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, load_or_default};
use crate::exec::CliEngine;
use crate::fs::RealFileSystem;
use crate::server::{Tool, ToolHandler, serve};
use crate::supervisor::Supervisor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - the engine backend and supervisor
/// - the stdio transport
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = effective_settings(&args)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    info!(
        engine = %settings.engine_binary,
        image = %settings.image,
        namespace = %settings.namespace,
        "starting nodejob"
    );

    let engine = Arc::new(CliEngine::new(settings.engine_binary.clone()));
    let supervisor = Supervisor::new(settings, engine);
    let handler = ToolHandler::new(supervisor, Arc::new(RealFileSystem));

    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    tokio::select! {
        res = serve(handler, input, output) => res,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("Ctrl-C received; shutting down");
            Ok(())
        }
    }
}

/// Config file settings with `--engine` / `--image` applied on top.
fn effective_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = load_or_default(args.config.as_deref())?;

    if let Some(engine) = &args.engine {
        settings = settings.with_engine_binary(engine.clone());
    }
    if let Some(image) = &args.image {
        settings = settings.with_image(image.clone());
    }

    Ok(settings)
}

/// Simple dry-run output: effective settings and the exposed tools.
fn print_dry_run(settings: &Settings) {
    println!("nodejob dry-run");
    println!("  engine.binary = {}", settings.engine_binary);
    println!("  engine.image = {}", settings.image);
    println!("  engine.workdir = {}", settings.workdir.display());
    println!("  engine.namespace = {}", settings.namespace);
    println!("  timeouts.install = {:?}", settings.install_timeout);
    println!("  timeouts.run_once = {:?}", settings.run_once_timeout);
    println!("  timeouts.control = {:?}", settings.control_timeout);
    println!();

    println!("tools ({}):", Tool::ALL.len());
    for tool in Tool::ALL {
        println!("  - {}: {}", tool.name(), tool.description());
    }

    debug!("dry-run complete (no server started)");
}
