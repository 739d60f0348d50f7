// src/main.rs

use std::process::ExitCode;

use nodejob::{cli, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("nodejob: {err:#}");
        return ExitCode::FAILURE;
    }

    match nodejob::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "nodejob stopped");
            ExitCode::FAILURE
        }
    }
}
