//! `reaction-aggregator` entry point
//!
//! ```bash
//! reaction-aggregator aggregate --days 30
//! reaction-aggregator status --json
//! ```
//!
//! Configuration is loaded from `.env` and environment variables.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use reaction_cli::{dispatch, state::create_app_state, Cli};
use reaction_common::{
    try_init_tracing_with_config, AppConfig, AppError, ErrorResponse, TracingConfig, EXIT_ABORTED,
};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json_output();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, json);
            EXIT_ABORTED
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    let mut tracing_config = TracingConfig::for_environment(config.app.env);
    if cli.verbose {
        tracing_config.level = tracing::Level::DEBUG;
    }
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let state = create_app_state(config).await?;
    let code = dispatch(&state, cli.command).await?;
    state.close().await;
    Ok(code)
}

fn report_error(err: &anyhow::Error, json: bool) {
    error!(error = %format!("{err:#}"), "Command failed");

    if json {
        let body = match err.downcast_ref::<AppError>() {
            Some(app) => ErrorResponse::from(app),
            None => ErrorResponse {
                code: "INTERNAL_ERROR".to_string(),
                message: format!("{err:#}"),
                details: None,
            },
        };
        match serde_json::to_string_pretty(&body) {
            Ok(out) => println!("{out}"),
            Err(_) => eprintln!("error: {err:#}"),
        }
    } else {
        eprintln!("error: {err:#}");
    }
}
