//! `aggregate` subcommand

use clap::Args;
use reaction_common::AppError;
use reaction_service::{AggregationRequest, AggregatorService, StopHandle};
use tracing::{info, warn};

use crate::output;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Only count messages newer than this many days (default from config)
    #[arg(long)]
    pub days: Option<u32>,

    /// Re-scan channels already marked completed
    #[arg(long)]
    pub force: bool,

    /// Concurrent channel workers (default from config)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Channels to process; defaults to every non-archived channel in the store
    pub channels: Vec<String>,
}

impl AggregateArgs {
    /// Merge arguments over configuration defaults
    pub fn to_request(&self, state: &AppState) -> AggregationRequest {
        let config = state.config();
        let mut request =
            AggregationRequest::from_config(&config.aggregation, config.slack.strict_scopes)
                .with_channels(self.channels.clone());

        if let Some(days) = self.days {
            request.window_days = days;
        }
        if let Some(workers) = self.workers {
            request.max_workers = workers;
        }
        request.force_rescan |= self.force;
        request
    }
}

/// Ctrl-C asks workers to stop after the page in flight
fn install_stop_handler(stop: StopHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after current page");
            stop.request_stop();
        }
    });
}

pub async fn run(state: &AppState, args: AggregateArgs) -> Result<i32, AppError> {
    let request = args.to_request(state);
    let stop = StopHandle::new();
    install_stop_handler(stop.clone());

    let report = AggregatorService::new(state.service_context())
        .aggregate(&request, &stop)
        .await?;

    if args.json {
        let out = serde_json::to_string_pretty(&report).map_err(AppError::internal)?;
        println!("{out}");
    } else {
        print!("{}", output::render_aggregate(&report));
    }

    info!(run_id = %report.run_id, outcome = ?report.outcome, "Done");
    Ok(report.outcome.exit_code())
}
