//! `status` subcommand

use clap::Args;
use reaction_common::AppError;
use reaction_service::StatusService;

use crate::output;
use crate::state::AppState;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of emoji in the top list
    #[arg(long, default_value_t = 10)]
    pub top: u32,

    /// Mark workspace custom emoji (one extra API call)
    #[arg(long)]
    pub custom_emoji: bool,
}

pub async fn run(state: &AppState, args: StatusArgs) -> Result<i32, AppError> {
    let report = StatusService::new(state.service_context())
        .report(args.top, args.custom_emoji)
        .await?;

    if args.json {
        let out = serde_json::to_string_pretty(&report).map_err(AppError::internal)?;
        println!("{out}");
    } else {
        print!("{}", output::render_status(&report));
    }
    Ok(reaction_common::EXIT_OK)
}
