//! # reaction-cli
//!
//! Argument parsing, application wiring and text/JSON rendering for the
//! `reaction-aggregator` binary. Pipeline logic lives in `reaction-service`.

pub mod commands;
pub mod output;
pub mod state;

use clap::{Parser, Subcommand};
use reaction_common::AppError;

use crate::state::AppState;

/// Emoji reaction aggregation over chat channel history
#[derive(Parser, Debug)]
#[command(name = "reaction-aggregator", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Whether the chosen command asked for JSON output
    pub fn json_output(&self) -> bool {
        match &self.command {
            Command::Aggregate(args) => args.json,
            Command::Status(args) => args.json,
            Command::Channels { .. } => false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk channel history and count reactions
    Aggregate(commands::aggregate::AggregateArgs),

    /// Show per-channel progress and the most used emoji
    Status(commands::status::StatusArgs),

    /// Manage the channel list the aggregator works from
    Channels {
        #[command(subcommand)]
        command: commands::channels::ChannelsCommand,
    },
}

/// Run a parsed command; returns the process exit code
pub async fn dispatch(state: &AppState, command: Command) -> Result<i32, AppError> {
    match command {
        Command::Aggregate(args) => commands::aggregate::run(state, args).await,
        Command::Status(args) => commands::status::run(state, args).await,
        Command::Channels { command } => commands::channels::run(state, command).await,
    }
}
