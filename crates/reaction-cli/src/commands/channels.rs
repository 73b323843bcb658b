//! `channels` subcommands

use clap::Subcommand;
use reaction_common::{AppError, EXIT_OK};
use reaction_service::{AddChannelRequest, ChannelService};

use crate::state::AppState;

#[derive(Subcommand, Debug)]
pub enum ChannelsCommand {
    /// Add or update a channel
    Add {
        /// Platform channel ID
        id: String,
        /// Display name
        name: String,
        #[arg(long)]
        private: bool,
        #[arg(long)]
        archived: bool,
    },

    /// List known channels
    List,
}

pub async fn run(state: &AppState, command: ChannelsCommand) -> Result<i32, AppError> {
    let service = ChannelService::new(state.service_context());

    match command {
        ChannelsCommand::Add {
            id,
            name,
            private,
            archived,
        } => {
            let channel = service
                .add_channel(&AddChannelRequest {
                    id,
                    name,
                    private,
                    archived,
                })
                .await?;
            println!("saved {} ({})", channel.id, channel.name);
        }
        ChannelsCommand::List => {
            for channel in service.list_channels().await? {
                let mut flags = Vec::new();
                if channel.visibility.is_private() {
                    flags.push("private");
                }
                if channel.is_archived {
                    flags.push("archived");
                }
                println!("{}\t{}\t{}", channel.id, channel.name, flags.join(","));
            }
        }
    }
    Ok(EXIT_OK)
}
