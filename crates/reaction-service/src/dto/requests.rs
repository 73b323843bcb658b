//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use reaction_common::AggregationConfig;
use reaction_core::{Channel, ChannelId, ChannelVisibility};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Aggregation Requests
// ============================================================================

/// One aggregation run
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AggregationRequest {
    /// Channels to process; empty means every non-archived channel in the store
    #[serde(default)]
    pub channels: Vec<String>,

    #[validate(range(min = 1, max = 3650, message = "window_days must be 1-3650"))]
    pub window_days: u32,

    #[validate(range(min = 1, max = 64, message = "max_workers must be 1-64"))]
    pub max_workers: usize,

    /// Re-scan channels already marked completed
    #[serde(default)]
    pub force_rescan: bool,

    /// Abort before ingesting when required scopes are missing
    #[serde(default = "default_true")]
    pub strict_scopes: bool,

    /// Age after which another run's claim counts as abandoned
    ///
    /// A run renews its own claims every third of this while walking a channel.
    pub lease_secs: u64,
}

fn default_true() -> bool {
    true
}

impl AggregationRequest {
    /// Request built from configuration defaults
    pub fn from_config(config: &AggregationConfig, strict_scopes: bool) -> Self {
        Self {
            channels: Vec::new(),
            window_days: config.window_days,
            max_workers: config.max_workers,
            force_rescan: config.force_rescan,
            strict_scopes,
            lease_secs: config.lease_secs,
        }
    }

    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| ChannelId::new(c.trim())).collect()
    }

    pub fn lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.lease_secs).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// Channel Requests
// ============================================================================

/// Seed or refresh one channel row
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddChannelRequest {
    #[validate(length(min = 1, max = 32, message = "Channel ID must be 1-32 characters"))]
    pub id: String,

    #[validate(length(min = 1, max = 80, message = "Channel name must be 1-80 characters"))]
    pub name: String,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub archived: bool,
}

impl AddChannelRequest {
    /// Channel entity for this request
    pub fn to_channel(&self) -> Channel {
        let channel = Channel::new(
            ChannelId::new(self.id.trim()),
            self.name.trim(),
            ChannelVisibility::from(self.private),
        );
        if self.archived {
            channel.archived()
        } else {
            channel
        }
    }
}
