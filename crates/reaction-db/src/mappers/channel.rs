//! Channel entity <-> model mapper

use reaction_core::entities::{Channel, ChannelVisibility};
use reaction_core::value_objects::ChannelId;

use crate::models::ChannelModel;

/// Convert ChannelModel to Channel entity
impl From<ChannelModel> for Channel {
    fn from(model: ChannelModel) -> Self {
        Channel {
            id: ChannelId::new(model.channel_id),
            name: model.name,
            visibility: ChannelVisibility::from(model.is_private),
            is_archived: model.is_archived,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Convert Channel entity reference to values for database insertion
pub struct ChannelInsert<'a> {
    pub channel_id: &'a str,
    pub name: &'a str,
    pub is_private: bool,
    pub is_archived: bool,
}

impl<'a> ChannelInsert<'a> {
    pub fn new(channel: &'a Channel) -> Self {
        Self {
            channel_id: channel.id.as_str(),
            name: &channel.name,
            is_private: channel.visibility.is_private(),
            is_archived: channel.is_archived,
        }
    }
}
