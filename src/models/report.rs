use super::channel::ChannelSnapshot;
use super::format_timestamp;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row layout of the `public_channels` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ChannelReportRow {
    pub channel_name: String,
    pub channel_id: String,
    pub creator_name: String,
    pub created_date: String,
    pub member_count: i64,
    pub is_shared: bool,
    pub last_user_name: String,
    pub last_message_text: String,
    pub last_message_date: String,
    pub elapsed_days: i64,
    pub is_whitelist: bool,
}

impl ChannelReportRow {
    pub fn from_snapshot(snapshot: &ChannelSnapshot, offset: &FixedOffset) -> Self {
        Self {
            channel_name: snapshot.name.clone(),
            channel_id: snapshot.id.clone(),
            creator_name: snapshot.creator_name.clone(),
            created_date: format_timestamp(snapshot.created_at, offset),
            member_count: snapshot.member_count,
            is_shared: snapshot.is_shared,
            last_user_name: snapshot.last_actor_name.clone(),
            last_message_text: snapshot.last_message_text.clone(),
            last_message_date: snapshot
                .last_message_at
                .map(|ts| format_timestamp(ts, offset))
                .unwrap_or_default(),
            elapsed_days: snapshot.elapsed_days,
            is_whitelist: snapshot.is_whitelisted(),
        }
    }
}
