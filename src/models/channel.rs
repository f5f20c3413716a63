use super::days_since;
use crate::config::WhitelistRules;
use crate::slack::{Channel, LatestMessage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

bitflags::bitflags! {
    /// Which whitelist rules a channel matched
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WhitelistReasons: u8 {
        const KEEP_MARKER  = 1 << 0;
        const NAME_PATTERN = 1 << 1;
        const SHARED       = 1 << 2;
    }
}

impl WhitelistReasons {
    pub fn evaluate(rules: &WhitelistRules, channel: &Channel) -> Self {
        let mut reasons = WhitelistReasons::empty();

        if !rules.keep_marker.is_empty() && channel.purpose.value.contains(&rules.keep_marker) {
            reasons |= WhitelistReasons::KEEP_MARKER;
        }
        if rules
            .name_patterns
            .iter()
            .any(|pattern| channel.name.contains(pattern.as_str()))
        {
            reasons |= WhitelistReasons::NAME_PATTERN;
        }
        if channel.is_shared {
            reasons |= WhitelistReasons::SHARED;
        }

        reasons
    }
}

/// Point-in-time view of one public channel for the current run
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub creator_name: String,
    pub created_at: i64,
    pub member_count: i64,
    pub is_shared: bool,
    /// Latest qualifying message, or creation time when there is none
    pub last_activity_at: i64,
    pub last_message_at: Option<i64>,
    pub last_actor_id: Option<String>,
    pub last_actor_name: String,
    pub last_message_text: String,
    pub elapsed_days: i64,
    pub whitelist: WhitelistReasons,
}

impl ChannelSnapshot {
    pub fn build(
        channel: &Channel,
        user_names: &HashMap<String, String>,
        latest: Option<&LatestMessage>,
        rules: &WhitelistRules,
        now: DateTime<Utc>,
    ) -> Self {
        let name_of = |user_id: &str| user_names.get(user_id).cloned().unwrap_or_default();

        let last_activity_at = latest.map(|message| message.ts).unwrap_or(channel.created);
        let last_actor_id = latest.and_then(|message| message.user_id.clone());
        let last_actor_name = last_actor_id.as_deref().map(name_of).unwrap_or_default();

        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            creator_id: channel.creator.clone(),
            creator_name: name_of(&channel.creator),
            created_at: channel.created,
            member_count: channel.num_members,
            is_shared: channel.is_shared,
            last_activity_at,
            last_message_at: latest.map(|message| message.ts),
            last_actor_id,
            last_actor_name,
            last_message_text: latest.map(|message| message.text.clone()).unwrap_or_default(),
            elapsed_days: days_since(now, last_activity_at),
            whitelist: WhitelistReasons::evaluate(rules, channel),
        }
    }

    pub fn is_whitelisted(&self) -> bool {
        !self.whitelist.is_empty()
    }
}
