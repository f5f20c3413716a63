use crate::models::{StoredWarningRow, WarningRow};
use crate::slack::SlackClient;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

/// Remote actions needed to archive a channel
#[async_trait]
pub trait ChannelActions {
    /// Make sure the archiving bot is a member of the channel
    async fn invite_bot(&self, channel_id: &str) -> Result<()>;

    async fn archive(&self, channel_id: &str) -> Result<()>;
}

pub struct SlackChannelActions<'a> {
    client: &'a SlackClient,
    bot_user_id: &'a str,
}

impl<'a> SlackChannelActions<'a> {
    pub fn new(client: &'a SlackClient, bot_user_id: &'a str) -> Self {
        Self { client, bot_user_id }
    }
}

#[async_trait]
impl ChannelActions for SlackChannelActions<'_> {
    async fn invite_bot(&self, channel_id: &str) -> Result<()> {
        self.client.invite_user(channel_id, self.bot_user_id).await
    }

    async fn archive(&self, channel_id: &str) -> Result<()> {
        self.client.archive_channel(channel_id).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveOutcome {
    pub archived: Vec<WarningRow>,
    pub failed: Vec<WarningRow>,
}

/// Invite the bot, then archive, for every candidate. Nothing is retried;
/// a failed invite is logged and the archive is still attempted.
pub async fn archive_channels<A>(actions: &A, candidates: &[WarningRow]) -> ArchiveOutcome
where
    A: ChannelActions + Sync,
{
    let mut outcome = ArchiveOutcome::default();

    for candidate in candidates {
        match actions.invite_bot(&candidate.channel_id).await {
            Ok(()) => tracing::debug!("[#{}] bot invited", candidate.channel_name),
            // already_in_channel also lands here
            Err(e) => tracing::warn!("[#{}] invite failed: {}", candidate.channel_name, e),
        }

        match actions.archive(&candidate.channel_id).await {
            Ok(()) => {
                tracing::info!("[#{}] archived", candidate.channel_name);
                outcome.archived.push(candidate.clone());
            }
            Err(e) => {
                tracing::warn!("[#{}] archive failed: {}", candidate.channel_name, e);
                outcome.failed.push(candidate.clone());
            }
        }
    }

    outcome
}

/// Warning rows to store for the next run: channels archived by this run
/// drop out, failed archives stay with their original `listed_at`
pub fn persisted_warnings(warnings: &[WarningRow], outcome: &ArchiveOutcome) -> Vec<StoredWarningRow> {
    let archived_ids: HashSet<&str> = outcome
        .archived
        .iter()
        .map(|row| row.channel_id.as_str())
        .collect();

    warnings
        .iter()
        .filter(|row| !archived_ids.contains(row.channel_id.as_str()))
        .map(StoredWarningRow::from)
        .collect()
}
