use super::types::{
    ArchiveRequest, Channel, ConversationsHistoryResponse, ConversationsListResponse, HistoryMessage,
    InviteRequest, Page, PostMessageRequest, UsersListResponse,
};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// How many messages of history are scanned for the latest activity
pub const HISTORY_SCAN_LIMIT: &str = "200";

const LIST_PAGE_LIMIT: &str = "999";

/// Attempts per read call, counting the first one
const MAX_READ_ATTEMPTS: usize = 4;
const RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Name and icon used when posting the digest
#[derive(Debug, Clone, Default)]
pub struct BotIdentity {
    pub name: Option<String>,
    pub icon_emoji: Option<String>,
}

#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    api_base: String,
    user_token: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(api_base: String, user_token: String, bot_token: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            user_token,
            bot_token,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Follow `response_metadata.next_cursor` until Slack returns an empty one
    async fn fetch_all_pages<P>(&self, method: &str, params: &[(&str, &str)]) -> Result<Vec<P::Item>>
    where
        P: Page + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = params.to_vec();
            if let Some(ref cursor) = cursor {
                query.push(("cursor", cursor.as_str()));
            }

            let page: P = self.get_json(method, &query).await?;

            if let Some(error) = page.error() {
                anyhow::bail!("Slack API error from {}: {}", method, error);
            }

            cursor = page.next_cursor();
            items.extend(page.into_items());

            if cursor.is_none() {
                break;
            }
        }

        Ok(items)
    }

    /// All unarchived public channels
    pub async fn list_public_channels(&self) -> Result<Vec<Channel>> {
        self.fetch_all_pages::<ConversationsListResponse>(
            "conversations.list",
            &[
                ("exclude_archived", "true"),
                ("types", "public_channel"),
                ("limit", LIST_PAGE_LIMIT),
            ],
        )
        .await
    }

    /// Map of user id to user name for the whole workspace
    pub async fn list_user_names(&self) -> Result<HashMap<String, String>> {
        let users = self
            .fetch_all_pages::<UsersListResponse>("users.list", &[("limit", LIST_PAGE_LIMIT)])
            .await?;

        Ok(users.into_iter().map(|user| (user.id, user.name)).collect())
    }

    /// Latest messages of a channel, most recent first
    pub async fn channel_history(&self, channel_id: &str) -> Result<Vec<HistoryMessage>> {
        let response: ConversationsHistoryResponse = self
            .get_json(
                "conversations.history",
                &[("channel", channel_id), ("limit", HISTORY_SCAN_LIMIT)],
            )
            .await?;

        if !response.ok {
            anyhow::bail!(
                "Slack API error: {}",
                response.error.unwrap_or_else(|| "unknown".to_string())
            );
        }

        Ok(response.messages)
    }

    /// Invite a user into a channel
    pub async fn invite_user(&self, channel_id: &str, user_id: &str) -> Result<()> {
        let payload = InviteRequest {
            channel: channel_id.to_string(),
            users: user_id.to_string(),
        };
        self.post_json("conversations.invite", &self.user_token, &payload).await
    }

    /// Archive a channel as the bot
    pub async fn archive_channel(&self, channel_id: &str) -> Result<()> {
        let payload = ArchiveRequest {
            channel: channel_id.to_string(),
        };
        self.post_json("conversations.archive", &self.bot_token, &payload).await
    }

    /// Post a message to a channel as the bot
    pub async fn post_message(&self, channel: &str, text: &str, identity: &BotIdentity) -> Result<()> {
        let payload = PostMessageRequest {
            channel: channel.to_string(),
            text: text.to_string(),
            username: identity.name.clone(),
            icon_emoji: identity.icon_emoji.clone(),
            link_names: true,
        };
        self.post_json("chat.postMessage", &self.bot_token, &payload).await
    }

    /// GET a read method with the user token. Rate limits and server errors
    /// are retried, waiting for `Retry-After` when Slack sends one.
    async fn get_json<T: DeserializeOwned>(&self, method: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut attempt = 0_usize;
        loop {
            attempt += 1;
            let response = self
                .client
                .get(self.url(method))
                .header("Authorization", format!("Bearer {}", self.user_token))
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to call {}", method))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json()
                    .await
                    .with_context(|| format!("Malformed {} response", method));
            }

            if attempt < MAX_READ_ATTEMPTS && is_retryable_status(status) {
                let delay = retry_delay(attempt, retry_after(response.headers()));
                tracing::warn!(
                    "{} returned {}, retrying in {}s (attempt {}/{})",
                    method,
                    status.as_u16(),
                    delay.as_secs_f32(),
                    attempt,
                    MAX_READ_ATTEMPTS
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            anyhow::bail!("{} failed with status {}", method, status.as_u16());
        }
    }

    async fn post_json<T: Serialize>(&self, method: &str, token: &str, payload: &T) -> Result<()> {
        let response = self
            .client
            .post(self.url(method))
            .header("Authorization", format!("Bearer {}", token))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", method))?;

        let json: serde_json::Value = response.json().await?;

        if !json["ok"].as_bool().unwrap_or(false) {
            anyhow::bail!("Slack API error: {}", json["error"].as_str().unwrap_or("unknown"));
        }

        Ok(())
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Seconds to wait from a `Retry-After` header
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// `Retry-After` when given, otherwise doubling from one second
fn retry_delay(attempt: usize, retry_after: Option<Duration>) -> Duration {
    if let Some(delay) = retry_after {
        return delay;
    }
    let exponent = attempt.saturating_sub(1).min(6) as u32;
    Duration::from_millis(RETRY_BASE_DELAY_MS.saturating_mul(2_u64.pow(exponent)))
}
