use serde::{Deserialize, Serialize};

/// Subtypes that only record membership changes and never count as activity
const MEMBERSHIP_SUBTYPES: &[&str] = &["channel_join", "channel_leave"];

/// A channel record from `conversations.list`
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_channel: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub num_members: i64,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub purpose: Purpose,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Purpose {
    #[serde(default)]
    pub value: String,
}

/// A member record from `users.list`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A message from `conversations.history`, most recent first
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl HistoryMessage {
    /// A plain message that is not a join/leave notice
    pub fn is_activity(&self) -> bool {
        self.message_type == "message"
            && !self
                .subtype
                .as_deref()
                .is_some_and(|subtype| MEMBERSHIP_SUBTYPES.contains(&subtype))
    }

    /// Seconds part of the Slack `ts` ("1512085950.000216" -> 1512085950)
    pub fn epoch_seconds(&self) -> Option<i64> {
        let seconds = self.ts.split('.').next()?;
        seconds.trim().parse().ok()
    }
}

/// Latest message that counts as channel activity
#[derive(Debug, Clone, PartialEq)]
pub struct LatestMessage {
    pub ts: i64,
    pub user_id: Option<String>,
    pub text: String,
}

/// Pick the first qualifying message out of a most-recent-first history page.
/// Messages whose `ts` can't be read are passed over.
pub fn latest_activity(messages: &[HistoryMessage]) -> Option<LatestMessage> {
    messages
        .iter()
        .filter(|message| message.is_activity())
        .find_map(|message| {
            message.epoch_seconds().map(|ts| LatestMessage {
                ts,
                user_id: message.user.clone(),
                text: message.text.clone(),
            })
        })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: String,
}

/// One page of a cursor-paginated Slack list method
pub trait Page {
    type Item;

    fn error(&self) -> Option<String>;
    fn next_cursor(&self) -> Option<String>;
    fn into_items(self) -> Vec<Self::Item>;
}

fn page_cursor(metadata: &Option<ResponseMetadata>) -> Option<String> {
    metadata
        .as_ref()
        .map(|metadata| metadata.next_cursor.trim().to_string())
        .filter(|cursor| !cursor.is_empty())
}

fn page_error(ok: bool, error: &Option<String>) -> Option<String> {
    if ok {
        None
    } else {
        Some(error.clone().unwrap_or_else(|| "unknown".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationsListResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Page for ConversationsListResponse {
    type Item = Channel;

    fn error(&self) -> Option<String> {
        page_error(self.ok, &self.error)
    }

    fn next_cursor(&self) -> Option<String> {
        page_cursor(&self.response_metadata)
    }

    fn into_items(self) -> Vec<Channel> {
        self.channels
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl Page for UsersListResponse {
    type Item = User;

    fn error(&self) -> Option<String> {
        page_error(self.ok, &self.error)
    }

    fn next_cursor(&self) -> Option<String> {
        page_cursor(&self.response_metadata)
    }

    fn into_items(self) -> Vec<User> {
        self.members
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationsHistoryResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// Payload for `conversations.archive`
#[derive(Debug, Serialize)]
pub struct ArchiveRequest {
    pub channel: String,
}

/// Payload for `conversations.invite`
#[derive(Debug, Serialize)]
pub struct InviteRequest {
    pub channel: String,
    pub users: String,
}

/// Payload for posting a message to Slack
#[derive(Debug, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    pub link_names: bool,
}
