use serde::{Deserialize, Serialize};
use strum_macros::Display;
use url::Url;

use crate::constants::CONTENT_FIELD;
use crate::markup::format_timestamp;
use crate::models::null_as_default;

pub type MessageId = i64;
pub type UserId = i64;
pub type ThreadId = i64;

const SELF_AUTHOR_LABEL: &str = "You";
const FALLBACK_AUTHOR_LABEL: &str = "Participant";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender_id: UserId,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
}

impl Message {
    /// Server ids start at 1, a missing or zero id can't be placed in a thread.
    pub fn usable_id(&self) -> Option<MessageId> {
        self.message_id.filter(|id| *id != 0)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageFeedResponse {
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SendReplyResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

/// A message prepared for display in a thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedMessage {
    pub message_id: MessageId,
    pub direction: Direction,
    pub author: String,
    pub time_display: String,
    pub content: String,
}

impl RenderedMessage {
    pub fn new(message_id: MessageId, message: &Message, viewer: UserId) -> Self {
        let direction = if message.sender_id == viewer {
            Direction::Sent
        } else {
            Direction::Received
        };
        let author = match direction {
            Direction::Sent => SELF_AUTHOR_LABEL.to_string(),
            Direction::Received => message
                .sender_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_AUTHOR_LABEL.to_string()),
        };
        Self {
            message_id,
            direction,
            author,
            time_display: format_timestamp(&message.timestamp),
            content: message.content.clone(),
        }
    }
}

/// The reply form of a thread page: where it posts and the hidden fields it
/// carries next to the typed content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyForm {
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

impl ReplyForm {
    pub fn with_content(&self, content: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .fields
            .iter()
            .filter(|(name, _)| name != CONTENT_FIELD)
            .cloned()
            .collect();
        fields.push((CONTENT_FIELD.to_string(), content.to_string()));
        fields
    }
}
