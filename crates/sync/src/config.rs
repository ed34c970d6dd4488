use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_SEEN_CAPACITY, FEEDBACK_DISMISS_AFTER, POLL_INTERVAL};
use crate::error::{SyncError, ValidationError};
use crate::models::cursor::ThreadCursor;
use crate::models::message::{MessageId, ReplyForm, UserId};
use crate::transport::CsrfToken;

/// The anchors a page carries. Each engine is activated only when its
/// anchor is present.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub thread: Option<ThreadConfig>,
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreadConfig {
    pub feed_url: String,
    pub current_user: UserId,
    #[serde(default)]
    pub last_message_id: MessageId,
    #[serde(default)]
    pub reply: Option<ReplyFormConfig>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub feedback_dismiss_ms: Option<u64>,
    #[serde(default)]
    pub seen_capacity: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplyFormConfig {
    pub action: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub ack_url: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Everything a [`crate::ThreadSync`] needs to know about its thread.
#[derive(Clone, Debug)]
pub struct ThreadAnchor {
    pub feed_url: Url,
    pub current_user: UserId,
    pub cursor: ThreadCursor,
    pub reply_form: Option<ReplyForm>,
    pub poll_interval: Duration,
    pub feedback_dismiss: Duration,
    pub seen_capacity: usize,
}

#[derive(Clone, Debug)]
pub struct NotificationAnchor {
    pub feed_url: Url,
    pub ack_url: Url,
    pub csrf_token: Option<CsrfToken>,
}

pub fn resolve_url(base: &Url, value: &str) -> Result<Url, SyncError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidInput {
            value: value.to_string(),
            reason: "url cannot be empty".to_string(),
        }
        .into());
    }
    base.join(value).map_err(|source| SyncError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

impl ThreadConfig {
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(POLL_INTERVAL)
    }

    pub fn feedback_dismiss(&self) -> Duration {
        self.feedback_dismiss_ms
            .map(Duration::from_millis)
            .unwrap_or(FEEDBACK_DISMISS_AFTER)
    }

    pub fn resolve(&self, base: &Url) -> Result<ThreadAnchor, SyncError> {
        let poll_interval = self.poll_interval();
        if poll_interval.is_zero() {
            return Err(ValidationError::InvalidInput {
                value: "0".to_string(),
                reason: "poll interval should be > 0".to_string(),
            }
            .into());
        }
        let reply_form = self
            .reply
            .as_ref()
            .map(|reply| -> Result<ReplyForm, SyncError> {
                Ok(ReplyForm {
                    action: resolve_url(base, &reply.action)?,
                    fields: reply
                        .fields
                        .iter()
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect(),
                })
            })
            .transpose()?;
        Ok(ThreadAnchor {
            feed_url: resolve_url(base, &self.feed_url)?,
            current_user: self.current_user,
            cursor: ThreadCursor::seeded(self.last_message_id)?,
            reply_form,
            poll_interval,
            feedback_dismiss: self.feedback_dismiss(),
            seen_capacity: self.seen_capacity.unwrap_or(DEFAULT_SEEN_CAPACITY).max(1),
        })
    }
}

impl NotificationConfig {
    /// `Ok(None)` when either endpoint is missing, the menu then stays inert.
    pub fn resolve(&self, base: &Url) -> Result<Option<NotificationAnchor>, SyncError> {
        let feed_url = self.feed_url.as_deref().filter(|url| !url.is_empty());
        let ack_url = self.ack_url.as_deref().filter(|url| !url.is_empty());
        let (Some(feed_url), Some(ack_url)) = (feed_url, ack_url) else {
            return Ok(None);
        };
        Ok(Some(NotificationAnchor {
            feed_url: resolve_url(base, feed_url)?,
            ack_url: resolve_url(base, ack_url)?,
            csrf_token: self.csrf_token.clone().and_then(CsrfToken::new),
        }))
    }
}
