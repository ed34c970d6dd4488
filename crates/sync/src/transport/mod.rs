use async_trait::async_trait;
use url::Url;

use crate::error::SyncError;
use crate::models::message::{MessageFeedResponse, MessageId, ReplyForm, SendReplyResponse};
use crate::models::notification::{AcknowledgeResponse, NotificationFeed};

pub mod http;

pub use http::{HttpConfig, HttpTransport, NativeSubmission};

/// Anti-forgery token taken from the page metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// An empty token is the same as no token at all.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        (!value.is_empty()).then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Read and write endpoints of a conversation thread.
///
/// Every method asks for a json answer; a non-2xx status or a body that isn't
/// json is reported as an error.
#[async_trait]
pub trait ThreadTransport: Send + Sync {
    async fn fetch_messages(
        &self,
        feed_url: &Url,
        after_id: Option<MessageId>,
    ) -> Result<MessageFeedResponse, SyncError>;

    async fn send_reply(
        &self,
        form: &ReplyForm,
        content: &str,
    ) -> Result<SendReplyResponse, SyncError>;
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn fetch_feed(&self, feed_url: &Url) -> Result<NotificationFeed, SyncError>;

    async fn acknowledge(
        &self,
        ack_url: &Url,
        csrf_token: Option<&CsrfToken>,
    ) -> Result<AcknowledgeResponse, SyncError>;
}

/// Sets `after_id` on a feed url, replacing any value already present.
pub fn feed_url_after(feed_url: &Url, after_id: Option<MessageId>) -> Url {
    let mut url = feed_url.clone();
    let retained: Vec<(String, String)> = feed_url
        .query_pairs()
        .filter(|(name, _)| name != "after_id")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);
    if retained.is_empty() && after_id.is_none() {
        return url;
    }
    {
        let mut query = url.query_pairs_mut();
        query.extend_pairs(retained);
        if let Some(after_id) = after_id {
            query.append_pair("after_id", &after_id.to_string());
        }
    }
    url
}
