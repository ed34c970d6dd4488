use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::constants::CSRF_HEADER;
use crate::error::{SyncError, ValidationError};
use crate::models::message::{MessageFeedResponse, MessageId, ReplyForm, SendReplyResponse};
use crate::models::notification::{AcknowledgeResponse, NotificationFeed};
use crate::transport::{feed_url_after, CsrfToken, NotificationTransport, ThreadTransport};

const JSON_CONTENT: &str = "application/json";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    base_url: String,
    #[serde(default)]
    cookie: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl HttpConfig {
    const USER_AGENT_FALLBACK: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    pub fn development(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            cookie: None,
            user_agent: None,
            timeout_ms: None,
        }
    }

    pub fn base_url(&self) -> Result<Url, SyncError> {
        Url::parse(&self.base_url).map_err(|source| SyncError::InvalidUrl {
            value: self.base_url.clone(),
            source,
        })
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or(Self::USER_AGENT_FALLBACK)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Where a native form submission ended up after redirects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeSubmission {
    pub status: u16,
    pub location: Url,
}

/// Talks to the portal over HTTP, carrying a pre-established session cookie.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn connect(config: &HttpConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.cookie.as_deref() {
            let value = HeaderValue::from_str(cookie).map_err(|_| {
                ValidationError::InvalidInput {
                    value: "<cookie>".to_string(),
                    reason: "cookie contains characters not allowed in a header".to_string(),
                }
            })?;
            headers.insert(COOKIE, value);
        }
        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Posts the form the way a browser would without scripting, following
    /// redirects to the page the server lands on.
    #[instrument(skip_all, fields(action = %form.action))]
    pub async fn submit_native(
        &self,
        form: &ReplyForm,
        content: &str,
    ) -> Result<NativeSubmission, SyncError> {
        let response = self
            .client
            .post(form.action.clone())
            .form(&form.with_content(content))
            .send()
            .await?;
        let submission = NativeSubmission {
            status: response.status().as_u16(),
            location: response.url().clone(),
        };
        debug!("native submission landed on {}", submission.location);
        Ok(submission)
    }
}

async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SyncError> {
    let response = request.header(ACCEPT, JSON_CONTENT).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl ThreadTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn fetch_messages(
        &self,
        feed_url: &Url,
        after_id: Option<MessageId>,
    ) -> Result<MessageFeedResponse, SyncError> {
        fetch_json(self.client.get(feed_url_after(feed_url, after_id))).await
    }

    #[instrument(skip(self, content), fields(action = %form.action))]
    async fn send_reply(
        &self,
        form: &ReplyForm,
        content: &str,
    ) -> Result<SendReplyResponse, SyncError> {
        fetch_json(
            self.client
                .post(form.action.clone())
                .form(&form.with_content(content)),
        )
        .await
    }
}

#[async_trait]
impl NotificationTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn fetch_feed(&self, feed_url: &Url) -> Result<NotificationFeed, SyncError> {
        fetch_json(self.client.get(feed_url.clone())).await
    }

    #[instrument(skip(self, csrf_token))]
    async fn acknowledge(
        &self,
        ack_url: &Url,
        csrf_token: Option<&CsrfToken>,
    ) -> Result<AcknowledgeResponse, SyncError> {
        let mut request = self.client.post(ack_url.clone());
        if let Some(token) = csrf_token {
            request = request.header(CSRF_HEADER, token.as_str());
        }
        fetch_json(request).await
    }
}
