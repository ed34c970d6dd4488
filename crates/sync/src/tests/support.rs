use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use url::Url;

use crate::config::{NotificationAnchor, ThreadAnchor};
use crate::constants::{DEFAULT_SEEN_CAPACITY, FEEDBACK_DISMISS_AFTER, POLL_INTERVAL};
use crate::error::SyncError;
use crate::models::cursor::ThreadCursor;
use crate::models::message::{
    Message, MessageFeedResponse, MessageId, RenderedMessage, ReplyForm, SendReplyResponse,
    UserId,
};
use crate::models::notification::{
    AcknowledgeResponse, BadgeCount, NotificationFeed, NotificationItem,
};
use crate::transport::{CsrfToken, NotificationTransport, ThreadTransport};
use crate::view::{NotificationView, ThreadView};

pub const VIEWER: UserId = 12;
pub const OTHER: UserId = 3;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

pub fn message(id: MessageId, sender: UserId) -> Message {
    Message {
        message_id: Some(id),
        thread_id: Some(7),
        sender_id: sender,
        receiver_id: None,
        sender_name: Some("Dana Whitfield".to_string()),
        content: format!("message number {id}"),
        timestamp: "2024-03-08T14:05:00".to_string(),
    }
}

pub fn feed(ids: &[MessageId]) -> MessageFeedResponse {
    MessageFeedResponse {
        messages: Some(ids.iter().map(|id| message(*id, OTHER)).collect()),
    }
}

pub fn echoed(id: MessageId) -> SendReplyResponse {
    SendReplyResponse {
        success: true,
        message: Some(message(id, VIEWER)),
        error: None,
    }
}

pub fn server_error() -> SyncError {
    SyncError::Status {
        status: 500,
        url: "http://localhost:5000/".to_string(),
    }
}

pub fn thread_anchor(seed: MessageId, with_reply_form: bool) -> ThreadAnchor {
    let reply_form = with_reply_form.then(|| ReplyForm {
        action: Url::parse("http://localhost:5000/messages/reply/7").unwrap(),
        fields: vec![("csrf_token".to_string(), "form-token".to_string())],
    });
    ThreadAnchor {
        feed_url: Url::parse("http://localhost:5000/messages/thread/7/messages/feed").unwrap(),
        current_user: VIEWER,
        cursor: ThreadCursor::seeded(seed).unwrap(),
        reply_form,
        poll_interval: POLL_INTERVAL,
        feedback_dismiss: FEEDBACK_DISMISS_AFTER,
        seen_capacity: DEFAULT_SEEN_CAPACITY,
    }
}

pub fn notification_anchor(csrf_token: Option<&str>) -> NotificationAnchor {
    NotificationAnchor {
        feed_url: Url::parse("http://localhost:5000/notifications/feed").unwrap(),
        ack_url: Url::parse("http://localhost:5000/notifications/ack").unwrap(),
        csrf_token: csrf_token.and_then(CsrfToken::new),
    }
}

pub fn notification(title: &str, is_new: bool) -> NotificationItem {
    NotificationItem {
        id: Some(format!("message-{title}")),
        category: Some("message".to_string()),
        title: Some(title.to_string()),
        body: Some("Is the studio free on Friday?".to_string()),
        url: Some("/messages/thread/7".to_string()),
        icon: Some("bi-chat-dots-fill".to_string()),
        accent: Some("info".to_string()),
        time_display: Some("5m ago".to_string()),
        timestamp_iso: None,
        is_new,
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

#[derive(Default)]
struct ThreadScript {
    feeds: VecDeque<Result<MessageFeedResponse, SyncError>>,
    replies: VecDeque<Result<SendReplyResponse, SyncError>>,
    fetches: Vec<Option<MessageId>>,
    sends: Vec<String>,
    feed_gate: Option<oneshot::Receiver<()>>,
}

/// Scripted thread endpoints. Unscripted feed requests answer with no
/// messages, unscripted replies with a server error.
#[derive(Clone, Default)]
pub struct FakeThreadTransport {
    script: Arc<Mutex<ThreadScript>>,
}

impl FakeThreadTransport {
    fn script(&self) -> MutexGuard<'_, ThreadScript> {
        self.script.lock().unwrap()
    }

    pub fn push_feed(&self, feed: Result<MessageFeedResponse, SyncError>) {
        self.script().feeds.push_back(feed);
    }

    pub fn push_reply(&self, reply: Result<SendReplyResponse, SyncError>) {
        self.script().replies.push_back(reply);
    }

    /// Holds the next feed request open until the returned sender fires.
    pub fn gate_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().feed_gate = Some(rx);
        tx
    }

    pub fn fetches(&self) -> Vec<Option<MessageId>> {
        self.script().fetches.clone()
    }

    pub fn sends(&self) -> Vec<String> {
        self.script().sends.clone()
    }
}

#[async_trait]
impl ThreadTransport for FakeThreadTransport {
    async fn fetch_messages(
        &self,
        _feed_url: &Url,
        after_id: Option<MessageId>,
    ) -> Result<MessageFeedResponse, SyncError> {
        let (response, gate) = {
            let mut script = self.script();
            script.fetches.push(after_id);
            let response = script
                .feeds
                .pop_front()
                .unwrap_or_else(|| Ok(MessageFeedResponse::default()));
            (response, script.feed_gate.take())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }

    async fn send_reply(
        &self,
        _form: &ReplyForm,
        content: &str,
    ) -> Result<SendReplyResponse, SyncError> {
        let mut script = self.script();
        script.sends.push(content.to_string());
        script.replies.pop_front().unwrap_or_else(|| Err(server_error()))
    }
}

#[derive(Default)]
pub struct ThreadRecord {
    pub rendered: Vec<RenderedMessage>,
    pub cursor_writes: Vec<MessageId>,
    pub empty_state_removals: usize,
    pub scrolls: usize,
    pub feedback: Option<String>,
    pub feedback_dismissals: usize,
    pub inputs_cleared: usize,
    pub native_submissions: Vec<(ReplyForm, String)>,
}

#[derive(Clone, Default)]
pub struct RecordingThreadView {
    record: Arc<Mutex<ThreadRecord>>,
}

impl RecordingThreadView {
    pub fn record(&self) -> MutexGuard<'_, ThreadRecord> {
        self.record.lock().unwrap()
    }

    pub fn rendered_ids(&self) -> Vec<MessageId> {
        self.record()
            .rendered
            .iter()
            .map(|message| message.message_id)
            .collect()
    }
}

impl ThreadView for RecordingThreadView {
    fn remove_empty_state(&mut self) {
        self.record().empty_state_removals += 1;
    }

    fn render_message(&mut self, message: &RenderedMessage) {
        self.record().rendered.push(message.clone());
    }

    fn store_cursor(&mut self, last_message_id: MessageId) {
        self.record().cursor_writes.push(last_message_id);
    }

    fn scroll_to_bottom(&mut self) {
        self.record().scrolls += 1;
    }

    fn show_feedback(&mut self, text: &str) {
        self.record().feedback = Some(text.to_string());
    }

    fn dismiss_feedback(&mut self) {
        let mut record = self.record();
        record.feedback = None;
        record.feedback_dismissals += 1;
    }

    fn clear_input(&mut self) {
        self.record().inputs_cleared += 1;
    }

    fn submit_natively(&mut self, form: &ReplyForm, content: &str) {
        self.record()
            .native_submissions
            .push((form.clone(), content.to_string()));
    }
}

#[derive(Default)]
struct NotificationScript {
    feeds: VecDeque<Result<NotificationFeed, SyncError>>,
    acks: VecDeque<Result<AcknowledgeResponse, SyncError>>,
    feed_calls: usize,
    ack_tokens: Vec<Option<String>>,
    ack_gate: Option<oneshot::Receiver<()>>,
}

/// Scripted notification endpoints. Unscripted calls answer with an empty
/// feed and an acknowledgement without payload.
#[derive(Clone, Default)]
pub struct FakeNotificationTransport {
    script: Arc<Mutex<NotificationScript>>,
}

impl FakeNotificationTransport {
    fn script(&self) -> MutexGuard<'_, NotificationScript> {
        self.script.lock().unwrap()
    }

    pub fn push_feed(&self, feed: Result<NotificationFeed, SyncError>) {
        self.script().feeds.push_back(feed);
    }

    pub fn push_ack(&self, ack: Result<AcknowledgeResponse, SyncError>) {
        self.script().acks.push_back(ack);
    }

    pub fn gate_next_ack(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script().ack_gate = Some(rx);
        tx
    }

    pub fn feed_calls(&self) -> usize {
        self.script().feed_calls
    }

    pub fn ack_calls(&self) -> usize {
        self.script().ack_tokens.len()
    }

    pub fn ack_tokens(&self) -> Vec<Option<String>> {
        self.script().ack_tokens.clone()
    }
}

#[async_trait]
impl NotificationTransport for FakeNotificationTransport {
    async fn fetch_feed(&self, _feed_url: &Url) -> Result<NotificationFeed, SyncError> {
        let mut script = self.script();
        script.feed_calls += 1;
        script
            .feeds
            .pop_front()
            .unwrap_or_else(|| Ok(NotificationFeed::default()))
    }

    async fn acknowledge(
        &self,
        _ack_url: &Url,
        csrf_token: Option<&CsrfToken>,
    ) -> Result<AcknowledgeResponse, SyncError> {
        let (response, gate) = {
            let mut script = self.script();
            script
                .ack_tokens
                .push(csrf_token.map(|token| token.as_str().to_string()));
            let response = script
                .acks
                .pop_front()
                .unwrap_or_else(|| Ok(AcknowledgeResponse::default()));
            (response, script.ack_gate.take())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        response
    }
}

#[derive(Default)]
pub struct NotificationRecord {
    pub markup: Option<String>,
    pub titles: Vec<String>,
    pub empty_shown: usize,
    pub badge: Option<BadgeCount>,
    pub badge_updates: usize,
}

#[derive(Clone, Default)]
pub struct RecordingNotificationView {
    record: Arc<Mutex<NotificationRecord>>,
}

impl RecordingNotificationView {
    pub fn record(&self) -> MutexGuard<'_, NotificationRecord> {
        self.record.lock().unwrap()
    }
}

impl NotificationView for RecordingNotificationView {
    fn render_items(&mut self, items: &[NotificationItem], markup: &str) {
        let mut record = self.record();
        record.titles = items
            .iter()
            .map(|item| item.title.clone().unwrap_or_default())
            .collect();
        record.markup = Some(markup.to_string());
    }

    fn show_empty(&mut self) {
        let mut record = self.record();
        record.markup = None;
        record.empty_shown += 1;
    }

    fn set_badge(&mut self, badge: Option<BadgeCount>) {
        let mut record = self.record();
        record.badge = badge;
        record.badge_updates += 1;
    }
}
