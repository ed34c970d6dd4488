//! Message-thread synchronization: fixed-interval polling of the thread feed
//! merged with optimistic echoes of the viewer's own replies.

use std::sync::Arc;
use std::time::Duration;

use strum_macros::Display;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ThreadAnchor;
use crate::constants::EMPTY_REPLY_WARNING;
use crate::error::SyncError;
use crate::models::cursor::ThreadCursor;
use crate::models::message::{
    Message, MessageId, RenderedMessage, ReplyForm, SendReplyResponse, UserId,
};
use crate::transport::ThreadTransport;
use crate::view::ThreadView;

pub mod seen;

use seen::SeenIds;

/// Whether replies still go through the json endpoint. The transition to
/// `Degraded` is one-way.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncMode {
    Enhanced,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing but whitespace was typed, the viewer got a warning.
    Empty,
    /// The thread has no reply form to post to.
    Unavailable,
    /// The server stored the reply and echoed it back.
    Delivered { message_id: Option<MessageId> },
    /// The server reported success without echoing the message.
    Unconfirmed,
    /// The server refused the reply with a readable reason.
    Rejected(String),
    /// The transport failed and this reply was handed to native submission.
    FellBack,
    /// An earlier failure already switched the thread to native submission.
    Degraded,
}

struct ThreadState<V> {
    cursor: ThreadCursor,
    seen: SeenIds,
    mode: SyncMode,
    view: V,
}

impl<V: ThreadView> ThreadState<V> {
    fn append(&mut self, message: &Message, viewer: UserId) -> bool {
        let Some(id) = message.usable_id() else {
            return false;
        };
        if !self.seen.insert(id) {
            return false;
        }
        self.view.remove_empty_state();
        self.view
            .render_message(&RenderedMessage::new(id, message, viewer));
        let cursor = self.cursor.advance(id);
        self.view.store_cursor(cursor);
        self.view.scroll_to_bottom();
        true
    }
}

struct ThreadShared<T, V> {
    session: Uuid,
    transport: T,
    feed_url: Url,
    current_user: UserId,
    reply_form: Option<ReplyForm>,
    poll_interval: Duration,
    feedback_dismiss: Duration,
    state: Mutex<ThreadState<V>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

/// One live conversation thread.
///
/// Clones share the same session; the poll timer runs from [`start`] until
/// [`dispose`] or the first send transport failure.
///
/// [`start`]: ThreadSync::start
/// [`dispose`]: ThreadSync::dispose
pub struct ThreadSync<T, V> {
    shared: Arc<ThreadShared<T, V>>,
}

impl<T, V> Clone for ThreadSync<T, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, V> ThreadSync<T, V>
where
    T: ThreadTransport + 'static,
    V: ThreadView,
{
    pub fn new(transport: T, anchor: ThreadAnchor, view: V) -> Self {
        let seen = SeenIds::new(anchor.cursor.last_seen_id(), anchor.seen_capacity);
        Self {
            shared: Arc::new(ThreadShared {
                session: Uuid::new_v4(),
                transport,
                feed_url: anchor.feed_url,
                current_user: anchor.current_user,
                reply_form: anchor.reply_form,
                poll_interval: anchor.poll_interval,
                feedback_dismiss: anchor.feedback_dismiss,
                state: Mutex::new(ThreadState {
                    cursor: anchor.cursor,
                    seen,
                    mode: SyncMode::Enhanced,
                    view,
                }),
                poll_task: Mutex::new(None),
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session
    }

    pub async fn mode(&self) -> SyncMode {
        self.shared.state.lock().await.mode
    }

    pub async fn last_message_id(&self) -> MessageId {
        self.shared.state.lock().await.cursor.last_seen_id()
    }

    pub async fn is_polling(&self) -> bool {
        self.shared.poll_task.lock().await.is_some()
    }

    /// Scrolls to the newest message and starts polling. The first poll is
    /// issued right away instead of one interval later.
    pub async fn start(&self) {
        let mut poll_task = self.shared.poll_task.lock().await;
        if poll_task.is_some() {
            debug!(session = %self.shared.session, "thread polling already running");
            return;
        }
        {
            let mut state = self.shared.state.lock().await;
            if state.mode == SyncMode::Degraded {
                debug!(session = %self.shared.session, "thread is degraded, not polling");
                return;
            }
            state.view.scroll_to_bottom();
        }
        let shared = Arc::clone(&self.shared);
        *poll_task = Some(tokio::spawn(run_poll_timer(shared)));
        info!(
            session = %self.shared.session,
            "polling {} every {:?}", self.shared.feed_url, self.shared.poll_interval
        );
    }

    /// Stops the poll timer. Requests already in flight still land.
    pub async fn dispose(&self) {
        if self.shared.cancel_polling().await {
            info!(session = %self.shared.session, "thread polling stopped");
        }
    }

    pub async fn poll(&self) -> Result<usize, SyncError> {
        self.shared.poll().await
    }

    /// Places a message in the thread unless its id is unusable or already
    /// shown. Returns whether anything was rendered.
    pub async fn append_message(&self, message: &Message) -> bool {
        let mut state = self.shared.state.lock().await;
        state.append(message, self.shared.current_user)
    }

    /// Posts a reply through the json endpoint and echoes it into the thread.
    #[instrument(skip_all, fields(session = %self.shared.session))]
    pub async fn send(&self, text: &str) -> SendOutcome {
        let shared = &self.shared;
        let Some(form) = shared.reply_form.as_ref() else {
            return SendOutcome::Unavailable;
        };
        if text.trim().is_empty() {
            shared.show_feedback(EMPTY_REPLY_WARNING).await;
            return SendOutcome::Empty;
        }
        if shared.state.lock().await.mode == SyncMode::Degraded {
            debug!("reply ignored, thread already fell back to native submission");
            return SendOutcome::Degraded;
        }

        match shared.transport.send_reply(form, text).await {
            Ok(SendReplyResponse {
                success: true,
                message: Some(message),
                ..
            }) => {
                let mut state = shared.state.lock().await;
                state.append(&message, shared.current_user);
                state.view.clear_input();
                SendOutcome::Delivered {
                    message_id: message.usable_id(),
                }
            }
            Ok(SendReplyResponse {
                error: Some(error), ..
            }) if !error.is_empty() => {
                debug!("reply rejected: {error}");
                shared.show_feedback(&error).await;
                SendOutcome::Rejected(error)
            }
            Ok(_) => {
                debug!("reply accepted without an echoed message");
                SendOutcome::Unconfirmed
            }
            Err(e) => {
                error!("instant reply failed, falling back to native submission: {e}");
                if shared.degrade(form, text).await {
                    SendOutcome::FellBack
                } else {
                    SendOutcome::Degraded
                }
            }
        }
    }
}

impl<T, V> ThreadShared<T, V>
where
    T: ThreadTransport + 'static,
    V: ThreadView,
{
    #[instrument(skip_all, fields(session = %self.session))]
    async fn poll(&self) -> Result<usize, SyncError> {
        let after_id = self.state.lock().await.cursor.after_id();
        let feed = self
            .transport
            .fetch_messages(&self.feed_url, after_id)
            .await?;
        let Some(messages) = feed.messages else {
            return Ok(0);
        };
        let mut state = self.state.lock().await;
        let mut appended = 0;
        for message in &messages {
            if state.append(message, self.current_user) {
                appended += 1;
            }
        }
        if appended > 0 {
            debug!("appended {appended} new message(s)");
        }
        Ok(appended)
    }

    async fn show_feedback(self: &Arc<Self>, text: &str) {
        self.state.lock().await.view.show_feedback(text);
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            time::sleep(shared.feedback_dismiss).await;
            shared.state.lock().await.view.dismiss_feedback();
        });
    }

    async fn cancel_polling(&self) -> bool {
        match self.poll_task.lock().await.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Switches to native submission. Only the first caller wins, later
    /// failures find the thread already degraded.
    async fn degrade(&self, form: &ReplyForm, content: &str) -> bool {
        {
            let mut state = self.state.lock().await;
            if state.mode == SyncMode::Degraded {
                return false;
            }
            state.mode = SyncMode::Degraded;
        }
        self.cancel_polling().await;
        warn!(
            session = %self.session,
            mode = %SyncMode::Degraded,
            "thread switched to native submission"
        );
        self.state.lock().await.view.submit_natively(form, content);
        true
    }
}

async fn run_poll_timer<T, V>(shared: Arc<ThreadShared<T, V>>)
where
    T: ThreadTransport + 'static,
    V: ThreadView,
{
    let mut ticker = time::interval(shared.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        // a hung request must not hold back the next tick
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(e) = shared.poll().await {
                warn!(session = %shared.session, "message polling failed: {e}");
            }
        });
    }
}
