use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::NotificationAnchor;
use crate::error::SyncError;
use crate::markup::render_notification_list;
use crate::models::notification::NotificationFeed;
use crate::transport::NotificationTransport;
use crate::view::NotificationView;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Another acknowledgement was in flight, nothing was sent.
    Skipped,
    Applied,
    Failed,
}

struct NotificationState<V> {
    has_fetched_once: bool,
    view: V,
}

impl<V: NotificationView> NotificationState<V> {
    fn apply(&mut self, feed: &NotificationFeed) {
        match render_notification_list(&feed.items) {
            Some(markup) => self.view.render_items(&feed.items, &markup),
            None => self.view.show_empty(),
        }
        self.view.set_badge(feed.badge());
    }
}

/// Releases the in-flight flag however the acknowledgement ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct NotificationShared<T, V> {
    session: Uuid,
    transport: T,
    anchor: NotificationAnchor,
    ack_in_flight: AtomicBool,
    state: Mutex<NotificationState<V>>,
}

/// Notification menu: the feed is fetched on first open, every open marks
/// the current items as seen.
pub struct NotificationSync<T, V> {
    shared: Arc<NotificationShared<T, V>>,
}

impl<T, V> Clone for NotificationSync<T, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, V> NotificationSync<T, V>
where
    T: NotificationTransport + 'static,
    V: NotificationView,
{
    pub fn new(transport: T, anchor: NotificationAnchor, view: V) -> Self {
        Self {
            shared: Arc::new(NotificationShared {
                session: Uuid::new_v4(),
                transport,
                anchor,
                ack_in_flight: AtomicBool::new(false),
                state: Mutex::new(NotificationState {
                    has_fetched_once: false,
                    view,
                }),
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session
    }

    pub async fn has_fetched_once(&self) -> bool {
        self.shared.state.lock().await.has_fetched_once
    }

    pub fn ack_in_flight(&self) -> bool {
        self.shared.ack_in_flight.load(Ordering::Acquire)
    }

    /// Loads the feed and re-renders. On failure the previous render stays.
    #[instrument(skip_all, fields(session = %self.shared.session))]
    pub async fn fetch_feed(&self) -> Result<(), SyncError> {
        let feed = self
            .shared
            .transport
            .fetch_feed(&self.shared.anchor.feed_url)
            .await?;
        let mut state = self.shared.state.lock().await;
        state.has_fetched_once = true;
        state.apply(&feed);
        debug!("rendered {} notification(s)", feed.items.len());
        Ok(())
    }

    /// Marks the current items as seen. A call made while another is in
    /// flight is dropped, not queued.
    #[instrument(skip_all, fields(session = %self.shared.session))]
    pub async fn acknowledge(&self) -> AckOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.shared.ack_in_flight) else {
            debug!("acknowledgement already in flight");
            return AckOutcome::Skipped;
        };
        let anchor = &self.shared.anchor;
        match self
            .shared
            .transport
            .acknowledge(&anchor.ack_url, anchor.csrf_token.as_ref())
            .await
        {
            Ok(response) => {
                if let Some(payload) = response.payload {
                    self.shared.state.lock().await.apply(&payload);
                }
                AckOutcome::Applied
            }
            Err(e) => {
                warn!("notification acknowledgement failed: {e}");
                AckOutcome::Failed
            }
        }
    }

    /// What opening the menu does: fetch the feed unless it was loaded
    /// before, and acknowledge regardless.
    pub async fn open(&self) -> AckOutcome {
        let fetch = async {
            if self.has_fetched_once().await {
                return;
            }
            if let Err(e) = self.fetch_feed().await {
                warn!(session = %self.shared.session, "notification feed failed: {e}");
            }
        };
        let (_, outcome) = tokio::join!(fetch, self.acknowledge());
        outcome
    }
}
