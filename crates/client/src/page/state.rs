use campushub_sync::transport::HttpTransport;
use campushub_sync::{NotificationSync, ThreadSync};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::page::terminal::{NativeReply, TerminalNotificationView, TerminalThreadView};

pub type PageThread = ThreadSync<HttpTransport, TerminalThreadView>;
pub type PageNotifications = NotificationSync<HttpTransport, TerminalNotificationView>;

/// The engines whose anchors are present on the configured page.
pub struct PageState {
    pub transport: HttpTransport,
    pub thread: Option<PageThread>,
    pub notifications: Option<PageNotifications>,
}

impl PageState {
    pub fn try_init(
        config: &AppConfig,
        native_replies: UnboundedSender<NativeReply>,
    ) -> anyhow::Result<Self> {
        let transport = HttpTransport::connect(&config.http)?;
        let base = config.http.base_url()?;

        let thread = match &config.page.thread {
            Some(thread) => {
                let anchor = thread.resolve(&base)?;
                let view =
                    TerminalThreadView::new(anchor.cursor.last_seen_id(), native_replies);
                Some(ThreadSync::new(transport.clone(), anchor, view))
            }
            None => None,
        };
        let notifications = match &config.page.notifications {
            Some(notifications) => notifications.resolve(&base)?.map(|anchor| {
                NotificationSync::new(
                    transport.clone(),
                    anchor,
                    TerminalNotificationView::default(),
                )
            }),
            None => None,
        };

        Ok(Self {
            transport,
            thread,
            notifications,
        })
    }

    pub fn is_active(&self) -> bool {
        self.thread.is_some() || self.notifications.is_some()
    }

    pub async fn dispose(&self) {
        if let Some(thread) = &self.thread {
            thread.dispose().await;
        }
    }
}
