use campushub_sync::models::message::{Direction, MessageId, RenderedMessage, ReplyForm};
use campushub_sync::models::notification::{BadgeCount, NotificationItem};
use campushub_sync::view::{NotificationView, ThreadView};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

/// A reply that has to go through plain form submission.
#[derive(Clone, Debug)]
pub struct NativeReply {
    pub form: ReplyForm,
    pub content: String,
}

pub struct TerminalThreadView {
    has_messages: bool,
    last_message_id: MessageId,
    native_replies: UnboundedSender<NativeReply>,
}

impl TerminalThreadView {
    pub fn new(last_message_id: MessageId, native_replies: UnboundedSender<NativeReply>) -> Self {
        if last_message_id == 0 {
            println!("No messages yet, say hello.");
        }
        Self {
            has_messages: last_message_id != 0,
            last_message_id,
            native_replies,
        }
    }
}

impl ThreadView for TerminalThreadView {
    fn remove_empty_state(&mut self) {
        if !self.has_messages {
            debug!("thread is no longer empty");
            self.has_messages = true;
        }
    }

    fn render_message(&mut self, message: &RenderedMessage) {
        let marker = match message.direction {
            Direction::Sent => ">>",
            Direction::Received => "<<",
        };
        debug!(id = message.message_id, direction = %message.direction, "message rendered");
        println!(
            "{marker} {} · {}\n   {}",
            message.author, message.time_display, message.content
        );
    }

    fn store_cursor(&mut self, last_message_id: MessageId) {
        debug!("thread cursor {} -> {last_message_id}", self.last_message_id);
        self.last_message_id = last_message_id;
    }

    // output always follows the newest line
    fn scroll_to_bottom(&mut self) {}

    fn show_feedback(&mut self, text: &str) {
        eprintln!("! {text}");
    }

    fn dismiss_feedback(&mut self) {}

    fn clear_input(&mut self) {}

    fn submit_natively(&mut self, form: &ReplyForm, content: &str) {
        let reply = NativeReply {
            form: form.clone(),
            content: content.to_string(),
        };
        if self.native_replies.send(reply).is_err() {
            error!("page loop is gone, reply can't be submitted natively");
        }
    }
}

#[derive(Default)]
pub struct TerminalNotificationView {
    badge: Option<BadgeCount>,
}

impl NotificationView for TerminalNotificationView {
    fn render_items(&mut self, items: &[NotificationItem], markup: &str) {
        debug!("notification markup is {} bytes", markup.len());
        for item in items {
            println!("{}", summarize_item(item));
        }
    }

    fn show_empty(&mut self) {
        println!("You're all caught up.");
    }

    fn set_badge(&mut self, badge: Option<BadgeCount>) {
        if badge == self.badge {
            return;
        }
        match badge {
            Some(badge) => println!("[{}] unread notification(s)", badge.label()),
            None => println!("[no unread notifications]"),
        }
        self.badge = badge;
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// One plain-text line per notification: unread marker, title, body, time.
pub fn summarize_item(item: &NotificationItem) -> String {
    let marker = if item.is_new { "*" } else { " " };
    let mut line = format!("{marker} {}", non_empty(&item.title).unwrap_or("Update"));
    if let Some(body) = non_empty(&item.body) {
        line.push_str(" - ");
        line.push_str(body);
    }
    if let Some(time) = non_empty(&item.time_display) {
        line.push_str(&format!(" ({time})"));
    }
    line
}
