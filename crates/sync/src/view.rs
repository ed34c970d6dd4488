//! Rendering seams of the two engines. A view owns one region of the page
//! and only ever receives instructions from inside an engine's critical
//! section, so implementations need no locking of their own.

use crate::models::message::{MessageId, RenderedMessage, ReplyForm};
use crate::models::notification::{BadgeCount, NotificationItem};

pub trait ThreadView: Send + 'static {
    /// Drops the "no messages yet" placeholder if it is still shown.
    fn remove_empty_state(&mut self);

    fn render_message(&mut self, message: &RenderedMessage);

    /// Persists the watermark so a reload resumes from it.
    fn store_cursor(&mut self, last_message_id: MessageId);

    fn scroll_to_bottom(&mut self);

    fn show_feedback(&mut self, text: &str);

    fn dismiss_feedback(&mut self);

    fn clear_input(&mut self);

    /// Hands the reply over to the platform's own form submission.
    fn submit_natively(&mut self, form: &ReplyForm, content: &str);
}

pub trait NotificationView: Send + 'static {
    /// Replaces the list and hides the empty state. `markup` is the escaped
    /// rendering of `items`; hosts that don't display html use the items.
    fn render_items(&mut self, items: &[NotificationItem], markup: &str);

    /// Clears the list and reveals the empty state.
    fn show_empty(&mut self);

    /// `None` removes the badge element altogether.
    fn set_badge(&mut self, badge: Option<BadgeCount>);
}
