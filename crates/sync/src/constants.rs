use std::time::Duration;

/// Fixed polling period for a thread feed, there is no backoff on failures.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10_000);
/// How long inline send feedback stays visible.
pub const FEEDBACK_DISMISS_AFTER: Duration = Duration::from_millis(4_000);
/// Upper bound of message ids remembered for deduplication before pruning.
pub const DEFAULT_SEEN_CAPACITY: usize = 1024;
/// Unread counts above this value are shown as `9+`.
pub const BADGE_DISPLAY_CAP: u32 = 9;

pub const EMPTY_REPLY_WARNING: &str = "Please enter a message before sending.";
pub const CONTENT_FIELD: &str = "content";
pub const CSRF_HEADER: &str = "X-CSRFToken";
