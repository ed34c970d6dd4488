//! Markup produced for the notification menu and display helpers for thread
//! messages.
//!
//! Every string that reaches markup from a feed goes through [`escape_html`]
//! (element text) or [`escape_attr`] (attribute values).

use chrono::{DateTime, NaiveDateTime};

use crate::models::notification::NotificationItem;

const DEFAULT_TITLE: &str = "Update";
const DEFAULT_URL: &str = "#";
const DEFAULT_ICON: &str = "bi-bell-fill";
const DEFAULT_ACCENT: &str = "muted";
const TIMESTAMP_DISPLAY_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";
const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Escapes `&`, `<`, `>`, `"` and `'` for use as element text.
pub fn escape_html(value: &str) -> String {
    html_escape::encode_quoted_attribute(value).into_owned()
}

/// Escapes like [`escape_html`] and collapses whitespace runs, so the value
/// can't break out of a quoted attribute or smuggle line breaks into it.
pub fn escape_attr(value: &str) -> String {
    escape_html(value)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

pub fn render_notification_item(item: &NotificationItem) -> String {
    let body = match non_empty(&item.body) {
        Some(body) => format!(
            "<div class=\"notification-subtitle\">{}</div>",
            escape_html(body)
        ),
        None => String::new(),
    };
    let (new_class, dot) = if item.is_new {
        (
            " notification-item--new",
            "<span class=\"notification-dot\" aria-hidden=\"true\"></span>",
        )
    } else {
        ("", "")
    };
    format!(
        concat!(
            "<a class=\"notification-item{new_class}\" href=\"{url}\">",
            "<div class=\"notification-icon notification-icon--{accent}\">",
            "<i class=\"bi {icon}\" aria-hidden=\"true\"></i>",
            "</div>",
            "<div class=\"notification-body\">",
            "<div class=\"notification-title\">{title}</div>",
            "{body}",
            "<div class=\"notification-meta\">{time}</div>",
            "</div>",
            "{dot}",
            "</a>"
        ),
        new_class = new_class,
        url = escape_attr(non_empty(&item.url).unwrap_or(DEFAULT_URL)),
        accent = escape_attr(non_empty(&item.accent).unwrap_or(DEFAULT_ACCENT)),
        icon = escape_attr(non_empty(&item.icon).unwrap_or(DEFAULT_ICON)),
        title = escape_html(non_empty(&item.title).unwrap_or(DEFAULT_TITLE)),
        body = body,
        time = escape_html(item.time_display.as_deref().unwrap_or_default()),
        dot = dot,
    )
}

/// Markup for the whole list, `None` when the view should show its empty
/// state instead.
pub fn render_notification_list(items: &[NotificationItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().map(render_notification_item).collect())
}

/// Formats an ISO-8601 timestamp for a message header, falling back to the
/// raw value when it can't be parsed.
pub fn format_timestamp(value: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return parsed.format(TIMESTAMP_DISPLAY_FORMAT).to_string();
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|parsed| parsed.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| value.to_string())
}
