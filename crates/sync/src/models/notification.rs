use serde::{Deserialize, Serialize};

use crate::constants::BADGE_DISPLAY_CAP;
use crate::models::null_as_default;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
    #[serde(default)]
    pub time_display: Option<String>,
    #[serde(default)]
    pub timestamp_iso: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_new: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFeed {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<NotificationItem>,
    #[serde(default)]
    pub new_count: Option<u32>,
}

impl NotificationFeed {
    /// Unread count as reported by the server, derived from the items when
    /// the payload leaves it out.
    pub fn unread_count(&self) -> u32 {
        self.new_count.unwrap_or_else(|| {
            self.items
                .iter()
                .filter(|item| item.is_new)
                .count()
                .try_into()
                .unwrap_or(u32::MAX)
        })
    }

    pub fn badge(&self) -> Option<BadgeCount> {
        BadgeCount::new(self.unread_count())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    #[serde(default)]
    pub payload: Option<NotificationFeed>,
}

/// Non-zero unread count. Zero unread is expressed by having no badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeCount(u32);

impl BadgeCount {
    pub fn new(count: u32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    pub fn count(&self) -> u32 {
        self.0
    }

    pub fn label(&self) -> String {
        if self.0 > BADGE_DISPLAY_CAP {
            format!("{BADGE_DISPLAY_CAP}+")
        } else {
            self.0.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(is_new: bool) -> NotificationItem {
        NotificationItem {
            title: Some("Request for Studio B".to_string()),
            is_new,
            ..Default::default()
        }
    }

    #[test]
    fn zero_count_has_no_badge() {
        assert_eq!(BadgeCount::new(0), None);
        let feed = NotificationFeed {
            items: vec![item(false)],
            new_count: Some(0),
        };
        assert_eq!(feed.badge(), None);
    }

    #[test]
    fn badge_label_is_capped() {
        assert_eq!(BadgeCount::new(3).unwrap().label(), "3");
        assert_eq!(BadgeCount::new(9).unwrap().label(), "9");
        assert_eq!(BadgeCount::new(10).unwrap().label(), "9+");
    }

    #[test]
    fn missing_new_count_is_derived_from_items() {
        let feed = NotificationFeed {
            items: vec![item(true), item(false), item(true)],
            new_count: None,
        };
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn null_items_and_flags_decode_as_empty() {
        let feed: NotificationFeed =
            serde_json::from_str(r#"{"items":null,"new_count":null}"#).unwrap();
        assert!(feed.items.is_empty());
        assert_eq!(feed.badge(), None);

        let item: NotificationItem =
            serde_json::from_str(r#"{"title":"a","is_new":null}"#).unwrap();
        assert!(!item.is_new);
    }

    #[test]
    fn server_new_count_wins_over_items() {
        let feed: NotificationFeed =
            serde_json::from_str(r#"{"items":[{"title":"a","is_new":true}],"new_count":4}"#)
                .unwrap();
        assert_eq!(feed.unread_count(), 4);
    }
}
