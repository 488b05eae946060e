//! The notification item — the aggregator's unit of display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// Which half of the feed a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// An incident report.
    Incident,
    /// A welfare check report.
    Welfare,
}

/// A single notification in the aggregator's working set.
///
/// The `id` is stable across the REST snapshot and push representations:
/// `welfare_<related id>` for welfare reports, the raw numeric incident id
/// rendered as a string for incidents. Read/unread state is tracked
/// separately and never stored on the item itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Stable identifier.
    pub id: String,
    /// Feed partition.
    pub kind: NotificationKind,
    /// Display title.
    pub title: String,
    /// Display body.
    pub message: String,
    /// Nominal priority.
    pub priority: Priority,
    /// When the underlying event occurred.
    pub occurred_at: DateTime<Utc>,
}

impl NotificationItem {
    /// Build the stable id for a welfare report.
    pub fn welfare_id(related_id: i64) -> String {
        format!("welfare_{related_id}")
    }

    /// Whether this item counts toward the high-attention indicator.
    ///
    /// Welfare reports always count, regardless of their nominal priority.
    pub fn is_high_attention(&self) -> bool {
        self.kind == NotificationKind::Welfare || self.priority.is_high_attention()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: NotificationKind, priority: Priority) -> NotificationItem {
        NotificationItem {
            id: "1".to_string(),
            kind,
            title: "t".to_string(),
            message: "m".to_string(),
            priority,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_welfare_id_format() {
        assert_eq!(NotificationItem::welfare_id(9), "welfare_9");
    }

    #[test]
    fn test_welfare_is_always_high_attention() {
        assert!(item(NotificationKind::Welfare, Priority::Low).is_high_attention());
        assert!(!item(NotificationKind::Incident, Priority::Low).is_high_attention());
        assert!(item(NotificationKind::Incident, Priority::Critical).is_high_attention());
    }
}
