//! Native notification seam.
//!
//! Desktop/OS notification delivery differs per host platform; the feed
//! talks to this trait and hosts plug in whatever their platform offers.

use tracing::info;

use beacon_core::types::NotificationItem;

/// Delivers a native, OS-level notification for a newly arrived item.
pub trait SystemNotifier: Send + Sync {
    /// Emit one native notification. Best-effort; failures stay internal.
    fn notify(&self, item: &NotificationItem);
}

/// Default notifier: a structured log line instead of a native popup.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl SystemNotifier for LogNotifier {
    fn notify(&self, item: &NotificationItem) {
        info!(
            id = %item.id,
            priority = item.priority.as_str(),
            "{}: {}",
            item.title,
            item.message
        );
    }
}
