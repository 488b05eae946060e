//! # beacon-feed
//!
//! The notification aggregation feed for Beacon. Merges push-delivered
//! events with a periodically-fetched REST snapshot, deduplicates by stable
//! id, tracks persisted read/unread state, and derives the UI-facing
//! counters and ephemeral toasts.

pub mod api;
pub mod feed;
pub mod notifier;
pub mod read_state;
pub mod toast;

pub use api::{HttpNotificationApi, NotificationApi};
pub use feed::NotificationFeed;
pub use notifier::{LogNotifier, SystemNotifier};
pub use read_state::{FileReadStateStore, MemoryReadStateStore, ReadStateStore};
pub use toast::{Toast, ToastRack};
