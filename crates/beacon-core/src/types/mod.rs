//! Shared domain types.

pub mod notification;
pub mod priority;

pub use notification::{NotificationItem, NotificationKind};
pub use priority::Priority;
