//! Ephemeral toast notifications with timed dismissal.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;
use tracing::trace;

use beacon_core::types::{NotificationItem, NotificationKind, Priority};

/// An ephemeral, auto-expiring notification. Never persisted.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Id of the item that produced this toast.
    pub id: String,
    /// Feed partition of the source item.
    pub kind: NotificationKind,
    /// Display title.
    pub title: String,
    /// Display body.
    pub message: String,
    /// Nominal priority.
    pub priority: Priority,
    /// When the toast was created.
    pub created_at: DateTime<Utc>,
}

impl Toast {
    /// Builds a toast from a freshly arrived item.
    pub fn from_item(item: &NotificationItem) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            title: item.title.clone(),
            message: item.message.clone(),
            priority: item.priority,
            created_at: Utc::now(),
        }
    }
}

/// Holds active toasts and schedules their dismissal.
#[derive(Debug)]
pub struct ToastRack {
    ttl: Duration,
    toasts: Mutex<Vec<Toast>>,
}

impl ToastRack {
    /// Creates an empty rack with the given toast lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Mutex::new(Vec::new()),
        }
    }

    /// Adds a toast and schedules its removal after the configured lifetime.
    pub fn push(self: &Arc<Self>, toast: Toast) {
        let id = toast.id.clone();
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(toast);

        let rack = self.clone();
        tokio::spawn(async move {
            time::sleep(rack.ttl).await;
            rack.dismiss(&id);
        });
    }

    /// Removes a toast by id. Removing an absent id is a no-op, so manual
    /// dismissal racing the timer is safe.
    pub fn dismiss(&self, id: &str) {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        let before = toasts.len();
        toasts.retain(|toast| toast.id != id);
        if toasts.len() < before {
            trace!(id, "Toast dismissed");
        }
    }

    /// Snapshot of the active toasts, oldest first.
    pub fn active(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
