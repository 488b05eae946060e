//! Notification feed configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the notification aggregation feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size for the unified notification listing.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum retained incident notifications.
    #[serde(default = "default_incident_cap")]
    pub incident_cap: usize,
    /// Maximum retained welfare notifications.
    #[serde(default = "default_welfare_cap")]
    pub welfare_cap: usize,
    /// Toast lifetime in milliseconds.
    #[serde(default = "default_toast_ttl")]
    pub toast_ttl_ms: u64,
    /// Interval between full REST refreshes in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Path of the persisted read-state file.
    #[serde(default = "default_read_state_path")]
    pub read_state_path: String,
}

impl FeedConfig {
    /// Toast lifetime as a [`Duration`].
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    /// Refresh interval as a [`Duration`].
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            incident_cap: default_incident_cap(),
            welfare_cap: default_welfare_cap(),
            toast_ttl_ms: default_toast_ttl(),
            refresh_interval_seconds: default_refresh_interval(),
            read_state_path: default_read_state_path(),
        }
    }
}

fn default_page_size() -> usize {
    50
}

fn default_incident_cap() -> usize {
    10
}

fn default_welfare_cap() -> usize {
    5
}

fn default_toast_ttl() -> u64 {
    5000
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_read_state_path() -> String {
    "data/read_state.json".to_string()
}
