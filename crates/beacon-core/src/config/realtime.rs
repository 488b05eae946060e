//! Push-channel connection lifecycle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the persistent push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Connection-open timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Keep-alive ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Time allowed for a pong after each ping, in seconds.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_seconds: u64,
    /// Base reconnection backoff in milliseconds; attempt N waits N times this.
    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_ms: u64,
    /// Maximum automatic reconnection attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Outbound frame buffer size.
    #[serde(default = "default_send_buffer")]
    pub send_buffer_size: usize,
}

impl RealtimeConfig {
    /// Connection-open timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Keep-alive ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Pong wait window as a [`Duration`].
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_secs(self.pong_timeout_seconds)
    }

    /// Backoff delay before reconnection attempt `attempt` (1-based).
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.reconnect_base_ms * u64::from(attempt))
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            ping_interval_seconds: default_ping_interval(),
            pong_timeout_seconds: default_pong_timeout(),
            reconnect_base_ms: default_reconnect_base(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            send_buffer_size: default_send_buffer(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_ping_interval() -> u64 {
    30
}

fn default_pong_timeout() -> u64 {
    10
}

fn default_reconnect_base() -> u64 {
    3000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_send_buffer() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnect_delay_is_linear() {
        let config = RealtimeConfig::default();
        assert_eq!(config.reconnect_delay(1), Duration::from_millis(3000));
        assert_eq!(config.reconnect_delay(3), Duration::from_millis(9000));
        assert_eq!(config.reconnect_delay(5), Duration::from_millis(15000));
    }
}
