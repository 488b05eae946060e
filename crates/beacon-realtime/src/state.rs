//! Connection lifecycle states.

use std::fmt;

use serde::Serialize;

/// The tri-state connection indicator exposed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No live transport; nothing scheduled or a retry pending.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The push channel is open and authenticated.
    Connected,
}

impl ConnectionState {
    /// String form used in logs and status output.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
