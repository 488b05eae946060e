//! Notification priority levels.

use serde::{Deserialize, Serialize};

/// Notification priority levels as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority — informational events.
    Low,
    /// Medium priority — standard events.
    Medium,
    /// High priority — important events.
    High,
    /// Critical priority — requires immediate attention.
    Critical,
}

impl Priority {
    /// Parse from the server's string representation, defaulting to medium.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Medium,
        }
    }

    /// Convert to the server's string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether this priority counts toward the high-attention indicator.
    pub fn is_high_attention(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}
