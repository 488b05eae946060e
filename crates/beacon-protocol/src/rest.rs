//! REST collaborator response shapes.
//!
//! The unified notification listing is the primary source; the legacy
//! incident and welfare listings are the fallback pair and reuse the push
//! payload shapes, which is what they emit on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frames::{IncidentPayload, WelfarePayload};

/// Response of the unified notification listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListResponse {
    /// Whether the request succeeded server-side.
    pub success: bool,
    /// Notification rows, newest first.
    #[serde(default)]
    pub notifications: Vec<NotificationDto>,
}

/// One row of the unified notification listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDto {
    /// Notification row id.
    pub id: i64,
    /// `"incident"` or `"welfare"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Server-rendered title (may carry a leading icon token).
    #[serde(default)]
    pub title: Option<String>,
    /// Server-rendered body.
    #[serde(default)]
    pub message: Option<String>,
    /// Nominal priority string.
    #[serde(default)]
    pub priority_level: Option<String>,
    /// Id of the underlying incident or welfare report.
    #[serde(default)]
    pub related_id: Option<i64>,
    /// Row creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Kind-specific details.
    #[serde(default)]
    pub metadata: NotificationMetadata,
}

/// Kind-specific metadata attached to a notification row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    /// Reporter display name (welfare rows).
    #[serde(default)]
    pub user_name: Option<String>,
    /// Report status (welfare rows).
    #[serde(default)]
    pub status: Option<String>,
    /// Incident category (incident rows).
    #[serde(default)]
    pub incident_type: Option<String>,
}

/// Response of the legacy incident listing.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentListResponse {
    /// Whether the request succeeded server-side.
    pub success: bool,
    /// Recent incidents.
    #[serde(default)]
    pub incidents: Vec<IncidentPayload>,
}

/// Response of the legacy welfare-reports-needing-help listing.
#[derive(Debug, Clone, Deserialize)]
pub struct WelfareListResponse {
    /// Whether the request succeeded server-side.
    pub success: bool,
    /// Reports still needing help.
    #[serde(default)]
    pub reports: Vec<WelfarePayload>,
}

/// Response of the mark-read and mark-all-read operations.
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    /// Whether the request succeeded server-side.
    pub success: bool,
}
