//! Push-channel frame definitions.
//!
//! Frames are JSON objects discriminated by a `type` field:
//! `{ "type": string, "data"?: object, "timestamp"?: string }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A frame sent by the client to the server.
#[derive(Debug, Clone, Serialize)]
pub struct ClientFrame {
    /// Frame discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Frame payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// When the frame was built.
    pub timestamp: DateTime<Utc>,
}

impl ClientFrame {
    /// Create a frame with an arbitrary discriminator and payload.
    pub fn new(kind: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Create a keep-alive ping frame.
    pub fn ping() -> Self {
        let now = Utc::now();
        Self {
            kind: "ping".to_string(),
            data: Some(serde_json::json!({ "timestamp": now.timestamp_millis() })),
            timestamp: now,
        }
    }
}

/// A frame pushed by the server to the client.
///
/// Unrecognized discriminators decode to [`ServerFrame::Unknown`] so that
/// new server-side event types never break the reader.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Keep-alive reply. Consumed by the connection manager, never dispatched.
    Pong,
    /// A new incident was reported.
    NewIncident {
        /// Incident fields.
        data: IncidentPayload,
    },
    /// A new welfare check report was submitted.
    NewWelfareReport {
        /// Welfare report fields.
        data: WelfarePayload,
    },
    /// An existing incident changed.
    IncidentUpdated {
        /// Incident fields.
        data: IncidentPayload,
    },
    /// An existing welfare report changed.
    WelfareUpdated {
        /// Welfare report fields.
        data: WelfarePayload,
    },
    /// Any frame type this client does not consume.
    #[serde(other)]
    Unknown,
}

/// Incident fields consumed by the client.
///
/// The id arrives as `id` or `incident_id` depending on the emitting
/// endpoint; both land in [`IncidentPayload::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentPayload {
    /// Incident id.
    #[serde(alias = "incident_id")]
    pub id: i64,
    /// Incident category, e.g. `"Fire"`.
    #[serde(default)]
    pub incident_type: Option<String>,
    /// Free-form location description.
    #[serde(default)]
    pub location: Option<String>,
    /// Nominal priority string.
    #[serde(default)]
    pub priority_level: Option<String>,
    /// When the incident was reported.
    #[serde(default)]
    pub date_reported: Option<DateTime<Utc>>,
}

/// Welfare report fields consumed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelfarePayload {
    /// Welfare report id.
    #[serde(alias = "id")]
    pub report_id: i64,
    /// Reporter first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Reporter last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Reporter display name, when the server has one.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Free-form details.
    #[serde(default, alias = "description")]
    pub additional_info: Option<String>,
    /// When the report was submitted.
    #[serde(default, alias = "date_reported")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl WelfarePayload {
    /// Best-available display name for the reporter.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.user_name {
            return name.clone();
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "Unknown User".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_serializes_with_type_tag() {
        let frame = ClientFrame::ping();
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&frame).expect("serialize"))
                .expect("parse");
        assert_eq!(json["type"], "ping");
        assert!(json["data"]["timestamp"].is_i64());
    }

    #[test]
    fn test_pong_decodes_with_extra_fields() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"pong","timestamp":"2026-01-01T00:00:00Z"}"#)
                .expect("decode");
        assert!(matches!(frame, ServerFrame::Pong));
    }

    #[test]
    fn test_new_incident_accepts_incident_id_alias() {
        let frame: ServerFrame = serde_json::from_str(
            r#"{"type":"new_incident","data":{"incident_id":42,"incident_type":"Fire"}}"#,
        )
        .expect("decode");
        match frame {
            ServerFrame::NewIncident { data } => {
                assert_eq!(data.id, 42);
                assert_eq!(data.incident_type.as_deref(), Some("Fire"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_welfare_accepts_legacy_field_names() {
        let frame: ServerFrame = serde_json::from_str(
            r#"{"type":"new_welfare_report","data":{"id":9,"description":"trapped","date_reported":"2026-02-03T04:05:06Z"}}"#,
        )
        .expect("decode");
        match frame {
            ServerFrame::NewWelfareReport { data } => {
                assert_eq!(data.report_id, 9);
                assert_eq!(data.additional_info.as_deref(), Some("trapped"));
                assert!(data.submitted_at.is_some());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_frame_type_is_tolerated() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"type":"server_stats","data":{"load":0.3}}"#).expect("decode");
        assert!(matches!(frame, ServerFrame::Unknown));
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let mut payload = WelfarePayload {
            report_id: 1,
            first_name: None,
            last_name: None,
            user_name: None,
            additional_info: None,
            submitted_at: None,
        };
        assert_eq!(payload.display_name(), "Unknown User");

        payload.first_name = Some("Ada".to_string());
        payload.last_name = Some("Reyes".to_string());
        assert_eq!(payload.display_name(), "Ada Reyes");

        payload.user_name = Some("areyes".to_string());
        assert_eq!(payload.display_name(), "areyes");
    }
}
