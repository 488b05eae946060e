//! The normalization boundary.
//!
//! Every path a notification can arrive by (unified REST row, legacy REST
//! row, push payload) funnels through this module and comes out as a
//! [`NotificationItem`] with one stable id and fully-resolved display
//! fields. Field-name fallback chains and display defaults live here and
//! nowhere else.

use chrono::{DateTime, Utc};

use beacon_core::types::{NotificationItem, NotificationKind, Priority};

use crate::frames::{IncidentPayload, WelfarePayload};
use crate::rest::NotificationDto;

/// Default title for incidents whose category is unknown.
const FALLBACK_INCIDENT_TITLE: &str = "New Incident";

/// Default welfare status when the server omits one.
const FALLBACK_WELFARE_STATUS: &str = "needs_help";

/// Strip a single leading icon token from a server-rendered title.
///
/// Unified-listing titles prefix an emoji when the incident category is
/// unavailable; the first whitespace-delimited token is dropped when it
/// contains no alphanumeric character.
pub fn strip_icon_token(title: &str) -> &str {
    let trimmed = title.trim();
    if let Some((first, rest)) = trimmed.split_once(char::is_whitespace) {
        if !first.chars().any(char::is_alphanumeric) {
            return rest.trim_start();
        }
    }
    trimmed
}

fn priority_of(level: Option<&str>) -> Priority {
    level.map(Priority::from_str_value).unwrap_or(Priority::Medium)
}

/// Normalize an incident payload (push event or legacy REST row).
pub fn incident_from_payload(
    payload: &IncidentPayload,
    received_at: DateTime<Utc>,
) -> NotificationItem {
    NotificationItem {
        id: payload.id.to_string(),
        kind: NotificationKind::Incident,
        title: payload
            .incident_type
            .clone()
            .unwrap_or_else(|| FALLBACK_INCIDENT_TITLE.to_string()),
        message: payload
            .location
            .clone()
            .unwrap_or_else(|| "Location not provided".to_string()),
        priority: priority_of(payload.priority_level.as_deref()),
        occurred_at: payload.date_reported.unwrap_or(received_at),
    }
}

/// Normalize a welfare payload (push event or legacy REST row).
pub fn welfare_from_payload(
    payload: &WelfarePayload,
    received_at: DateTime<Utc>,
) -> NotificationItem {
    NotificationItem {
        id: NotificationItem::welfare_id(payload.report_id),
        kind: NotificationKind::Welfare,
        title: payload.display_name(),
        message: payload
            .additional_info
            .clone()
            .unwrap_or_else(|| format!("Status: {FALLBACK_WELFARE_STATUS}")),
        priority: Priority::Medium,
        occurred_at: payload.submitted_at.unwrap_or(received_at),
    }
}

/// Merge freshly arrived incident fields into an existing item.
///
/// Only fields present on the payload override; identity is untouched.
pub fn merge_incident_into(item: &mut NotificationItem, payload: &IncidentPayload) {
    if let Some(incident_type) = &payload.incident_type {
        item.title = incident_type.clone();
    }
    if let Some(location) = &payload.location {
        item.message = location.clone();
    }
    if let Some(level) = &payload.priority_level {
        item.priority = Priority::from_str_value(level);
    }
    if let Some(reported) = payload.date_reported {
        item.occurred_at = reported;
    }
}

/// Merge freshly arrived welfare fields into an existing item.
pub fn merge_welfare_into(item: &mut NotificationItem, payload: &WelfarePayload) {
    if payload.user_name.is_some() || payload.first_name.is_some() || payload.last_name.is_some() {
        item.title = payload.display_name();
    }
    if let Some(info) = &payload.additional_info {
        item.message = info.clone();
    }
    if let Some(submitted) = payload.submitted_at {
        item.occurred_at = submitted;
    }
}

/// Normalize one row of the unified notification listing.
///
/// Rows with a kind this client does not display yield `None`.
pub fn item_from_rest(dto: &NotificationDto, fetched_at: DateTime<Utc>) -> Option<NotificationItem> {
    match dto.kind.as_str() {
        "incident" => Some(incident_from_rest(dto, fetched_at)),
        "welfare" => Some(welfare_from_rest(dto, fetched_at)),
        _ => None,
    }
}

fn incident_from_rest(dto: &NotificationDto, fetched_at: DateTime<Utc>) -> NotificationItem {
    let title = match &dto.metadata.incident_type {
        Some(incident_type) => incident_type.clone(),
        None => dto
            .title
            .as_deref()
            .map(strip_icon_token)
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_INCIDENT_TITLE)
            .to_string(),
    };

    NotificationItem {
        id: dto.related_id.unwrap_or(dto.id).to_string(),
        kind: NotificationKind::Incident,
        title,
        message: dto.message.clone().unwrap_or_default(),
        priority: priority_of(dto.priority_level.as_deref()),
        occurred_at: dto.created_at.unwrap_or(fetched_at),
    }
}

fn welfare_from_rest(dto: &NotificationDto, fetched_at: DateTime<Utc>) -> NotificationItem {
    let status = dto
        .metadata
        .status
        .clone()
        .unwrap_or_else(|| FALLBACK_WELFARE_STATUS.to_string());

    NotificationItem {
        id: NotificationItem::welfare_id(dto.related_id.unwrap_or(dto.id)),
        kind: NotificationKind::Welfare,
        title: dto
            .metadata
            .user_name
            .clone()
            .unwrap_or_else(|| "Unknown User".to_string()),
        message: dto
            .message
            .clone()
            .unwrap_or_else(|| format!("Status: {status}")),
        priority: priority_of(dto.priority_level.as_deref()),
        occurred_at: dto.created_at.unwrap_or(fetched_at),
    }
}
