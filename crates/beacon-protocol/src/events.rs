//! Typed push events dispatched to subscribers.
//!
//! [`crate::frames::ServerFrame`]s are decoded once at the transport
//! boundary; everything downstream works with this tagged union and never
//! re-guesses field presence.

use chrono::{DateTime, Utc};

use crate::frames::{IncidentPayload, ServerFrame, WelfarePayload};

/// Discriminator used to key subscriber registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushEventKind {
    /// A new incident was reported.
    NewIncident,
    /// A new welfare check report was submitted.
    NewWelfareReport,
    /// An existing incident changed.
    IncidentUpdated,
    /// An existing welfare report changed.
    WelfareUpdated,
}

/// A server push event with its decoded payload.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// A new incident was reported.
    NewIncident(IncidentPayload),
    /// A new welfare check report was submitted.
    NewWelfareReport(WelfarePayload),
    /// An existing incident changed.
    IncidentUpdated(IncidentPayload),
    /// An existing welfare report changed.
    WelfareUpdated(WelfarePayload),
}

impl PushEvent {
    /// The registration key this event dispatches under.
    pub fn kind(&self) -> PushEventKind {
        match self {
            Self::NewIncident(_) => PushEventKind::NewIncident,
            Self::NewWelfareReport(_) => PushEventKind::NewWelfareReport,
            Self::IncidentUpdated(_) => PushEventKind::IncidentUpdated,
            Self::WelfareUpdated(_) => PushEventKind::WelfareUpdated,
        }
    }
}

impl ServerFrame {
    /// Convert a decoded frame into a dispatchable event.
    ///
    /// `pong` and unrecognized frames are internal to the connection
    /// manager and yield `None`.
    pub fn into_event(self) -> Option<PushEvent> {
        match self {
            Self::Pong | Self::Unknown => None,
            Self::NewIncident { data } => Some(PushEvent::NewIncident(data)),
            Self::NewWelfareReport { data } => Some(PushEvent::NewWelfareReport(data)),
            Self::IncidentUpdated { data } => Some(PushEvent::IncidentUpdated(data)),
            Self::WelfareUpdated { data } => Some(PushEvent::WelfareUpdated(data)),
        }
    }
}

/// A push event as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// The decoded event.
    pub event: PushEvent,
    /// When the transport delivered it.
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Wrap an event with the current receive time.
    pub fn now(event: PushEvent) -> Self {
        Self {
            event,
            received_at: Utc::now(),
        }
    }
}
