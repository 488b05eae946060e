//! # beacon-protocol
//!
//! Wire shapes for the Beacon notification client:
//!
//! - Push-channel frames (client → server and server → client)
//! - REST collaborator request/response shapes (unified + legacy)
//! - The single normalization boundary that turns heterogeneous payloads
//!   into [`beacon_core::types::NotificationItem`]s
//!
//! Alternate field names (`id`/`incident_id`, `submitted_at`/`date_reported`,
//! ...) are accommodated here and nowhere else.

pub mod events;
pub mod frames;
pub mod normalize;
pub mod rest;

pub use events::{InboundEvent, PushEvent, PushEventKind};
pub use frames::{ClientFrame, IncidentPayload, ServerFrame, WelfarePayload};
