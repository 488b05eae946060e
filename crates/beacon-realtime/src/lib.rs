//! # beacon-realtime
//!
//! Push-channel client for the Beacon notification pipeline. Provides:
//!
//! - One persistent, token-authenticated WebSocket connection per session
//! - Automatic reconnection with linear backoff and an attempt cap
//! - Application-level ping/pong keep-alive on top of the transport
//! - A typed publish/subscribe registry for decoded push events
//! - A watch channel exposing the tri-state connection indicator

pub mod client;
pub mod registry;
pub mod state;

pub use client::PushClient;
pub use registry::{HandlerId, HandlerRegistry};
pub use state::ConnectionState;
