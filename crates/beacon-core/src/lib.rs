//! # beacon-core
//!
//! Core crate for the Beacon notification client. Contains configuration
//! schemas, shared domain types (notification items, priorities), and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Beacon crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
