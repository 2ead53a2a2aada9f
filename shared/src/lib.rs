//! Shared types for the group invitation agent
//!
//! Contains the VK domain model (members, group references, identifiers),
//! the shared error type and the tracing setup used by every binary.

pub mod types;
pub mod errors;
pub mod logging;

pub use types::*;
pub use errors::*;
