//! VK community invitation agent
//!
//! Reads the member list of a target community, filters the members against
//! configurable profile criteria and invites the survivors into a destination
//! community, pacing every call and keeping a persistent ledger so nobody is
//! invited twice.

pub mod config;
pub mod core;
pub mod error;
pub mod inviter_impl;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::{DelayRange, InviterConfig, Pacing};
pub use error::{DirectoryError, DirectoryResult, FailureKind, InviterError, InviterResult};
pub use inviter_impl::Inviter;
pub use traits::*;
pub use types::*;
