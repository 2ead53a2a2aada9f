//! Inviter trait definitions for dependency injection

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use shared::{GroupId, GroupRef, MemberPage, UserId};
use crate::error::{DirectoryResult, InviterResult};
use crate::types::LedgerState;

/// Remote community directory (the VK API)
#[mockall::automock]
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Turn a configured group reference into its numeric id
    async fn resolve_group(&self, group: &GroupRef) -> DirectoryResult<GroupId>;

    /// Fetch one page of a community's member list with profile fields
    async fn list_members(&self, group: GroupId, offset: u32, count: u32) -> DirectoryResult<MemberPage>;

    /// Whether the user already belongs to the community
    async fn is_member(&self, group: GroupId, user: UserId) -> DirectoryResult<bool>;

    /// Send a community invitation to the user
    async fn invite(&self, group: GroupId, user: UserId) -> DirectoryResult<()>;
}

/// Persistence for the invitation ledger
#[mockall::automock]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the stored ledger; `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> InviterResult<Option<LedgerState>>;

    /// Replace the stored ledger with `state`
    async fn save(&self, state: &LedgerState) -> InviterResult<()>;
}

/// Wall clock and timed waits
#[mockall::automock]
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current local time
    fn now(&self) -> DateTime<Local>;

    /// Suspend the current cycle
    async fn sleep(&self, duration: Duration);
}
