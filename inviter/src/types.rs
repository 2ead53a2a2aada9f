//! Inviter-specific data types

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shared::UserId;

/// On-disk shape of the invitation ledger.
///
/// Every field has a default so older or hand-edited files load with the
/// missing parts backfilled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerState {
    pub total_invites_sent: u64,
    pub invites_today: u32,
    /// Date of the most recent successful invitation
    pub last_invite_date: Option<NaiveDate>,
    /// Users that must never be invited again, in the order they were seen
    pub processed_users: Vec<UserId>,
    /// Subset of `processed_users` whose privacy settings block invitations
    pub users_with_privacy_restrictions: Vec<UserId>,
    /// Stamped on every save
    pub last_activity_time: Option<NaiveDateTime>,
}

/// `{enabled, min, max}` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter {
    pub enabled: bool,
    pub min: u32,
    pub max: u32,
}

/// `{enabled, value}` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFilter<T> {
    pub enabled: bool,
    pub value: T,
}

/// Candidate filter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub age: RangeFilter,
    /// 0 matches any sex
    pub sex: ValueFilter<u8>,
    pub city_id: ValueFilter<u64>,
    pub has_photo: bool,
    /// Maximum days since the member was last online
    pub last_seen_days: ValueFilter<i64>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            age: RangeFilter { enabled: false, min: 18, max: 50 },
            sex: ValueFilter { enabled: false, value: 0 },
            city_id: ValueFilter { enabled: false, value: 1 },
            has_photo: false,
            last_seen_days: ValueFilter { enabled: true, value: 30 },
        }
    }
}

impl FilterSettings {
    /// Every predicate switched off
    pub fn disabled() -> Self {
        let mut settings = Self::default();
        settings.last_seen_days.enabled = false;
        settings
    }
}

/// Result of evaluating one predicate against one member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOutcome {
    Pass,
    Fail,
    /// The member lacks the data this predicate needs
    Inapplicable,
}

/// Why a member did not become a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    AlreadyProcessed,
    PrivacyRestricted,
    AlreadyMember,
    MembershipUnknown,
    Age,
    Sex,
    City,
    NoPhoto,
    Inactive,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rejection::AlreadyProcessed => "already processed",
            Rejection::PrivacyRestricted => "privacy restricted",
            Rejection::AlreadyMember => "already a member",
            Rejection::MembershipUnknown => "membership unknown",
            Rejection::Age => "age",
            Rejection::Sex => "sex",
            Rejection::City => "city",
            Rejection::NoPhoto => "no photo",
            Rejection::Inactive => "inactive",
        };
        write!(f, "{label}")
    }
}

/// Result of one invitation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Invited,
    /// Cooled down; the user stays eligible for a later cycle
    RateLimited,
    PrivacyRestricted,
    Failed,
}

/// Where a cycle stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    QuotaReached,
    GroupUnresolved,
    NoMembers,
    NoCandidates,
    Completed,
}

/// Tallies of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub fetched: usize,
    pub candidates: usize,
    pub planned: usize,
    pub invited: usize,
    pub privacy_restricted: usize,
    pub rate_limited: usize,
    pub failed: usize,
}

impl CycleReport {
    pub fn stopped(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            fetched: 0,
            candidates: 0,
            planned: 0,
            invited: 0,
            privacy_restricted: 0,
            rate_limited: 0,
            failed: 0,
        }
    }

    pub fn attempts(&self) -> usize {
        self.invited + self.privacy_restricted + self.rate_limited + self.failed
    }

    pub(crate) fn count(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Invited => self.invited += 1,
            DispatchOutcome::RateLimited => self.rate_limited += 1,
            DispatchOutcome::PrivacyRestricted => self.privacy_restricted += 1,
            DispatchOutcome::Failed => self.failed += 1,
        }
    }
}
