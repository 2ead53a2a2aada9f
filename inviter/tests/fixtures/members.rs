//! Member factories

use chrono::{DateTime, Duration, Local};

use shared::MemberRecord;

/// A member every default filter accepts
pub fn active_member(id: u64, now: DateTime<Local>) -> MemberRecord {
    MemberRecord::new(id)
        .with_sex(1)
        .with_bdate("15.03.1995")
        .with_city(1)
        .with_photo(true)
        .with_last_seen((now - Duration::days(2)).timestamp())
}

/// `count` active members with consecutive ids starting at `first`
pub fn active_members(first: u64, count: u64, now: DateTime<Local>) -> Vec<MemberRecord> {
    (first..first + count).map(|id| active_member(id, now)).collect()
}
