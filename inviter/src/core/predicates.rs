//! Profile predicates of the candidate filter
//!
//! Each predicate looks at one member and answers [`PredicateOutcome`].
//! Missing data is `Inapplicable` and never rejects, except for the photo
//! predicate which requires a positive flag.

use chrono::{DateTime, Local, NaiveDate};

use shared::MemberRecord;
use crate::types::{FilterSettings, PredicateOutcome, RangeFilter, Rejection, ValueFilter};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Age in whole years from a `D.M.YYYY` birth date; partial dates give `None`.
/// A year is counted as 365 days.
pub fn age_in_years(bdate: &str, today: NaiveDate) -> Option<i64> {
    if bdate.split('.').count() != 3 {
        return None;
    }
    let birth = NaiveDate::parse_from_str(bdate, "%d.%m.%Y").ok()?;
    Some((today - birth).num_days().div_euclid(365))
}

/// Whole days since the member was last online
pub fn days_since_seen(last_seen: i64, now: DateTime<Local>) -> i64 {
    (now.timestamp() - last_seen).div_euclid(SECONDS_PER_DAY)
}

pub fn age(member: &MemberRecord, filter: &RangeFilter, today: NaiveDate) -> PredicateOutcome {
    match member.bdate.as_deref().and_then(|bdate| age_in_years(bdate, today)) {
        Some(years) if years < i64::from(filter.min) || years > i64::from(filter.max) => PredicateOutcome::Fail,
        Some(_) => PredicateOutcome::Pass,
        None => PredicateOutcome::Inapplicable,
    }
}

pub fn sex(member: &MemberRecord, filter: &ValueFilter<u8>) -> PredicateOutcome {
    if filter.value == 0 {
        return PredicateOutcome::Pass;
    }
    match member.sex {
        None | Some(0) => PredicateOutcome::Inapplicable,
        Some(sex) if sex == filter.value => PredicateOutcome::Pass,
        Some(_) => PredicateOutcome::Fail,
    }
}

pub fn city(member: &MemberRecord, filter: &ValueFilter<u64>) -> PredicateOutcome {
    match &member.city {
        None => PredicateOutcome::Inapplicable,
        Some(city) if city.id == filter.value => PredicateOutcome::Pass,
        Some(_) => PredicateOutcome::Fail,
    }
}

pub fn has_photo(member: &MemberRecord) -> PredicateOutcome {
    match member.has_photo {
        Some(true) => PredicateOutcome::Pass,
        _ => PredicateOutcome::Fail,
    }
}

pub fn last_seen(member: &MemberRecord, filter: &ValueFilter<i64>, now: DateTime<Local>) -> PredicateOutcome {
    match &member.last_seen {
        None => PredicateOutcome::Inapplicable,
        Some(seen) if days_since_seen(seen.time, now) > filter.value => PredicateOutcome::Fail,
        Some(_) => PredicateOutcome::Pass,
    }
}

/// Run every enabled predicate; the first failing one is reported
pub fn evaluate(member: &MemberRecord, filters: &FilterSettings, now: DateTime<Local>) -> Result<(), Rejection> {
    let fails = |outcome: PredicateOutcome| outcome == PredicateOutcome::Fail;

    if filters.last_seen_days.enabled && fails(last_seen(member, &filters.last_seen_days, now)) {
        return Err(Rejection::Inactive);
    }
    if filters.sex.enabled && fails(sex(member, &filters.sex)) {
        return Err(Rejection::Sex);
    }
    if filters.city_id.enabled && fails(city(member, &filters.city_id)) {
        return Err(Rejection::City);
    }
    if filters.has_photo && fails(has_photo(member)) {
        return Err(Rejection::NoPhoto);
    }
    if filters.age.enabled && fails(age(member, &filters.age, now.date_naive())) {
        return Err(Rejection::Age);
    }
    Ok(())
}
