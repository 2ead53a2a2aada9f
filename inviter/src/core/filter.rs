//! Candidate selection: ledger exclusions, destination membership and
//! profile predicates

use std::collections::BTreeMap;

use shared::{agent_debug, agent_info, agent_warn, GroupId, MemberRecord};
use crate::core::{predicates, CycleContext, StateLedger};
use crate::traits::{Clock, DirectoryClient, LedgerStore};
use crate::types::{FilterSettings, Rejection};

pub struct CandidateFilter<'a, D: DirectoryClient, C: Clock> {
    ctx: CycleContext<'a, D, C>,
    settings: &'a FilterSettings,
}

impl<'a, D: DirectoryClient, C: Clock> CandidateFilter<'a, D, C> {
    pub fn new(ctx: CycleContext<'a, D, C>, settings: &'a FilterSettings) -> Self {
        Self { ctx, settings }
    }

    /// Members that may be invited into `destination`, in input order
    pub async fn filter<S: LedgerStore>(
        &self,
        members: Vec<MemberRecord>,
        destination: GroupId,
        ledger: &StateLedger<S>,
    ) -> Vec<MemberRecord> {
        let total = members.len();
        let mut rejections: BTreeMap<Rejection, usize> = BTreeMap::new();
        let mut candidates = Vec::new();

        for member in members {
            match self.screen(&member, destination, ledger).await {
                Ok(()) => candidates.push(member),
                Err(rejection) => *rejections.entry(rejection).or_default() += 1,
            }
        }

        for (rejection, count) in &rejections {
            agent_debug!(self.ctx.agent, "Rejected {} member(s): {}", count, rejection);
        }
        agent_info!(self.ctx.agent, "Filtered {} suitable candidates out of {}", candidates.len(), total);
        candidates
    }

    /// Decide on a single member
    pub async fn screen<S: LedgerStore>(
        &self,
        member: &MemberRecord,
        destination: GroupId,
        ledger: &StateLedger<S>,
    ) -> Result<(), Rejection> {
        if ledger.is_processed(member.id) {
            return Err(Rejection::AlreadyProcessed);
        }
        if ledger.is_privacy_restricted(member.id) {
            return Err(Rejection::PrivacyRestricted);
        }

        self.check_membership(member, destination).await?;

        predicates::evaluate(member, self.settings, self.ctx.clock.now())
    }

    async fn check_membership(&self, member: &MemberRecord, destination: GroupId) -> Result<(), Rejection> {
        let ctx = &self.ctx;
        ctx.clock.sleep(ctx.pacing.membership_check_delay).await;

        match ctx.directory.is_member(destination, member.id).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(Rejection::AlreadyMember),
            Err(e) => {
                if e.is_rate_limited() {
                    agent_warn!(
                        ctx.agent,
                        "Rate limited while checking membership of {}, pausing for {:?}",
                        member.id,
                        ctx.pacing.membership_cooldown
                    );
                    ctx.clock.sleep(ctx.pacing.membership_cooldown).await;
                } else {
                    agent_debug!(ctx.agent, "Membership check for {} failed: {}", member.id, e);
                }
                Err(Rejection::MembershipUnknown)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pacing;
    use crate::error::DirectoryError;
    use crate::traits::{MockClock, MockDirectoryClient, MockLedgerStore};
    use crate::types::{LedgerState, RangeFilter};
    use chrono::{DateTime, Local, TimeZone};
    use shared::{AgentId, UserId};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const DESTINATION: GroupId = GroupId(500);

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn clock_recording(sleeps: Arc<Mutex<Vec<Duration>>>) -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().returning(now);
        clock
            .expect_sleep()
            .returning(move |duration| sleeps.lock().unwrap().push(duration));
        clock
    }

    async fn ledger_with(processed: &[u64], privacy: &[u64]) -> StateLedger<MockLedgerStore> {
        let state = LedgerState {
            processed_users: processed.iter().copied().map(UserId).collect(),
            users_with_privacy_restrictions: privacy.iter().copied().map(UserId).collect(),
            ..Default::default()
        };
        let mut store = MockLedgerStore::new();
        store.expect_load().return_once(move || Ok(Some(state)));
        store.expect_save().returning(|_| Ok(()));
        StateLedger::load(store, AgentId::new("filter-test"), now()).await
    }

    async fn run_filter(
        directory: &MockDirectoryClient,
        clock: &MockClock,
        settings: &FilterSettings,
        members: Vec<MemberRecord>,
        ledger: &StateLedger<MockLedgerStore>,
    ) -> Vec<u64> {
        let pacing = Pacing::default();
        let agent = AgentId::new("filter-test");
        let ctx = CycleContext {
            directory,
            clock,
            pacing: &pacing,
            agent: &agent,
        };
        CandidateFilter::new(ctx, settings)
            .filter(members, DESTINATION, ledger)
            .await
            .into_iter()
            .map(|m| m.id.0)
            .collect()
    }

    #[tokio::test]
    async fn test_all_filters_disabled_only_excludes_seen_and_members() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_is_member()
            .returning(|_, user| Ok(user == UserId(4)));
        let clock = clock_recording(Arc::new(Mutex::new(Vec::new())));
        let ledger = ledger_with(&[1], &[2]).await;

        let members = (1..=6).map(MemberRecord::new).collect();
        let result = run_filter(&directory, &clock, &FilterSettings::disabled(), members, &ledger).await;

        assert_eq!(result, vec![3, 5, 6]);
    }

    #[tokio::test]
    async fn test_processed_members_skip_the_remote_check() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_is_member()
            .withf(|group, user| *group == DESTINATION && *user == UserId(2))
            .times(1)
            .returning(|_, _| Ok(false));
        let clock = clock_recording(Arc::new(Mutex::new(Vec::new())));
        let ledger = ledger_with(&[1], &[]).await;

        let members = vec![MemberRecord::new(1), MemberRecord::new(2)];
        let result = run_filter(&directory, &clock, &FilterSettings::disabled(), members, &ledger).await;

        assert_eq!(result, vec![2]);
    }

    #[tokio::test]
    async fn test_membership_errors_reject_the_member() {
        let mut directory = MockDirectoryClient::new();
        directory.expect_is_member().returning(|_, user| match user.0 {
            1 => Err(DirectoryError::Network("timeout".into())),
            _ => Ok(false),
        });
        let clock = clock_recording(Arc::new(Mutex::new(Vec::new())));
        let ledger = ledger_with(&[], &[]).await;

        let members = vec![MemberRecord::new(1), MemberRecord::new(2)];
        let result = run_filter(&directory, &clock, &FilterSettings::disabled(), members, &ledger).await;

        assert_eq!(result, vec![2]);
    }

    #[tokio::test]
    async fn test_rate_limit_pauses_the_pass() {
        let mut directory = MockDirectoryClient::new();
        directory.expect_is_member().returning(|_, user| match user.0 {
            2 => Err(DirectoryError::from_api(9, "Flood control")),
            _ => Ok(false),
        });
        let sleeps = Arc::new(Mutex::new(Vec::new()));
        let clock = clock_recording(sleeps.clone());
        let ledger = ledger_with(&[], &[]).await;

        let members = (1..=3).map(MemberRecord::new).collect();
        let result = run_filter(&directory, &clock, &FilterSettings::disabled(), members, &ledger).await;

        assert_eq!(result, vec![1, 3]);
        let sleeps = sleeps.lock().unwrap();
        assert_eq!(sleeps.iter().filter(|d| **d == Duration::from_secs(600)).count(), 1);
        assert_eq!(sleeps.iter().filter(|d| **d == Duration::from_millis(500)).count(), 3);
    }

    #[tokio::test]
    async fn test_predicates_apply_after_membership_check() {
        let mut directory = MockDirectoryClient::new();
        directory.expect_is_member().returning(|_, _| Ok(false));
        let clock = clock_recording(Arc::new(Mutex::new(Vec::new())));
        let ledger = ledger_with(&[], &[]).await;

        let mut settings = FilterSettings::disabled();
        settings.age = RangeFilter { enabled: true, min: 18, max: 30 };
        settings.has_photo = true;

        let members = vec![
            MemberRecord::new(1).with_photo(true).with_bdate("15.03.1990"),
            MemberRecord::new(2).with_photo(true).with_bdate("15.03.2000"),
            MemberRecord::new(3).with_bdate("15.03.2000"),
            MemberRecord::new(4).with_photo(true).with_bdate("15.03"),
        ];
        let result = run_filter(&directory, &clock, &settings, members, &ledger).await;

        assert_eq!(result, vec![2, 4]);
    }
}
