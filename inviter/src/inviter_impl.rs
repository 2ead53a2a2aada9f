//! Inviter implementation with dependency injection

use shared::{agent_debug, agent_error, agent_info, logging, AgentId, GroupId, GroupRef};
use crate::config::InviterConfig;
use crate::core::{CandidateFilter, CycleContext, InvitationDispatcher, MemberFetcher, StateLedger};
use crate::traits::{Clock, DirectoryClient, LedgerStore};
use crate::types::{CycleOutcome, CycleReport};

/// Invitation agent: one ledger, one directory, one clock
pub struct Inviter<D, S, C>
where
    D: DirectoryClient,
    S: LedgerStore,
    C: Clock,
{
    config: InviterConfig,
    agent: AgentId,
    ledger: StateLedger<S>,
    directory: D,
    clock: C,
}

impl<D, S, C> Inviter<D, S, C>
where
    D: DirectoryClient,
    S: LedgerStore,
    C: Clock,
{
    /// Create a new inviter and load its ledger
    pub async fn new(config: InviterConfig, directory: D, store: S, clock: C) -> Self {
        let agent = AgentId::for_groups(&config.target_group, &config.destination_group);
        let ledger = StateLedger::load(store, agent.clone(), clock.now()).await;

        Self {
            config,
            agent,
            ledger,
            directory,
            clock,
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn config(&self) -> &InviterConfig {
        &self.config
    }

    pub fn ledger(&self) -> &StateLedger<S> {
        &self.ledger
    }

    fn context(&self) -> CycleContext<'_, D, C> {
        CycleContext {
            directory: &self.directory,
            clock: &self.clock,
            pacing: &self.config.pacing,
            agent: &self.agent,
        }
    }

    /// Numeric references resolve locally, screen names through the directory
    async fn resolve(&self, group: &GroupRef) -> Option<GroupId> {
        if let Some(id) = group.as_id() {
            return Some(id);
        }

        self.clock.sleep(self.config.pacing.resolve_delay).await;
        match self.directory.resolve_group(group).await {
            Ok(id) => {
                agent_debug!(self.agent, "Resolved {} to {}", group, id);
                Some(id)
            }
            Err(e) => {
                agent_error!(self.agent, "Cannot resolve community {}: {}", group, e);
                None
            }
        }
    }

    async fn resolve_groups(&self) -> Option<(GroupId, GroupId)> {
        let target = self.resolve(&self.config.target_group).await?;
        let destination = self.resolve(&self.config.destination_group).await?;
        Some((target, destination))
    }

    fn remaining_quota(&self) -> u32 {
        self.config
            .max_invites_per_day
            .saturating_sub(self.ledger.invites_today())
    }

    /// Run one invitation cycle. Failures end the cycle early and are
    /// reflected in the report; nothing is returned as an error.
    pub async fn run_cycle(&mut self) -> CycleReport {
        logging::log_progress(&self.agent, "Cycle", "starting");
        self.ledger.reset_daily_counter_if_needed(self.clock.now()).await;

        if self.remaining_quota() == 0 {
            agent_info!(
                self.agent,
                "Daily limit reached ({}/{}), skipping cycle",
                self.ledger.invites_today(),
                self.config.max_invites_per_day
            );
            return CycleReport::stopped(CycleOutcome::QuotaReached);
        }

        let Some((target, destination)) = self.resolve_groups().await else {
            return CycleReport::stopped(CycleOutcome::GroupUnresolved);
        };

        let members = MemberFetcher::new(self.context())
            .fetch(target, self.config.fetch_cap, self.config.shuffle_members)
            .await;
        let mut report = CycleReport::stopped(CycleOutcome::NoMembers);
        report.fetched = members.len();
        if members.is_empty() {
            agent_info!(self.agent, "No members fetched from {}", target);
            return report;
        }

        let candidates = CandidateFilter::new(self.context(), &self.config.filters)
            .filter(members, destination, &self.ledger)
            .await;
        report.candidates = candidates.len();
        if candidates.is_empty() {
            agent_info!(self.agent, "No suitable candidates this cycle");
            report.outcome = CycleOutcome::NoCandidates;
            return report;
        }

        let batch = candidates
            .len()
            .min(self.remaining_quota() as usize)
            .min(self.config.invites_per_run as usize);
        report.planned = batch;
        report.outcome = CycleOutcome::Completed;
        agent_info!(self.agent, "Inviting {} of {} candidates into {}", batch, candidates.len(), destination);

        self.dispatch_batch(destination, &candidates[..batch], &mut report).await;

        agent_info!(
            self.agent,
            "Cycle finished: {} invited, {} privacy restricted, {} rate limited, {} failed",
            report.invited,
            report.privacy_restricted,
            report.rate_limited,
            report.failed
        );
        agent_info!(
            self.agent,
            "Today {}/{}, total {}, privacy restricted users on record {}",
            self.ledger.invites_today(),
            self.config.max_invites_per_day,
            self.ledger.total_invites_sent(),
            self.ledger.privacy_restricted_count()
        );
        report
    }

    async fn dispatch_batch(&mut self, destination: GroupId, batch: &[shared::MemberRecord], report: &mut CycleReport) {
        let ctx = CycleContext {
            directory: &self.directory,
            clock: &self.clock,
            pacing: &self.config.pacing,
            agent: &self.agent,
        };
        let dispatcher = InvitationDispatcher::new(ctx);

        for (index, member) in batch.iter().enumerate() {
            let outcome = dispatcher.dispatch(destination, member.id, &mut self.ledger).await;
            report.count(outcome);

            if index + 1 < batch.len() {
                let delay = self.config.invite_delay.sample();
                agent_debug!(self.agent, "Waiting {:?} before the next invitation", delay);
                self.clock.sleep(delay).await;
            }
        }
    }

    /// Run cycles back to back with a random pause in between.
    /// `None` runs until the task is cancelled. Returns the number of cycles run.
    pub async fn run_scheduled(&mut self, cycles: Option<u64>) -> u64 {
        logging::log_startup(&self.agent, "scheduled invitation cycles");
        let mut completed: u64 = 0;

        loop {
            let report = self.run_cycle().await;
            completed += 1;
            agent_debug!(self.agent, "Cycle {} ended with {:?}", completed, report.outcome);

            if cycles.is_some_and(|limit| completed >= limit) {
                break;
            }

            let pause = self.config.cycle_interval.sample();
            agent_info!(self.agent, "Next cycle in {:.1} hours", pause.as_secs_f64() / 3600.0);
            self.clock.sleep(pause).await;
        }

        logging::log_success(&self.agent, &format!("Ran {completed} cycle(s)"));
        completed
    }
}
