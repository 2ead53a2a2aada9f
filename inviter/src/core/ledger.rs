//! Invitation ledger: daily quota bookkeeping and the never-retry sets
//!
//! Every mutation is written through to the [`LedgerStore`] immediately. A
//! failed write is logged and otherwise ignored; the in-memory copy stays
//! authoritative for the rest of the process.

use std::collections::HashSet;

use chrono::{DateTime, Local};

use shared::{agent_error, agent_info, agent_warn, AgentId, UserId};
use crate::traits::LedgerStore;
use crate::types::LedgerState;

pub struct StateLedger<S: LedgerStore> {
    state: LedgerState,
    processed: HashSet<UserId>,
    privacy_restricted: HashSet<UserId>,
    store: S,
    agent: AgentId,
}

impl<S: LedgerStore> StateLedger<S> {
    /// Load the stored ledger. A missing ledger is created and written right
    /// away; an unreadable one is replaced by an empty ledger on the next save.
    pub async fn load(store: S, agent: AgentId, now: DateTime<Local>) -> Self {
        let (state, needs_save) = match store.load().await {
            Ok(Some(mut state)) => {
                let repaired = Self::restore_invariants(&mut state);
                if repaired {
                    agent_warn!(agent, "Ledger listed privacy-restricted users missing from processed users, repaired");
                }
                (state, repaired)
            }
            Ok(None) => {
                agent_info!(agent, "No ledger found, starting a new one");
                (LedgerState::default(), true)
            }
            Err(e) => {
                agent_error!(agent, "Cannot load ledger, starting empty: {}", e);
                (LedgerState::default(), false)
            }
        };

        let mut ledger = Self::from_state(state, store, agent);
        if needs_save {
            ledger.persist(now).await;
        }
        ledger
    }

    fn from_state(state: LedgerState, store: S, agent: AgentId) -> Self {
        let processed = state.processed_users.iter().copied().collect();
        let privacy_restricted = state.users_with_privacy_restrictions.iter().copied().collect();
        Self {
            state,
            processed,
            privacy_restricted,
            store,
            agent,
        }
    }

    /// Every privacy-restricted user must also be processed
    fn restore_invariants(state: &mut LedgerState) -> bool {
        let processed: HashSet<UserId> = state.processed_users.iter().copied().collect();
        let missing: Vec<UserId> = state
            .users_with_privacy_restrictions
            .iter()
            .copied()
            .filter(|user| !processed.contains(user))
            .collect();
        let repaired = !missing.is_empty();
        state.processed_users.extend(missing);
        repaired
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn invites_today(&self) -> u32 {
        self.state.invites_today
    }

    pub fn total_invites_sent(&self) -> u64 {
        self.state.total_invites_sent
    }

    pub fn is_processed(&self, user: UserId) -> bool {
        self.processed.contains(&user)
    }

    pub fn is_privacy_restricted(&self, user: UserId) -> bool {
        self.privacy_restricted.contains(&user)
    }

    pub fn privacy_restricted_count(&self) -> usize {
        self.privacy_restricted.len()
    }

    /// Write the full ledger, stamping the activity time
    pub async fn save(&mut self, now: DateTime<Local>) -> bool {
        self.persist(now).await
    }

    /// Zero today's counter when the last invitation happened on another day.
    /// Returns whether the counter was reset.
    pub async fn reset_daily_counter_if_needed(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        match self.state.last_invite_date {
            Some(last) if last != today => {
                agent_info!(self.agent, "New day ({} -> {}), resetting daily invitation counter", last, today);
                self.state.invites_today = 0;
                self.persist(now).await;
                true
            }
            _ => false,
        }
    }

    pub async fn record_success(&mut self, user: UserId, now: DateTime<Local>) {
        self.state.total_invites_sent += 1;
        self.state.invites_today += 1;
        self.state.last_invite_date = Some(now.date_naive());
        self.mark_processed(user);
        self.persist(now).await;
    }

    /// Never retry `user`; counters are left alone
    pub async fn record_permanent_skip(&mut self, user: UserId, privacy_restricted: bool, now: DateTime<Local>) {
        if privacy_restricted && self.privacy_restricted.insert(user) {
            self.state.users_with_privacy_restrictions.push(user);
        }
        self.mark_processed(user);
        self.persist(now).await;
    }

    fn mark_processed(&mut self, user: UserId) {
        if self.processed.insert(user) {
            self.state.processed_users.push(user);
        }
    }

    async fn persist(&mut self, now: DateTime<Local>) -> bool {
        self.state.last_activity_time = Some(now.naive_local());
        match self.store.save(&self.state).await {
            Ok(()) => true,
            Err(e) => {
                agent_error!(self.agent, "Failed to save ledger: {}", e);
                false
            }
        }
    }
}
