//! Invitation pipeline: ledger, fetch, filter and dispatch

pub mod dispatcher;
pub mod fetcher;
pub mod filter;
pub mod ledger;
pub mod predicates;

pub use dispatcher::InvitationDispatcher;
pub use fetcher::MemberFetcher;
pub use filter::CandidateFilter;
pub use ledger::StateLedger;

use shared::AgentId;
use crate::config::Pacing;
use crate::traits::{Clock, DirectoryClient};

/// Collaborators every pipeline stage needs during one cycle
pub struct CycleContext<'a, D: DirectoryClient, C: Clock> {
    pub directory: &'a D,
    pub clock: &'a C,
    pub pacing: &'a Pacing,
    pub agent: &'a AgentId,
}

// Manual impls: the context only holds references, so it is copyable
// whatever `D` and `C` are.
impl<D: DirectoryClient, C: Clock> Clone for CycleContext<'_, D, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: DirectoryClient, C: Clock> Copy for CycleContext<'_, D, C> {}
