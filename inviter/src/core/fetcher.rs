//! Paged retrieval of a community's member list

use rand::seq::SliceRandom;

use shared::{agent_debug, agent_error, agent_info, agent_warn, GroupId, MemberRecord};
use crate::core::CycleContext;
use crate::traits::{Clock, DirectoryClient};

/// Largest page `groups.getMembers` returns
pub const PAGE_SIZE: u32 = 1000;

pub struct MemberFetcher<'a, D: DirectoryClient, C: Clock> {
    ctx: CycleContext<'a, D, C>,
}

impl<'a, D: DirectoryClient, C: Clock> MemberFetcher<'a, D, C> {
    pub fn new(ctx: CycleContext<'a, D, C>) -> Self {
        Self { ctx }
    }

    /// Collect up to `cap` members of `group`.
    ///
    /// Stops at the first empty page, at `cap`, or once the reported member
    /// count is covered. A failed request ends the walk and whatever was
    /// collected so far is returned; captcha/flood failures also wait out the
    /// fetch cooldown first.
    pub async fn fetch(&self, group: GroupId, cap: usize, shuffle: bool) -> Vec<MemberRecord> {
        let ctx = &self.ctx;
        let mut members: Vec<MemberRecord> = Vec::new();
        if cap == 0 {
            return members;
        }

        agent_info!(ctx.agent, "Fetching members of {} (up to {})", group, cap);
        let mut offset: u32 = 0;

        loop {
            ctx.clock.sleep(ctx.pacing.page_delay).await;

            let page = match ctx.directory.list_members(group, offset, PAGE_SIZE).await {
                Ok(page) => page,
                Err(e) => {
                    agent_error!(ctx.agent, "Failed to fetch members of {} at offset {}: {}", group, offset, e);
                    if e.is_rate_limited() {
                        agent_warn!(
                            ctx.agent,
                            "Rate limited while fetching members, pausing for {:?}",
                            ctx.pacing.fetch_cooldown
                        );
                        ctx.clock.sleep(ctx.pacing.fetch_cooldown).await;
                    }
                    break;
                }
            };

            if page.items.is_empty() {
                break;
            }

            agent_debug!(ctx.agent, "Page at offset {}: {} members (community total {})", offset, page.items.len(), page.count);
            members.extend(page.items);
            offset = offset.saturating_add(PAGE_SIZE);

            if members.len() >= cap || u64::from(offset) >= page.count {
                break;
            }

            ctx.clock.sleep(ctx.pacing.between_pages).await;
        }

        members.truncate(cap);
        if shuffle {
            members.shuffle(&mut rand::thread_rng());
        }

        agent_info!(ctx.agent, "Fetched {} members from {}", members.len(), group);
        members
    }
}
