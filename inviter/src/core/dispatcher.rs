//! Sending invitations and recording their outcome

use shared::{agent_error, agent_info, agent_warn, GroupId, UserId};
use crate::core::{CycleContext, StateLedger};
use crate::error::FailureKind;
use crate::traits::{Clock, DirectoryClient, LedgerStore};
use crate::types::DispatchOutcome;

pub struct InvitationDispatcher<'a, D: DirectoryClient, C: Clock> {
    ctx: CycleContext<'a, D, C>,
}

impl<'a, D: DirectoryClient, C: Clock> InvitationDispatcher<'a, D, C> {
    pub fn new(ctx: CycleContext<'a, D, C>) -> Self {
        Self { ctx }
    }

    /// Invite `user` into `group` and record the result in the ledger.
    ///
    /// Rate-limited attempts are not recorded, so the user stays eligible;
    /// every other failure marks the user as processed for good.
    pub async fn dispatch<S: LedgerStore>(
        &self,
        group: GroupId,
        user: UserId,
        ledger: &mut StateLedger<S>,
    ) -> DispatchOutcome {
        let ctx = &self.ctx;
        ctx.clock.sleep(ctx.pacing.invite_jitter.sample()).await;

        let error = match ctx.directory.invite(group, user).await {
            Ok(()) => {
                ledger.record_success(user, ctx.clock.now()).await;
                agent_info!(ctx.agent, "Invitation sent to {}", user);
                return DispatchOutcome::Invited;
            }
            Err(e) => e,
        };

        match error.kind() {
            FailureKind::RateLimited => {
                agent_warn!(
                    ctx.agent,
                    "Rate limited while inviting {}: {}; pausing for {:?}",
                    user,
                    error,
                    ctx.pacing.dispatch_cooldown
                );
                ctx.clock.sleep(ctx.pacing.dispatch_cooldown).await;
                DispatchOutcome::RateLimited
            }
            FailureKind::PermissionDenied => {
                agent_info!(ctx.agent, "{} does not accept community invitations", user);
                ledger.record_permanent_skip(user, true, ctx.clock.now()).await;
                DispatchOutcome::PrivacyRestricted
            }
            FailureKind::Other => {
                agent_error!(ctx.agent, "Failed to invite {}: {}", user, error);
                ledger.record_permanent_skip(user, false, ctx.clock.now()).await;
                DispatchOutcome::Failed
            }
        }
    }
}
