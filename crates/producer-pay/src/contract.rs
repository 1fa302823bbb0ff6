//! System contract entry points
//!
//! `SystemContract` owns the chain state and its collaborators for the
//! duration of an invocation. Each entry point checks authorization first
//! and either applies all of its effects or none of them.

use crate::claim::{plan_claim, ClaimReceipt, RewardParams};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::host::{BidProceedsSink, NullSchedule, RexPool, ScheduleUpdater};
use crate::name::Name;
use crate::onblock::{process_block, BlockHeader, BlockOutcome};
use crate::state::ChainState;
use crate::time::TimePoint;
use crate::token::TokenLedger;
use crate::votepay::{ContinuousVotePay, VotePayShare};
use tracing::{debug, info, warn};

/// Invocation context: current time and the accounts that signed
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContext {
    pub now: TimePoint,
    pub authorizations: Vec<Name>,
}

impl ActionContext {
    pub fn new(now: TimePoint) -> Self {
        Self {
            now,
            authorizations: Vec::new(),
        }
    }

    /// Context signed by the system account
    pub fn system(now: TimePoint, system: Name) -> Self {
        Self::new(now).with_auth(system)
    }

    pub fn with_auth(mut self, account: Name) -> Self {
        self.authorizations.push(account);
        self
    }

    pub fn require_auth(&self, account: Name) -> Result<()> {
        if self.authorizations.contains(&account) {
            Ok(())
        } else {
            Err(Error::MissingAuthority(account))
        }
    }
}

pub struct SystemContract<T, S = NullSchedule, R = RexPool> {
    config: Config,
    state: ChainState,
    token: T,
    schedule: S,
    rex: R,
    votepay: Box<dyn VotePayShare>,
}

impl<T: TokenLedger> SystemContract<T> {
    pub fn new(config: Config, state: ChainState, token: T) -> Self {
        Self::with_collaborators(config, state, token, NullSchedule, RexPool::default())
    }
}

impl<T, S, R> SystemContract<T, S, R>
where
    T: TokenLedger,
    S: ScheduleUpdater,
    R: BidProceedsSink,
{
    pub fn with_collaborators(
        config: Config,
        state: ChainState,
        token: T,
        schedule: S,
        rex: R,
    ) -> Self {
        Self {
            config,
            state,
            token,
            schedule,
            rex,
            votepay: Box::new(ContinuousVotePay),
        }
    }

    /// Replace the vote-pay share hooks
    pub fn with_votepay(mut self, votepay: Box<dyn VotePayShare>) -> Self {
        self.votepay = votepay;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn into_parts(self) -> (ChainState, T, S, R) {
        (self.state, self.token, self.schedule, self.rex)
    }

    /// Process one produced block. Requires the system account.
    pub fn on_block(&mut self, ctx: &ActionContext, header: &BlockHeader) -> Result<BlockOutcome> {
        ctx.require_auth(self.config.system_account)?;

        Ok(process_block(
            &mut self.state,
            ctx.now,
            header,
            &mut self.schedule,
            &mut self.rex,
        ))
    }

    /// Pay out the stake slots of `owner`. Requires the owner.
    ///
    /// A claim that accrues nothing returns an empty receipt and changes
    /// nothing. Otherwise the token batch is applied first and the claim
    /// records are only written back once it succeeds.
    pub fn claim_rewards(&mut self, ctx: &ActionContext, owner: Name) -> Result<ClaimReceipt> {
        ctx.require_auth(owner)?;

        let params = RewardParams::from(&self.config);
        let plan = plan_claim(&self.state, &params, self.votepay.as_ref(), owner, ctx.now)
            .inspect_err(|e| warn!("claim by {} refused: {}", owner, e))?;

        if plan.is_noop() {
            info!("{} has nothing to claim", owner);
            return Ok(plan.receipt());
        }

        let actions = plan.token_actions(self.config.system_account, self.config.reward_symbol);
        debug!(
            "sending {} token actions for {} to {}",
            actions.len(),
            owner,
            self.config.token_account
        );
        self.token
            .apply(&actions)
            .inspect_err(|e| warn!("token transfers for {} failed: {}", owner, e))?;

        let receipt = plan.receipt();
        plan.commit(&mut self.state);
        Ok(receipt)
    }
}
