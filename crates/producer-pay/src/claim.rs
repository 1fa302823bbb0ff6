//! Reward claims
//!
//! A claim pays every stake slot of a producer that has waited out the
//! cooldown. Each slot accrues in proportion to the time since it was last
//! paid, scaled by its value and the producer's role:
//!
//! ```text
//! time_mul = (now - last_pay) / 30 days        (not capped)
//! reward   = floor(time_mul * value * role_mul)   role_mul: validator 7, node 6
//! fee      = floor(fees * reward)               kept by the producer
//! net      = reward - fee                       paid to the stake holder
//! ```
//!
//! The claim is planned against owned copies of the producer's records;
//! nothing reaches `ChainState` until `ClaimPlan::commit`, and a plan that
//! issues no tokens is never committed.

use crate::asset::{Asset, Symbol};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::name::Name;
use crate::records::{ProducerExtraRecord, ProducerRecord, ProducerVotePayRecord};
use crate::state::{ChainState, VotePayState};
use crate::tables::RankedTable;
use crate::time::{Microseconds, TimePoint};
use crate::token::{TokenAction, MEMO_FEE, MEMO_ISSUE, MEMO_STAKE_PAYMENT};
use crate::votepay::VotePayShare;
use crate::{REWARD_PERIOD, SLOT_PAY_COOLDOWN, VOTEPAY_SHARE_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Producer role, by stake ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Within the top seats by total stake
    Validator,
    Node,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Validator => write!(f, "validator"),
            Role::Node => write!(f, "node"),
        }
    }
}

/// Claim parameters taken from the deployment config
#[derive(Debug, Clone, Copy)]
pub struct RewardParams {
    pub validator_multiplier: i64,
    pub node_multiplier: i64,
    pub validator_seats: usize,
    pub payment_lockdown: TimePoint,
}

impl RewardParams {
    pub fn multiplier(&self, role: Role) -> i64 {
        match role {
            Role::Validator => self.validator_multiplier,
            Role::Node => self.node_multiplier,
        }
    }
}

impl From<&Config> for RewardParams {
    fn from(config: &Config) -> Self {
        Self {
            validator_multiplier: config.validator_multiplier,
            node_multiplier: config.node_multiplier,
            validator_seats: config.validator_seats,
            payment_lockdown: config.payment_lockdown,
        }
    }
}

/// A producer is a validator if it holds one of the top `seats` by total
/// stake. Records without positive stake do not take a seat.
pub fn classify(extras: &RankedTable<ProducerExtraRecord>, owner: Name, seats: usize) -> Role {
    let seated = extras
        .ranked()
        .filter(|extra| extra.total_stake > 0)
        .take(seats)
        .any(|extra| extra.owner == owner);

    if seated {
        Role::Validator
    } else {
        Role::Node
    }
}

/// Reward accrued by one slot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accrual {
    pub time_mul: f64,
    /// Gross reward, fee included
    pub reward: i64,
    pub fee: i64,
    /// Paid to the stake holder
    pub net: i64,
}

/// Gross reward, fee and net for a slot of `value` unpaid for `elapsed`.
/// Each real-to-integer step truncates and the remainder is dropped.
pub fn accrue(value: i64, elapsed: Microseconds, multiplier: i64, fees: f64) -> Result<Accrual> {
    let time_mul = elapsed.count() as f64 / REWARD_PERIOD.count() as f64;
    let gross = value
        .checked_mul(multiplier)
        .ok_or(Error::Overflow("slot reward"))?;

    if gross <= 0 || time_mul <= 0.0 {
        return Ok(Accrual {
            time_mul,
            ..Default::default()
        });
    }

    let reward = (time_mul * gross as f64) as i64;
    let fee = (fees * reward as f64) as i64;

    Ok(Accrual {
        time_mul,
        reward,
        fee,
        net: reward - fee,
    })
}

/// Net reward owed to one stake holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub stake_holder: Name,
    pub amount: i64,
}

/// Observable result of a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub owner: Name,
    pub role: Role,
    /// Tokens issued: all fees plus all payouts
    pub issued: i64,
    /// Fees transferred to the producer
    pub fee: i64,
    pub payouts: Vec<Payout>,
    /// Slots still in cooldown
    pub skipped_slots: usize,
}

impl ClaimReceipt {
    pub fn is_empty(&self) -> bool {
        self.issued == 0
    }
}

/// A computed claim, not yet applied
#[derive(Debug, Clone)]
pub struct ClaimPlan {
    pub owner: Name,
    pub role: Role,
    pub now: TimePoint,
    producer: ProducerRecord,
    votepay: ProducerVotePayRecord,
    extra: ProducerExtraRecord,
    vpay: VotePayState,
    new_tokens: i64,
    fee_total: i64,
    payouts: Vec<Payout>,
    skipped_slots: usize,
}

/// Compute a reward claim for `owner` at `now`.
///
/// Fails if payments are locked down, the producer is unknown or has no
/// active key, or `now` is earlier than its last claim. Slots paid within
/// the cooldown are skipped.
pub fn plan_claim(
    state: &ChainState,
    params: &RewardParams,
    votepay: &dyn VotePayShare,
    owner: Name,
    now: TimePoint,
) -> Result<ClaimPlan> {
    if now >= params.payment_lockdown {
        return Err(Error::PaymentsLocked(params.payment_lockdown.to_rfc3339()));
    }

    let producer = state.producer(owner)?.clone();
    if !producer.active {
        return Err(Error::InactiveProducer(owner));
    }
    if now < producer.last_claim_time {
        return Err(Error::ClockRegression {
            now: now.to_rfc3339(),
            last: producer.last_claim_time.to_rfc3339(),
        });
    }

    info!(
        "claiming rewards for {} (chain activated: {})",
        owner,
        state.global.is_activated()
    );

    let role = classify(&state.extras, owner, params.validator_seats);
    debug!("{} is a {}", owner, role);

    // vote-pay share: weight counts once the record is stale past the
    // threshold, otherwise it moves into the network rate
    let threshold = producer.last_claim_time + VOTEPAY_SHARE_THRESHOLD;
    let (mut votepay_record, updated_after_threshold) = match state.votepay.get(owner) {
        Some(record) => (record.clone(), threshold <= record.last_votepay_share_update),
        None => (ProducerVotePayRecord::new(owner, now), true),
    };

    let mut vpay = state.vpay.clone();
    let share_weight = if updated_after_threshold { 0.0 } else { producer.total_votes };
    let rate_delta = if updated_after_threshold { producer.total_votes } else { 0.0 };
    let new_share = votepay.update_producer_share(&mut votepay_record, now, share_weight, true);
    votepay.update_total_share(&mut vpay, now, -new_share, rate_delta);

    let mut extra = state
        .extras
        .get(owner)
        .cloned()
        .unwrap_or_else(|| ProducerExtraRecord::new(owner));
    ProducerExtraRecord::validate_fees(extra.fees)?;

    let multiplier = params.multiplier(role);
    let mut new_tokens = 0i64;
    let mut fee_total = 0i64;
    let mut payouts = Vec::new();
    let mut skipped_slots = 0;

    debug!("checking {} slots", extra.slots.len());
    for slot in extra.slots.iter_mut() {
        let elapsed = now - slot.last_pay;
        if elapsed < SLOT_PAY_COOLDOWN {
            debug!("slot {}: paid within the past 3 hours, skipped", slot.stake_holder);
            skipped_slots += 1;
            continue;
        }

        let accrual = accrue(slot.value, elapsed, multiplier, extra.fees)?;
        debug!(
            "slot {}: stake {}, elapsed {}ms, time_mul {:.6}, reward {}, fee {}",
            slot.stake_holder,
            slot.value,
            elapsed.count() / 1000,
            accrual.time_mul,
            accrual.reward,
            accrual.fee,
        );

        fee_total = fee_total
            .checked_add(accrual.fee)
            .ok_or(Error::Overflow("claim fee total"))?;
        new_tokens = new_tokens
            .checked_add(accrual.reward)
            .ok_or(Error::Overflow("claim issue total"))?;

        if accrual.net > 0 {
            payouts.push(Payout {
                stake_holder: slot.stake_holder,
                amount: accrual.net,
            });
        }
        if accrual.reward > 0 {
            slot.last_pay = now;
        }
    }

    Ok(ClaimPlan {
        owner,
        role,
        now,
        producer,
        votepay: votepay_record,
        extra,
        vpay,
        new_tokens,
        fee_total,
        payouts,
        skipped_slots,
    })
}

impl ClaimPlan {
    /// Nothing to issue; the plan must not be committed
    pub fn is_noop(&self) -> bool {
        self.new_tokens == 0
    }

    pub fn new_tokens(&self) -> i64 {
        self.new_tokens
    }

    pub fn fee_total(&self) -> i64 {
        self.fee_total
    }

    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    /// Issue to `system`, then the producer fee, then each stake holder
    pub fn token_actions(&self, system: Name, symbol: Symbol) -> Vec<TokenAction> {
        if self.is_noop() {
            return Vec::new();
        }

        let mut actions = Vec::with_capacity(self.payouts.len() + 2);
        actions.push(TokenAction::Issue {
            to: system,
            quantity: Asset::new(self.new_tokens, symbol),
            memo: MEMO_ISSUE.to_string(),
        });

        if self.fee_total > 0 {
            actions.push(TokenAction::Transfer {
                from: system,
                to: self.owner,
                quantity: Asset::new(self.fee_total, symbol),
                memo: MEMO_FEE.to_string(),
            });
        }

        for payout in &self.payouts {
            actions.push(TokenAction::Transfer {
                from: system,
                to: payout.stake_holder,
                quantity: Asset::new(payout.amount, symbol),
                memo: MEMO_STAKE_PAYMENT.to_string(),
            });
        }

        actions
    }

    pub fn receipt(&self) -> ClaimReceipt {
        ClaimReceipt {
            owner: self.owner,
            role: self.role,
            issued: self.new_tokens,
            fee: self.fee_total,
            payouts: self.payouts.clone(),
            skipped_slots: self.skipped_slots,
        }
    }

    /// Write the claim back: stamp the claim time, sort slots (largest
    /// first) and replace the stored records.
    pub fn commit(self, state: &mut ChainState) {
        let ClaimPlan {
            owner,
            now,
            mut producer,
            votepay,
            mut extra,
            vpay,
            new_tokens,
            ..
        } = self;

        producer.last_claim_time = now;
        extra.slots.sort_by(|a, b| b.cmp(a));

        state.producers.upsert(producer);
        state.votepay.upsert(votepay);
        state.extras.upsert(extra);
        state.vpay = vpay;

        info!("{} claimed: {} tokens issued", owner, new_tokens);
    }
}
