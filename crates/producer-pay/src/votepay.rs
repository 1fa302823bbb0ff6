//! Vote-pay share accounting
//!
//! Instead of a plain vote-weight ratio, per-vote pay uses a share that
//! combines vote weight with how long it has been held. Claims only drive
//! the update hooks; how the share is later priced is someone else's job.

use crate::records::ProducerVotePayRecord;
use crate::state::VotePayState;
use crate::time::TimePoint;

/// Update hooks for producer and network vote-pay shares
pub trait VotePayShare {
    /// Accrue `vote_weight` into the producer's share up to `now`.
    /// Returns the share as accrued, before any reset.
    fn update_producer_share(
        &self,
        record: &mut ProducerVotePayRecord,
        now: TimePoint,
        vote_weight: f64,
        reset_to_zero: bool,
    ) -> f64;

    /// Fold `share_delta` into the network total and move the total's
    /// accrual rate by `rate_delta`.
    fn update_total_share(
        &self,
        state: &mut VotePayState,
        now: TimePoint,
        share_delta: f64,
        rate_delta: f64,
    );
}

/// Share accrues linearly: weight times seconds held
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousVotePay;

impl VotePayShare for ContinuousVotePay {
    fn update_producer_share(
        &self,
        record: &mut ProducerVotePayRecord,
        now: TimePoint,
        vote_weight: f64,
        reset_to_zero: bool,
    ) -> f64 {
        let mut delta = 0.0;
        if vote_weight > 0.0 && now > record.last_votepay_share_update {
            delta = vote_weight * (now - record.last_votepay_share_update).to_seconds_f64();
        }

        let new_share = record.votepay_share + delta;
        record.votepay_share = if reset_to_zero { 0.0 } else { new_share };
        record.last_votepay_share_update = now;

        new_share
    }

    fn update_total_share(
        &self,
        state: &mut VotePayState,
        now: TimePoint,
        share_delta: f64,
        rate_delta: f64,
    ) {
        if now > state.last_vpay_state_update {
            let elapsed = (now - state.last_vpay_state_update).to_seconds_f64();
            state.total_producer_votepay_share += elapsed * state.total_vpay_share_change_rate;
            state.last_vpay_state_update = now;
        }

        state.total_producer_votepay_share =
            (state.total_producer_votepay_share + share_delta).max(0.0);

        if rate_delta < 0.0 {
            state.total_vpay_share_change_rate =
                (state.total_vpay_share_change_rate + rate_delta).max(0.0);
        } else {
            state.total_vpay_share_change_rate += rate_delta;
        }
    }
}
