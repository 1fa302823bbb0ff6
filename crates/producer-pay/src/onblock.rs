//! Block production tracking and periodic maintenance
//!
//! Every block credits its producer with one unpaid block. About once a
//! minute the block also runs maintenance: the producer schedule is
//! recomputed and, at most once a day, a stale top name bid is closed.
//!
//! ```text
//! block ──► mirror timestamp ──► start presses (once) ──► credit producer
//!                                                              │
//!                                    ≥ 120 slots since last? ──┤
//!                                                              ▼
//!                                        update schedule, maybe close bid
//! ```

use crate::host::{BidProceedsSink, ScheduleUpdater};
use crate::name::Name;
use crate::state::{ChainState, GlobalState};
use crate::time::{BlockTimestamp, TimePoint};
use crate::{
    ACTIVATION_NAME_DELAY, NAME_BID_IDLE_TIME, NAME_CLOSE_INTERVAL_SLOTS,
    SCHEDULE_UPDATE_INTERVAL_SLOTS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Block header fields consumed by block tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub timestamp: BlockTimestamp,
    pub producer: Name,
}

/// A name auction closed during maintenance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedBid {
    pub name: Name,
    pub amount: i64,
}

/// What a block changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Producer was registered and credited
    pub credited: bool,
    /// Maintenance ran on this block
    pub maintenance: bool,
    pub closed_bid: Option<ClosedBid>,
}

/// Record one produced block and run maintenance if its window is open.
pub fn process_block<S, R>(
    state: &mut ChainState,
    now: TimePoint,
    header: &BlockHeader,
    schedule: &mut S,
    rex: &mut R,
) -> BlockOutcome
where
    S: ScheduleUpdater + ?Sized,
    R: BidProceedsSink + ?Sized,
{
    let mut outcome = BlockOutcome {
        credited: record_block(state, now, header),
        ..Default::default()
    };

    if maintenance_due(&state.global, header.timestamp) {
        outcome.maintenance = true;
        outcome.closed_bid = run_maintenance(state, now, header.timestamp, schedule, rex);
    }

    outcome
}

/// Credit the block to its producer. Returns `false` for producers with no
/// record (bootstrap producers), which are skipped.
pub fn record_block(state: &mut ChainState, now: TimePoint, header: &BlockHeader) -> bool {
    // deprecated, kept up to date for readers of the old field
    state.global_ext.last_block_num = header.timestamp;

    if state.global.last_pervote_bucket_fill.is_unset() {
        // start the presses
        state.global.last_pervote_bucket_fill = now;
        info!("first block seen, reward accrual starts at {}", now);
    }

    let credited = state
        .producers
        .modify(header.producer, |producer| producer.unpaid_blocks += 1);

    if credited {
        state.global.total_unpaid_blocks += 1;
    } else {
        debug!("block producer {} is not registered, not credited", header.producer);
    }
    credited
}

/// Maintenance runs once at least 120 half-second slots (a minute) have
/// passed since the last run.
pub fn maintenance_due(global: &GlobalState, timestamp: BlockTimestamp) -> bool {
    timestamp.slots_since(global.last_producer_schedule_update) >= SCHEDULE_UPDATE_INTERVAL_SLOTS
}

/// Recompute the schedule and close the top name bid if it has gone stale.
pub fn run_maintenance<S, R>(
    state: &mut ChainState,
    now: TimePoint,
    timestamp: BlockTimestamp,
    schedule: &mut S,
    rex: &mut R,
) -> Option<ClosedBid>
where
    S: ScheduleUpdater + ?Sized,
    R: BidProceedsSink + ?Sized,
{
    // re-arm the gate before anything else can observe it
    state.global.last_producer_schedule_update = timestamp;
    schedule.update_elected_producers(timestamp);

    if timestamp.slots_since(state.global.last_name_close) < NAME_CLOSE_INTERVAL_SLOTS {
        return None;
    }

    let name = closable_bid(state, now)?;
    let mut amount = 0;
    state.name_bids.modify(name, |bid| {
        amount = bid.high_bid;
        bid.high_bid = -bid.high_bid;
    });

    state.global.last_name_close = timestamp;
    rex.receive_bid_proceeds(amount);

    info!("closed name auction for {} at {} (bid {})", name, timestamp, amount);
    Some(ClosedBid { name, amount })
}

/// The highest bid, if it is open, idle for a day, and the chain has been
/// active for two weeks.
pub fn closable_bid(state: &ChainState, now: TimePoint) -> Option<Name> {
    let highest = state.name_bids.highest()?;
    let global = &state.global;

    let closable = highest.is_open()
        && now - highest.last_bid_time >= NAME_BID_IDLE_TIME
        && global.is_activated()
        && now - global.thresh_activated_stake_time >= ACTIVATION_NAME_DELAY;

    closable.then_some(highest.new_name)
}
