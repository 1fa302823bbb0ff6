//! Maintenance collaborators
//!
//! Producer schedule recomputation and name-bid proceeds are owned by other
//! subsystems. Block processing only calls into them.

use crate::time::BlockTimestamp;
use serde::{Deserialize, Serialize};

/// Recomputes the active producer schedule
pub trait ScheduleUpdater {
    fn update_elected_producers(&mut self, timestamp: BlockTimestamp);
}

/// Receives the proceeds of a closed name auction
pub trait BidProceedsSink {
    fn receive_bid_proceeds(&mut self, amount: i64);
}

/// Schedule updater for deployments where election happens elsewhere
#[derive(Debug, Clone, Default)]
pub struct NullSchedule;

impl ScheduleUpdater for NullSchedule {
    fn update_elected_producers(&mut self, timestamp: BlockTimestamp) {
        tracing::debug!("producer schedule update requested at {}", timestamp);
    }
}

/// Staking pool that accumulates name-bid proceeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RexPool {
    pub namebid_proceeds: i64,
}

impl BidProceedsSink for RexPool {
    fn receive_bid_proceeds(&mut self, amount: i64) {
        self.namebid_proceeds = self.namebid_proceeds.saturating_add(amount);
        tracing::info!(
            "channeled {} of name bid proceeds to staking pool (total {})",
            amount,
            self.namebid_proceeds
        );
    }
}
