//! Persisted record types
//!
//! One record per key in each table. Registration, staking and bidding
//! create these elsewhere; block tracking and reward claims only update
//! the fields they own.

use crate::error::{Error, Result};
use crate::name::Name;
use crate::tables::{Ranked, Row};
use crate::time::TimePoint;
use serde::{Deserialize, Serialize};

/// Registered block producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRecord {
    pub owner: Name,
    /// Producer has a signing key on file
    pub active: bool,
    #[serde(default)]
    pub unpaid_blocks: u64,
    #[serde(default)]
    pub last_claim_time: TimePoint,
    /// Vote weight from the voting subsystem
    #[serde(default)]
    pub total_votes: f64,
}

impl ProducerRecord {
    pub fn new(owner: Name, active: bool) -> Self {
        Self {
            owner,
            active,
            unpaid_blocks: 0,
            last_claim_time: TimePoint::default(),
            total_votes: 0.0,
        }
    }
}

impl Row for ProducerRecord {
    fn primary_key(&self) -> Name {
        self.owner
    }
}

/// Vote-pay accounting, created on first claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerVotePayRecord {
    pub owner: Name,
    pub votepay_share: f64,
    pub last_votepay_share_update: TimePoint,
}

impl ProducerVotePayRecord {
    pub fn new(owner: Name, now: TimePoint) -> Self {
        Self {
            owner,
            votepay_share: 0.0,
            last_votepay_share_update: now,
        }
    }
}

impl Row for ProducerVotePayRecord {
    fn primary_key(&self) -> Name {
        self.owner
    }
}

/// A stake-holder position backing one producer.
///
/// Field order is the sort order: value, then holder, then last payment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StakeSlot {
    /// Staked amount in token base units
    pub value: i64,
    pub stake_holder: Name,
    /// Last time a reward was credited to this slot
    pub last_pay: TimePoint,
}

impl StakeSlot {
    pub fn new(stake_holder: Name, value: i64, last_pay: TimePoint) -> Self {
        Self {
            value,
            stake_holder,
            last_pay,
        }
    }
}

/// Fee rate, stake total and stake slots of a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerExtraRecord {
    pub owner: Name,
    /// Fraction of each slot reward retained by the producer, in [0, 1]
    pub fees: f64,
    /// Sum of positive slot values, used for top-N ranking
    pub total_stake: i64,
    pub slots: Vec<StakeSlot>,
}

impl ProducerExtraRecord {
    /// Empty record: zero fee, zero stake, no slots
    pub fn new(owner: Name) -> Self {
        Self {
            owner,
            fees: 0.0,
            total_stake: 0,
            slots: Vec::new(),
        }
    }

    pub fn validate_fees(fees: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&fees) {
            return Err(Error::InvalidFeeRate(fees));
        }
        Ok(())
    }

    pub fn set_fees(&mut self, fees: f64) -> Result<()> {
        Self::validate_fees(fees)?;
        self.fees = fees;
        Ok(())
    }

    pub fn add_slot(&mut self, slot: StakeSlot) -> Result<()> {
        self.slots.push(slot);
        self.recompute_total_stake()
    }

    pub fn recompute_total_stake(&mut self) -> Result<()> {
        self.total_stake = self
            .slots
            .iter()
            .filter(|s| s.value > 0)
            .try_fold(0i64, |acc, s| acc.checked_add(s.value))
            .ok_or(Error::Overflow("total stake"))?;
        Ok(())
    }
}

impl Row for ProducerExtraRecord {
    fn primary_key(&self) -> Name {
        self.owner
    }
}

impl Ranked for ProducerExtraRecord {
    fn rank(&self) -> i64 {
        self.total_stake
    }
}

/// Premium name auction entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameBidRecord {
    pub new_name: Name,
    pub high_bidder: Name,
    /// Positive while the auction is open, negated once closed
    pub high_bid: i64,
    pub last_bid_time: TimePoint,
}

impl NameBidRecord {
    pub fn is_open(&self) -> bool {
        self.high_bid > 0
    }
}

impl Row for NameBidRecord {
    fn primary_key(&self) -> Name {
        self.new_name
    }
}

impl Ranked for NameBidRecord {
    fn rank(&self) -> i64 {
        self.high_bid
    }
}
