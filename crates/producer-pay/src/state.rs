//! Chain state context
//!
//! Global singletons and keyed tables live together in `ChainState`, which
//! is passed explicitly to every entry point. Storage loads it before an
//! invocation and persists it after a successful one.

use crate::error::{Error, Result};
use crate::name::Name;
use crate::records::{
    NameBidRecord, ProducerExtraRecord, ProducerRecord, ProducerVotePayRecord, StakeSlot,
};
use crate::tables::{RankedTable, Table};
use crate::time::{BlockTimestamp, TimePoint};
use serde::{Deserialize, Serialize};

/// Global producer-pay singleton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalState {
    /// Set on the first block; zero until then
    pub last_pervote_bucket_fill: TimePoint,
    pub total_unpaid_blocks: u64,
    pub last_producer_schedule_update: BlockTimestamp,
    pub last_name_close: BlockTimestamp,
    /// Chain activation time; zero while not activated
    pub thresh_activated_stake_time: TimePoint,
}

impl GlobalState {
    pub fn is_activated(&self) -> bool {
        !self.thresh_activated_stake_time.is_unset()
    }
}

/// Deprecated mirror of the last block timestamp. Written, never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStateExt {
    pub last_block_num: BlockTimestamp,
}

/// Network-wide vote-pay totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotePayState {
    pub total_producer_votepay_share: f64,
    pub total_vpay_share_change_rate: f64,
    pub last_vpay_state_update: TimePoint,
}

/// All state read or written by block tracking and reward claims
#[derive(Debug, Clone)]
pub struct ChainState {
    pub global: GlobalState,
    pub global_ext: GlobalStateExt,
    pub vpay: VotePayState,
    pub producers: Table<ProducerRecord>,
    pub votepay: Table<ProducerVotePayRecord>,
    /// Indexed by total stake
    pub extras: RankedTable<ProducerExtraRecord>,
    /// Indexed by high bid
    pub name_bids: RankedTable<NameBidRecord>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            global: GlobalState::default(),
            global_ext: GlobalStateExt::default(),
            vpay: VotePayState::default(),
            producers: Table::new("producers"),
            votepay: Table::new("votepay"),
            extras: RankedTable::new("prodextra"),
            name_bids: RankedTable::new("namebids"),
        }
    }
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a genesis document
    pub fn from_genesis(genesis: Genesis) -> Result<Self> {
        let mut state = Self {
            global: genesis.global,
            ..Self::default()
        };

        for producer in genesis.producers {
            state.producers.emplace(producer)?;
        }

        for extra in genesis.extras {
            let mut record = ProducerExtraRecord::new(extra.owner);
            record.set_fees(extra.fees)?;
            record.slots = extra.slots;
            record.recompute_total_stake()?;
            state.extras.emplace(record)?;
        }

        for bid in genesis.name_bids {
            state.name_bids.emplace(bid)?;
        }

        tracing::info!(
            "genesis loaded: {} producers, {} stake records, {} name bids",
            state.producers.len(),
            state.extras.len(),
            state.name_bids.len(),
        );

        Ok(state)
    }

    pub fn producer(&self, owner: Name) -> Result<&ProducerRecord> {
        self.producers
            .get(owner)
            .ok_or(Error::UnknownProducer(owner))
    }
}

/// Stake record as given in a genesis document; `total_stake` is derived
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisExtra {
    pub owner: Name,
    #[serde(default)]
    pub fees: f64,
    #[serde(default)]
    pub slots: Vec<StakeSlot>,
}

/// Initial state document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Genesis {
    pub global: GlobalState,
    pub producers: Vec<ProducerRecord>,
    pub extras: Vec<GenesisExtra>,
    pub name_bids: Vec<NameBidRecord>,
}

impl Genesis {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
