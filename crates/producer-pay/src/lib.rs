//! # producer-pay
//!
//! block production tracking and stake-weighted producer rewards.
//!
//! every block credits its producer and, about once a minute, triggers
//! schedule maintenance and closure of stale name auctions. producers claim
//! rewards for their stake holders: each stake slot accrues in proportion
//! to its value and the time since its last payment, the producer keeps a
//! fee, and the rest is paid out.
//!
//! ## flow
//!
//! ```text
//!   on_block (system auth)            claim_rewards (owner auth)
//!          │                                   │
//!          ▼                                   ▼
//!   ┌──────────────┐                   ┌──────────────┐
//!   │ record_block │                   │  plan_claim  │  working copies
//!   └──────┬───────┘                   └──────┬───────┘
//!          │ ≥ 120 slots                      │ issue + transfers
//!          ▼                                  ▼
//!   ┌──────────────┐                   ┌──────────────┐
//!   │ maintenance  │                   │ token ledger │  all or nothing
//!   └──────┬───────┘                   └──────┬───────┘
//!          │                                  │ applied
//!          ▼                                  ▼
//!   schedule, name bids                 commit to ChainState
//! ```
//!
//! ## usage
//!
//! ```rust,ignore
//! let mut contract = SystemContract::new(config, state, token);
//! contract.on_block(&ActionContext::system(now, SYSTEM_ACCOUNT), &header)?;
//! let receipt = contract.claim_rewards(&ActionContext::new(now).with_auth(owner), owner)?;
//! ```

pub mod asset;
pub mod claim;
pub mod config;
pub mod contract;
pub mod error;
pub mod host;
pub mod name;
pub mod onblock;
pub mod records;
pub mod state;
pub mod storage;
pub mod tables;
pub mod time;
pub mod token;
pub mod votepay;

pub use asset::{Asset, Symbol};
pub use claim::{ClaimPlan, ClaimReceipt, Payout, RewardParams, Role};
pub use config::Config;
pub use contract::{ActionContext, SystemContract};
pub use error::{Error, Result};
pub use host::{BidProceedsSink, NullSchedule, RexPool, ScheduleUpdater};
pub use name::Name;
pub use onblock::{BlockHeader, BlockOutcome, ClosedBid};
pub use records::{
    NameBidRecord, ProducerExtraRecord, ProducerRecord, ProducerVotePayRecord, StakeSlot,
};
pub use state::{ChainState, Genesis, GlobalState};
pub use storage::Store;
pub use time::{BlockTimestamp, Microseconds, TimePoint};
pub use token::{MemoryToken, TokenAction, TokenLedger};
pub use votepay::{ContinuousVotePay, VotePayShare};

use time::BLOCKS_PER_DAY;

/// `eosio`
pub const SYSTEM_ACCOUNT: Name = Name::from_raw(6138663577826885632);

/// `eosio.token`
pub const TOKEN_ACCOUNT: Name = Name::from_raw(6138663591592764928);

pub const DEFAULT_REWARD_SYMBOL: Symbol = Symbol::from_code_unchecked(b"CBSCH", 4);

/// Claims are refused from 2025-06-10T00:00:00Z on
pub const PAYMENT_LOCKDOWN: TimePoint = TimePoint::from_secs(1_749_513_600);

pub const VALIDATOR_MULTIPLIER: i64 = 7;
pub const NODE_MULTIPLIER: i64 = 6;

/// Top producers by stake that are paid as validators
pub const VALIDATOR_SEATS: usize = 21;

/// A slot paid within this window is skipped
pub const SLOT_PAY_COOLDOWN: Microseconds = Microseconds::hours(3);

/// Time over which a slot earns its full value times the multiplier
pub const REWARD_PERIOD: Microseconds = Microseconds::days(30);

pub const VOTEPAY_SHARE_THRESHOLD: Microseconds = Microseconds::days(3);

/// One minute of half-second slots
pub const SCHEDULE_UPDATE_INTERVAL_SLOTS: u32 = 120;

pub const NAME_CLOSE_INTERVAL_SLOTS: u32 = BLOCKS_PER_DAY;

/// A name auction closes once nobody has bid for this long
pub const NAME_BID_IDLE_TIME: Microseconds = Microseconds::days(1);

/// No names close until the chain has been active this long
pub const ACTIVATION_NAME_DELAY: Microseconds = Microseconds::days(14);
