//! Deployment configuration
//!
//! Loaded from a JSON file; every field has a default, so an empty object
//! is a valid config.

use crate::asset::Symbol;
use crate::error::{Error, Result};
use crate::name::Name;
use crate::time::{rfc3339, TimePoint};
use crate::{
    DEFAULT_REWARD_SYMBOL, NODE_MULTIPLIER, PAYMENT_LOCKDOWN, SYSTEM_ACCOUNT, TOKEN_ACCOUNT,
    VALIDATOR_MULTIPLIER, VALIDATOR_SEATS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Account that authorizes block processing and issues rewards
    pub system_account: Name,
    /// Account hosting the token ledger
    pub token_account: Name,
    pub reward_symbol: Symbol,
    /// Claims at or after this time are refused
    #[serde(with = "rfc3339")]
    pub payment_lockdown: TimePoint,
    /// Reward multiplier for producers in the top seats by stake
    pub validator_multiplier: i64,
    /// Reward multiplier for every other producer
    pub node_multiplier: i64,
    /// Number of top-ranked producers treated as validators
    pub validator_seats: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            system_account: SYSTEM_ACCOUNT,
            token_account: TOKEN_ACCOUNT,
            reward_symbol: DEFAULT_REWARD_SYMBOL,
            payment_lockdown: PAYMENT_LOCKDOWN,
            validator_multiplier: VALIDATOR_MULTIPLIER,
            node_multiplier: NODE_MULTIPLIER,
            validator_seats: VALIDATOR_SEATS,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Config = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.validator_multiplier <= 0 || self.node_multiplier <= 0 {
            return Err(Error::Config(format!(
                "multipliers must be positive (validator {}, node {})",
                self.validator_multiplier, self.node_multiplier
            )));
        }
        if self.validator_seats == 0 {
            return Err(Error::Config("validator_seats must be at least 1".into()));
        }
        if self.system_account.is_empty() {
            return Err(Error::Config("system_account must be set".into()));
        }
        Ok(())
    }
}
