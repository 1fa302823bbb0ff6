//! Token ledger collaborator
//!
//! Reward claims hand the ledger one batch of actions: an issue to the
//! system account followed by transfers out of it. A ledger applies the
//! whole batch or none of it.

use crate::asset::{Asset, Symbol};
use crate::error::{Error, Result};
use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MEMO_ISSUE: &str = "issue tokens for pay to stake holders";
pub const MEMO_FEE: &str = "node or validator fee";
pub const MEMO_STAKE_PAYMENT: &str = "stake holder payment";

/// A single ledger mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenAction {
    Issue {
        to: Name,
        quantity: Asset,
        memo: String,
    },
    Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        memo: String,
    },
}

/// Token ledger: applies a batch of actions atomically
pub trait TokenLedger {
    fn apply(&mut self, actions: &[TokenAction]) -> Result<()>;
}

/// In-memory token ledger for a single symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryToken {
    issuer: Name,
    symbol: Symbol,
    supply: i64,
    balances: BTreeMap<Name, i64>,
}

impl MemoryToken {
    pub fn new(issuer: Name, symbol: Symbol) -> Self {
        Self {
            issuer,
            symbol,
            supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        issuer: Name,
        symbol: Symbol,
        supply: i64,
        balances: BTreeMap<Name, i64>,
    ) -> Self {
        Self {
            issuer,
            symbol,
            supply,
            balances,
        }
    }

    pub fn issuer(&self) -> Name {
        self.issuer
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn supply(&self) -> Asset {
        Asset::new(self.supply, self.symbol)
    }

    pub fn balance(&self, account: Name) -> Asset {
        Asset::new(self.balances.get(&account).copied().unwrap_or(0), self.symbol)
    }

    pub fn balances(&self) -> impl Iterator<Item = (Name, i64)> + '_ {
        self.balances.iter().map(|(k, v)| (*k, *v))
    }

    fn check_quantity(&self, quantity: &Asset) -> Result<()> {
        if quantity.symbol != self.symbol {
            return Err(Error::SymbolMismatch {
                expected: self.symbol.to_string(),
                got: quantity.symbol.to_string(),
            });
        }
        if quantity.amount <= 0 {
            return Err(Error::InvalidQuantity(quantity.amount));
        }
        Ok(())
    }

    pub fn issue(&mut self, to: Name, quantity: Asset, memo: &str) -> Result<()> {
        self.check_quantity(&quantity)?;
        if to != self.issuer {
            return Err(Error::IssueTarget(self.issuer));
        }

        self.supply = self
            .supply
            .checked_add(quantity.amount)
            .ok_or(Error::Overflow("token supply"))?;
        self.credit(to, quantity.amount)?;

        tracing::debug!("issue {} to {} ({})", quantity, to, memo);
        Ok(())
    }

    pub fn transfer(&mut self, from: Name, to: Name, quantity: Asset, memo: &str) -> Result<()> {
        self.check_quantity(&quantity)?;
        if from == to {
            return Err(Error::SelfTransfer(from));
        }

        let balance = self.balances.get(&from).copied().unwrap_or(0);
        if balance < quantity.amount {
            return Err(Error::Overdrawn {
                account: from,
                balance,
                needed: quantity.amount,
            });
        }

        let remaining = balance - quantity.amount;
        if remaining == 0 {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, remaining);
        }
        self.credit(to, quantity.amount)?;

        tracing::debug!("transfer {} from {} to {} ({})", quantity, from, to, memo);
        Ok(())
    }

    fn credit(&mut self, to: Name, amount: i64) -> Result<()> {
        let entry = self.balances.entry(to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(Error::Overflow("token balance"))?;
        Ok(())
    }
}

impl TokenLedger for MemoryToken {
    fn apply(&mut self, actions: &[TokenAction]) -> Result<()> {
        let mut staged = self.clone();

        for action in actions {
            match action {
                TokenAction::Issue { to, quantity, memo } => staged.issue(*to, *quantity, memo)?,
                TokenAction::Transfer {
                    from,
                    to,
                    quantity,
                    memo,
                } => staged.transfer(*from, *to, *quantity, memo)?,
            }
        }

        *self = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::n;

    fn sym() -> Symbol {
        "4,CBSCH".parse().unwrap()
    }

    fn ledger() -> MemoryToken {
        MemoryToken::new(n("eosio"), sym())
    }

    #[test]
    fn test_issue_then_transfer() {
        let mut token = ledger();
        token
            .apply(&[
                TokenAction::Issue {
                    to: n("eosio"),
                    quantity: Asset::new(1_000, sym()),
                    memo: MEMO_ISSUE.into(),
                },
                TokenAction::Transfer {
                    from: n("eosio"),
                    to: n("alice"),
                    quantity: Asset::new(400, sym()),
                    memo: MEMO_STAKE_PAYMENT.into(),
                },
            ])
            .unwrap();

        assert_eq!(token.supply().amount, 1_000);
        assert_eq!(token.balance(n("eosio")).amount, 600);
        assert_eq!(token.balance(n("alice")).amount, 400);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut token = ledger();
        let before = token.clone();

        let err = token
            .apply(&[
                TokenAction::Issue {
                    to: n("eosio"),
                    quantity: Asset::new(100, sym()),
                    memo: MEMO_ISSUE.into(),
                },
                TokenAction::Transfer {
                    from: n("eosio"),
                    to: n("alice"),
                    quantity: Asset::new(101, sym()),
                    memo: MEMO_STAKE_PAYMENT.into(),
                },
            ])
            .unwrap_err();

        assert!(matches!(err, Error::Overdrawn { .. }));
        assert_eq!(token, before);
    }

    #[test]
    fn test_issue_rules() {
        let mut token = ledger();
        assert!(matches!(
            token.issue(n("alice"), Asset::new(1, sym()), ""),
            Err(Error::IssueTarget(_))
        ));
        assert!(matches!(
            token.issue(n("eosio"), Asset::new(0, sym()), ""),
            Err(Error::InvalidQuantity(0))
        ));

        let other: Symbol = "4,EOS".parse().unwrap();
        assert!(matches!(
            token.issue(n("eosio"), Asset::new(5, other), ""),
            Err(Error::SymbolMismatch { .. })
        ));
    }

    #[test]
    fn test_self_transfer_rejected() {
        let mut token = ledger();
        token.issue(n("eosio"), Asset::new(10, sym()), "").unwrap();
        assert!(matches!(
            token.transfer(n("eosio"), n("eosio"), Asset::new(1, sym()), ""),
            Err(Error::SelfTransfer(_))
        ));
    }
}
