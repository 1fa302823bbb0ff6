//! sled-backed persistence for chain state and the token ledger
//!
//! One tree per keyed table, keyed by the big-endian owner name, with
//! bincode values. Singletons (global state, vote-pay totals, token supply,
//! staking pool) live in the `global` tree. `save` writes every tree in a
//! single transaction.

use crate::asset::Symbol;
use crate::error::{Error, Result};
use crate::host::RexPool;
use crate::name::Name;
use crate::state::{ChainState, GlobalState, GlobalStateExt, VotePayState};
use crate::tables::Row;
use crate::token::MemoryToken;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, Transactional, TransactionalTree,
};
use sled::{IVec, Tree};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

const KEY_GLOBAL: &[u8] = b"global";
const KEY_GLOBAL_EXT: &[u8] = b"global_ext";
const KEY_VPAY: &[u8] = b"vpay";
const KEY_TOKEN: &[u8] = b"token";
const KEY_REX: &[u8] = b"rex";

/// Token ledger header; balances are stored per account
#[derive(Debug, Serialize, Deserialize)]
struct TokenMeta {
    issuer: Name,
    symbol: Symbol,
    supply: i64,
}

type Encoded = Vec<([u8; 8], Vec<u8>)>;

pub struct Store {
    db: sled::Db,
    global: Tree,
    producers: Tree,
    votepay: Tree,
    extras: Tree,
    name_bids: Tree,
    balances: Tree,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        info!("opening state database at {}", path.display());

        let db = sled::open(path)?;
        Ok(Self {
            global: db.open_tree("global")?,
            producers: db.open_tree("producers")?,
            votepay: db.open_tree("votepay")?,
            extras: db.open_tree("prodextra")?,
            name_bids: db.open_tree("namebids")?,
            balances: db.open_tree("balances")?,
            db,
        })
    }

    /// Nothing has been saved yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(!self.global.contains_key(KEY_GLOBAL)?)
    }

    /// Persist state, ledger and pool atomically, replacing what was stored
    pub fn save(&self, state: &ChainState, token: &MemoryToken, rex: &RexPool) -> Result<()> {
        let singletons = vec![
            (KEY_GLOBAL, bincode::serialize(&state.global)?),
            (KEY_GLOBAL_EXT, bincode::serialize(&state.global_ext)?),
            (KEY_VPAY, bincode::serialize(&state.vpay)?),
            (
                KEY_TOKEN,
                bincode::serialize(&TokenMeta {
                    issuer: token.issuer(),
                    symbol: token.symbol(),
                    supply: token.supply().amount,
                })?,
            ),
            (KEY_REX, bincode::serialize(rex)?),
        ];

        let producers = encode_rows(state.producers.iter())?;
        let votepay = encode_rows(state.votepay.iter())?;
        let extras = encode_rows(state.extras.iter())?;
        let name_bids = encode_rows(state.name_bids.iter())?;
        let balances = token
            .balances()
            .map(|(account, amount)| -> Result<([u8; 8], Vec<u8>)> {
                Ok((account.to_key(), bincode::serialize(&amount)?))
            })
            .collect::<Result<Encoded>>()?;

        let stale = [
            stale_keys(&self.producers, &producers)?,
            stale_keys(&self.votepay, &votepay)?,
            stale_keys(&self.extras, &extras)?,
            stale_keys(&self.name_bids, &name_bids)?,
            stale_keys(&self.balances, &balances)?,
        ];

        let trees = (
            &self.global,
            &self.producers,
            &self.votepay,
            &self.extras,
            &self.name_bids,
            &self.balances,
        );
        trees
            .transaction(|(global, producers_tx, votepay_tx, extras_tx, bids_tx, balances_tx)| {
                for (key, value) in &singletons {
                    global.insert(*key, value.as_slice())?;
                }
                write_rows(producers_tx, &producers, &stale[0])?;
                write_rows(votepay_tx, &votepay, &stale[1])?;
                write_rows(extras_tx, &extras, &stale[2])?;
                write_rows(bids_tx, &name_bids, &stale[3])?;
                write_rows(balances_tx, &balances, &stale[4])?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| Error::Storage(format!("sled transaction: {:?}", e)))?;

        self.db.flush()?;
        debug!(
            "saved {} producers, {} stake records, {} balances",
            producers.len(),
            extras.len(),
            balances.len()
        );
        Ok(())
    }

    /// Load everything back, or `None` for an empty database
    pub fn load(&self) -> Result<Option<(ChainState, MemoryToken, RexPool)>> {
        let Some(global) = self.get_singleton::<GlobalState>(KEY_GLOBAL)? else {
            return Ok(None);
        };

        let mut state = ChainState {
            global,
            global_ext: self.get_singleton::<GlobalStateExt>(KEY_GLOBAL_EXT)?.unwrap_or_default(),
            vpay: self.get_singleton::<VotePayState>(KEY_VPAY)?.unwrap_or_default(),
            ..ChainState::default()
        };

        for record in decode_tree(&self.producers)? {
            state.producers.emplace(record)?;
        }
        for record in decode_tree(&self.votepay)? {
            state.votepay.emplace(record)?;
        }
        for record in decode_tree(&self.extras)? {
            state.extras.emplace(record)?;
        }
        for record in decode_tree(&self.name_bids)? {
            state.name_bids.emplace(record)?;
        }

        let meta = self
            .get_singleton::<TokenMeta>(KEY_TOKEN)?
            .ok_or_else(|| Error::Storage("token ledger header missing".into()))?;

        let mut balances = BTreeMap::new();
        for entry in self.balances.iter() {
            let (key, value) = entry?;
            let account = Name::from_key(&key)
                .ok_or_else(|| Error::Storage(format!("bad balance key {:?}", key)))?;
            balances.insert(account, bincode::deserialize::<i64>(&value)?);
        }
        let token = MemoryToken::from_parts(meta.issuer, meta.symbol, meta.supply, balances);

        let rex = self.get_singleton::<RexPool>(KEY_REX)?.unwrap_or_default();

        Ok(Some((state, token, rex)))
    }

    fn get_singleton<V: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<V>> {
        match self.global.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode_rows<'a, R>(rows: impl Iterator<Item = &'a R>) -> Result<Encoded>
where
    R: Row + Serialize + 'a,
{
    rows.map(|row| -> Result<([u8; 8], Vec<u8>)> {
        Ok((row.primary_key().to_key(), bincode::serialize(row)?))
    })
    .collect()
}

/// Keys stored in `tree` that are not among `rows`
fn stale_keys(tree: &Tree, rows: &Encoded) -> Result<Vec<IVec>> {
    let live: BTreeSet<[u8; 8]> = rows.iter().map(|(key, _)| *key).collect();

    let mut stale = Vec::new();
    for key in tree.iter().keys() {
        let key = key?;
        let kept = <[u8; 8]>::try_from(&key[..]).is_ok_and(|k| live.contains(&k));
        if !kept {
            stale.push(key);
        }
    }
    Ok(stale)
}

fn write_rows(
    tree: &TransactionalTree,
    rows: &Encoded,
    stale: &[IVec],
) -> ConflictableTransactionResult<(), ()> {
    for key in stale {
        tree.remove(key.clone())?;
    }
    for (key, value) in rows {
        tree.insert(&key[..], value.as_slice())?;
    }
    Ok(())
}

fn decode_tree<R: DeserializeOwned>(tree: &Tree) -> Result<Vec<R>> {
    tree.iter()
        .values()
        .map(|value| -> Result<R> { Ok(bincode::deserialize(&value?)?) })
        .collect()
}
