//! Keyed tables
//!
//! `Table` is a primary-key map. `RankedTable` adds a secondary index
//! ordered by a signed rank, highest first, with ties broken by ascending
//! primary key. The index is updated on every write, so ranked iteration
//! always reflects the current rows.

use crate::error::{Error, Result};
use crate::name::Name;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// A row keyed by account name
pub trait Row: Clone {
    fn primary_key(&self) -> Name;
}

/// A row with a secondary ranking key
pub trait Ranked: Row {
    fn rank(&self) -> i64;
}

/// Primary-key table
#[derive(Debug, Clone)]
pub struct Table<R> {
    label: &'static str,
    rows: BTreeMap<Name, R>,
}

impl<R: Row> Table<R> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            rows: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: Name) -> Option<&R> {
        self.rows.get(&key)
    }

    pub fn get_mut(&mut self, key: Name) -> Option<&mut R> {
        self.rows.get_mut(&key)
    }

    pub fn contains(&self, key: Name) -> bool {
        self.rows.contains_key(&key)
    }

    /// Insert a new row, failing if the key is taken
    pub fn emplace(&mut self, row: R) -> Result<()> {
        let key = row.primary_key();
        if self.rows.contains_key(&key) {
            return Err(Error::DuplicateRecord(key, self.label));
        }
        self.rows.insert(key, row);
        Ok(())
    }

    /// Insert or replace, returning the previous row
    pub fn upsert(&mut self, row: R) -> Option<R> {
        self.rows.insert(row.primary_key(), row)
    }

    /// Apply `f` to the row at `key`. Returns `false` if there is no such row.
    pub fn modify<F: FnOnce(&mut R)>(&mut self, key: Name, f: F) -> bool {
        match self.rows.get_mut(&key) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: Name) -> Option<R> {
        self.rows.remove(&key)
    }

    /// Rows in primary-key order
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Table with a descending secondary index on `Ranked::rank`
#[derive(Debug, Clone)]
pub struct RankedTable<R> {
    rows: Table<R>,
    index: BTreeSet<(Reverse<i64>, Name)>,
}

impl<R: Ranked> RankedTable<R> {
    pub fn new(label: &'static str) -> Self {
        Self {
            rows: Table::new(label),
            index: BTreeSet::new(),
        }
    }

    pub fn get(&self, key: Name) -> Option<&R> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: Name) -> bool {
        self.rows.contains(key)
    }

    pub fn emplace(&mut self, row: R) -> Result<()> {
        let entry = (Reverse(row.rank()), row.primary_key());
        self.rows.emplace(row)?;
        self.index.insert(entry);
        Ok(())
    }

    pub fn upsert(&mut self, row: R) -> Option<R> {
        let entry = (Reverse(row.rank()), row.primary_key());
        let previous = self.rows.upsert(row);
        if let Some(prev) = &previous {
            self.index.remove(&(Reverse(prev.rank()), prev.primary_key()));
        }
        self.index.insert(entry);
        previous
    }

    /// Apply `f` to the row at `key`, re-indexing it afterwards.
    /// Returns `false` if there is no such row.
    pub fn modify<F: FnOnce(&mut R)>(&mut self, key: Name, f: F) -> bool {
        let Some(row) = self.rows.get_mut(key) else {
            return false;
        };

        let old_rank = row.rank();
        f(row);
        let new_rank = row.rank();

        if old_rank != new_rank {
            self.index.remove(&(Reverse(old_rank), key));
            self.index.insert((Reverse(new_rank), key));
        }
        true
    }

    pub fn remove(&mut self, key: Name) -> Option<R> {
        let row = self.rows.remove(key)?;
        self.index.remove(&(Reverse(row.rank()), key));
        Some(row)
    }

    /// Rows in primary-key order
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    /// Rows by rank, highest first
    pub fn ranked(&self) -> impl Iterator<Item = &R> {
        self.index.iter().filter_map(|(_, key)| self.rows.get(*key))
    }

    /// Highest-ranked row
    pub fn highest(&self) -> Option<&R> {
        self.ranked().next()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
