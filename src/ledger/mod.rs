//! Resource ledger - signed integer counts keyed by an arbitrary type
//!
//! Used for unit-count accounting, player resource stockpiles and combat
//! bookkeeping. Absent keys read as zero, but an explicitly stored zero
//! is still an entry: equality distinguishes the two.

use std::hash::Hash;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// How to bring a fractional value back to an integer after scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Round toward negative infinity
    Floor,
    /// Round half away from zero
    Round,
    /// Round toward positive infinity
    Ceiling,
    /// Drop the fractional part (round toward zero)
    Truncate,
}

impl Rounding {
    fn apply(self, value: f32) -> i32 {
        let rounded = match self {
            Rounding::Floor => value.floor(),
            Rounding::Round => value.round(),
            Rounding::Ceiling => value.ceil(),
            Rounding::Truncate => value.trunc(),
        };
        rounded as i32
    }
}

/// A ledger of signed integer counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger<K: Eq + Hash> {
    values: AHashMap<K, i32>,
}

impl<K: Eq + Hash> Default for ResourceLedger<K> {
    fn default() -> Self {
        Self { values: AHashMap::new() }
    }
}

impl<K: Eq + Hash + Clone> ResourceLedger<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the count for a key, zero when absent
    pub fn get(&self, key: &K) -> i32 {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// Accumulate a delta onto a key, creating the entry if absent
    pub fn add(&mut self, key: K, delta: i32) {
        *self.values.entry(key).or_insert(0) += delta;
    }

    /// Overwrite the count for a key
    pub fn set(&mut self, key: K, value: i32) {
        self.values.insert(key, value);
    }

    /// Elementwise add every entry of another ledger
    pub fn add_all(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.add(key.clone(), *value);
        }
    }

    /// Elementwise subtract every entry of another ledger
    pub fn subtract(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.add(key.clone(), -value);
        }
    }

    /// Elementwise add every entry of another ledger, scaled by a factor
    pub fn add_multiple(&mut self, other: &Self, factor: i32) {
        for (key, value) in &other.values {
            self.add(key.clone(), value * factor);
        }
    }

    /// Scale every count by a multiplier, then round per policy
    pub fn multiply_all_values_by(&mut self, multiplier: f32, rounding: Rounding) {
        for value in self.values.values_mut() {
            *value = rounding.apply(*value as f32 * multiplier);
        }
    }

    /// Largest count in the ledger, zero when empty
    ///
    /// The zero on an empty ledger is a sentinel, not a real entry.
    pub fn highest_value(&self) -> i32 {
        self.values.values().copied().max().unwrap_or(0)
    }

    /// Smallest count in the ledger, zero when empty
    pub fn lowest_value(&self) -> i32 {
        self.values.values().copied().min().unwrap_or(0)
    }

    /// Key carrying the largest count, None when empty, arbitrary on ties
    pub fn highest_key(&self) -> Option<&K> {
        self.values.iter().max_by_key(|(_, v)| **v).map(|(k, _)| k)
    }

    /// Key carrying the smallest count, None when empty, arbitrary on ties
    pub fn lowest_key(&self) -> Option<&K> {
        self.values.iter().min_by_key(|(_, v)| **v).map(|(k, _)| k)
    }

    /// Sum of every count
    pub fn total_values(&self) -> i32 {
        self.values.values().sum()
    }

    /// True when every entry holds the same count. False on an empty
    /// ledger: no data is not the same as uniform data.
    pub fn all_values_are_same(&self) -> bool {
        let mut iter = self.values.values();
        match iter.next() {
            Some(first) => iter.all(|v| v == first),
            None => false,
        }
    }

    /// True when every entry holds exactly `n`. False on an empty ledger.
    pub fn all_values_equal(&self, n: i32) -> bool {
        !self.values.is_empty() && self.values.values().all(|v| *v == n)
    }

    /// True iff, for every key present in `other`, this ledger's count is
    /// at least other's count. Keys present only in `self` are ignored,
    /// so this is not a total order: `a.greater_than_or_equal_to(&b)` and
    /// `b.greater_than_or_equal_to(&a)` can both be false.
    pub fn greater_than_or_equal_to(&self, other: &Self) -> bool {
        other.values.iter().all(|(key, value)| self.get(key) >= *value)
    }

    /// Drop every entry whose key matches the predicate
    pub fn remove_matching_keys(&mut self, mut predicate: impl FnMut(&K) -> bool) {
        self.values.retain(|key, _| !predicate(key));
    }

    /// Drop every entry whose key does not match the predicate
    pub fn remove_non_matching_keys(&mut self, mut predicate: impl FnMut(&K) -> bool) {
        self.values.retain(|key, _| predicate(key));
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i32)> + '_ {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
