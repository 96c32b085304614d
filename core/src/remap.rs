//! Dense index remapping.
//!
//! A [`Remap`] assigns the live members of a collection contiguous indices
//! starting at zero, in ascending original order. Every stage that filters a
//! collection goes through one so renumbering is deterministic.

use std::collections::BTreeSet;

use crate::error::{Error, Result, check_index};

/// Old-to-new index table for one filtered collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    kind: &'static str,
    table: Vec<Option<usize>>,
    live: usize,
}

impl Remap {
    /// Build a remap from the set of live indices of a collection of `len` items
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if a live index is not below `len`.
    pub fn from_live(kind: &'static str, len: usize, live: &BTreeSet<usize>) -> Result<Self> {
        let mut table = vec![None; len];
        // BTreeSet iterates in ascending order, which fixes the new numbering
        for (new, &old) in live.iter().enumerate() {
            check_index(kind, old, len, || format!("{kind} liveness set"))?;
            table[old] = Some(new);
        }
        Ok(Self {
            kind,
            table,
            live: live.len(),
        })
    }

    /// Build a remap from a per-index keep mask
    pub fn from_mask(kind: &'static str, keep: &[bool]) -> Self {
        let mut table = Vec::with_capacity(keep.len());
        let mut next = 0;
        for &k in keep {
            if k {
                table.push(Some(next));
                next += 1;
            } else {
                table.push(None);
            }
        }
        Self {
            kind,
            table,
            live: next,
        }
    }

    /// Map every index onto itself
    pub fn identity(kind: &'static str, len: usize) -> Self {
        Self {
            kind,
            table: (0..len).map(Some).collect(),
            live: len,
        }
    }

    /// New index for `old`
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if `old` was never part of the collection, and
    /// [`Error::NotLive`] if it was filtered out.
    pub fn get(&self, old: usize) -> Result<usize> {
        check_index(self.kind, old, self.table.len(), || {
            format!("{} remap", self.kind)
        })?;
        self.table[old].ok_or(Error::NotLive {
            kind: self.kind,
            index: old,
        })
    }

    /// New index for `old`, or `None` if it was filtered out or never existed
    pub fn try_get(&self, old: usize) -> Option<usize> {
        self.table.get(old).copied().flatten()
    }

    /// Whether `old` survives
    pub fn contains(&self, old: usize) -> bool {
        self.try_get(old).is_some()
    }

    /// Number of surviving entries
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of entries before filtering
    pub fn source_len(&self) -> usize {
        self.table.len()
    }

    /// Whether nothing was filtered out
    pub fn is_identity(&self) -> bool {
        self.live == self.table.len()
    }

    /// Keep the live items of `items`, preserving their relative order
    pub fn filter<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .zip(&self.table)
            .filter(|(_, slot)| slot.is_some())
            .map(|(item, _)| item.clone())
            .collect()
    }

    /// Original indices of the surviving entries, ascending
    pub fn survivors(&self) -> impl Iterator<Item = usize> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter_map(|(old, slot)| slot.map(|_| old))
    }
}
