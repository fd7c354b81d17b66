// Copyright 2025 Oxide Computer Company

use std::{collections::HashSet, hash::Hash};

use indexmap::IndexMap;

/// One entry of an ordered key match between two collections.
#[derive(Debug, PartialEq)]
pub(crate) enum Matched<K, V> {
    /// Present only in the first collection, with its position there.
    AOnly(usize, K, V),
    /// Present in both, with the positions in the first and second
    /// collections.
    Both(usize, usize, K, V, V),
    /// Present only in the second collection, with its position there.
    BOnly(usize, K, V),
}

/// Match two keyed collections while preserving their declared order.
///
/// Entries of `a` come first, in `a` order (either `AOnly` or `Both`), then
/// entries only in `b`, in `b` order. Duplicate keys keep the first
/// occurrence.
#[derive(Debug)]
pub(crate) struct SetCompare<K, V> {
    pub entries: Vec<Matched<K, V>>,
}

impl<K, V> SetCompare<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new<I, I2>(a: I, b: I2) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        I2: IntoIterator<Item = (K, V)>,
    {
        let mut bb = IndexMap::new();
        for (idx, (k, v)) in b.into_iter().enumerate() {
            bb.entry(k).or_insert((idx, v));
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (idx, (k, v)) in a.into_iter().enumerate() {
            if !seen.insert(k.clone()) {
                continue;
            }
            match bb.shift_remove(&k) {
                Some((bidx, bv)) => entries.push(Matched::Both(idx, bidx, k, v, bv)),
                None => entries.push(Matched::AOnly(idx, k, v)),
            }
        }

        entries.extend(
            bb.into_iter()
                .map(|(k, (idx, v))| Matched::BOnly(idx, k, v)),
        );

        Self { entries }
    }
}
