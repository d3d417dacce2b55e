//! Parameter Set
//!
//! An ordered symbol table from [`ParameterKey`] to [`ParameterValue`],
//! with *used-read* tracking.
//!
//! # Representation
//!
//! Values live in a `Vec<(Symbol, ParameterValue)>` kept sorted by symbol,
//! accessed by binary search. Identical sets therefore always produce
//! identical hashes regardless of insertion order.
//!
//! # Used-read tracking
//!
//! Every tracked read ([`ParameterSet::get`]) records the key and the value
//! the reader observed, even when the value is the key's default. A later
//! write to an already-used key refreshes the recorded value, so the final
//! snapshot reflects what later builders and the backend actually see
//! (the "raise max-bones" pattern). Tracked reads take `&mut self`;
//! [`ParameterSet::peek`] is the non-marking read for frozen snapshots.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

use crate::params::key::ParameterKey;
use crate::params::value::{ParameterType, ParameterValue};
use crate::utils::interner::{self, Symbol};

/// Ordered key/value parameter store with used-read tracking.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    /// Sorted by symbol; binary-search access.
    values: Vec<(Symbol, ParameterValue)>,
    /// Keys read since the last reset, with the value finally observed.
    /// Sorted by symbol.
    used: Vec<(Symbol, ParameterValue)>,
}

impl ParameterSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            used: Vec::new(),
        }
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    /// Sets a typed key.
    pub fn set<T: ParameterType>(&mut self, key: &ParameterKey<T>, value: T) {
        self.set_value(key.name(), value.into_value());
    }

    /// Sets a raw value by symbol (maintains sorted order).
    pub fn set_value(&mut self, name: Symbol, value: ParameterValue) {
        match self.values.binary_search_by_key(&name, |&(k, _)| k) {
            Ok(idx) => self.values[idx].1 = value.clone(),
            Err(idx) => self.values.insert(idx, (name, value.clone())),
        }
        // A key read earlier and overwritten now stays used, with the
        // adjusted value recorded for the cache key.
        if let Ok(idx) = self.used.binary_search_by_key(&name, |&(k, _)| k) {
            self.used[idx].1 = value;
        }
    }

    /// Reads a key, raises it to at least `value`, and returns the result.
    ///
    /// Marks the key used. This is the derived-value pattern builders use
    /// for counters like "max bones": the stored value only ever grows.
    pub fn raise<T>(&mut self, key: &ParameterKey<T>, value: T) -> T
    where
        T: ParameterType + PartialOrd,
    {
        let current = self.get(key);
        if value > current {
            self.set(key, value.clone());
            value
        } else {
            current
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Reads a typed key, marking it used.
    ///
    /// Returns the stored value, or the key's declared default when the key
    /// was never set (the read is still recorded — a default on the decision
    /// path is as cache-relevant as an explicit value). A stored value of a
    /// mismatched kind falls back to the default with a warning; it means
    /// two keys were declared with the same name and different types.
    pub fn get<T: ParameterType>(&mut self, key: &ParameterKey<T>) -> T {
        let (value, raw) = match self.lookup(key.name()) {
            Some(raw) => match T::from_value(raw) {
                Some(v) => (v, raw.clone()),
                None => {
                    log::warn!(
                        "Parameter '{}' holds a {} value; expected the declared key type, using default",
                        key.name_str(),
                        raw.kind(),
                    );
                    let v = key.default_value().clone();
                    (v.clone(), v.into_value())
                }
            },
            None => {
                let v = key.default_value().clone();
                (v.clone(), v.into_value())
            }
        };
        self.mark_used(key.name(), raw);
        value
    }

    /// Non-marking read of a typed key. Returns `None` when unset.
    #[must_use]
    pub fn peek<T: ParameterType>(&self, key: &ParameterKey<T>) -> Option<T> {
        self.lookup(key.name()).and_then(T::from_value)
    }

    /// Non-marking raw read by symbol.
    #[must_use]
    pub fn peek_value(&self, name: Symbol) -> Option<&ParameterValue> {
        self.lookup(name)
    }

    /// Whether a key has an explicit value.
    #[must_use]
    pub fn contains(&self, name: Symbol) -> bool {
        self.values.binary_search_by_key(&name, |&(k, _)| k).is_ok()
    }

    #[inline]
    fn lookup(&self, name: Symbol) -> Option<&ParameterValue> {
        self.values
            .binary_search_by_key(&name, |&(k, _)| k)
            .ok()
            .map(|idx| &self.values[idx].1)
    }

    // ── Used-read tracking ───────────────────────────────────────────────────

    /// Records a read of `name` that observed `value`.
    pub(crate) fn mark_used(&mut self, name: Symbol, value: ParameterValue) {
        match self.used.binary_search_by_key(&name, |&(k, _)| k) {
            Ok(idx) => self.used[idx].1 = value,
            Err(idx) => self.used.insert(idx, (name, value)),
        }
    }

    /// Snapshot of every key read since the last reset, as its own set.
    ///
    /// The snapshot's values are the final observed values; its own used
    /// table starts empty.
    #[must_use]
    pub fn used_parameters(&self) -> ParameterSet {
        ParameterSet {
            values: self.used.clone(),
            used: Vec::new(),
        }
    }

    /// Snapshot restricted to the given keys (used by the composition
    /// stack to attribute reads to the sub-tree that made them).
    pub(crate) fn used_subset(&self, keys: &rustc_hash::FxHashSet<Symbol>) -> ParameterSet {
        ParameterSet {
            values: self
                .used
                .iter()
                .filter(|(name, _)| keys.contains(name))
                .cloned()
                .collect(),
            used: Vec::new(),
        }
    }

    /// Iterates the used table without snapshotting.
    pub fn used_iter(&self) -> impl Iterator<Item = &(Symbol, ParameterValue)> {
        self.used.iter()
    }

    /// Number of keys read since the last reset.
    #[must_use]
    pub fn used_len(&self) -> usize {
        self.used.len()
    }

    /// Clears the used table.
    pub fn reset_used(&mut self) {
        self.used.clear();
    }

    // ── Whole-set operations ─────────────────────────────────────────────────

    /// Merges `other`'s values into `self`; `other` wins on conflicts.
    ///
    /// Used when a generator source carries its own parameter set over the
    /// caller's compilation parameters.
    pub fn merge(&mut self, other: &ParameterSet) {
        for (name, value) in &other.values {
            self.set_value(*name, value.clone());
        }
    }

    /// Iterates all stored `(name, value)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, ParameterValue)> {
        self.values.iter()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Feeds a canonical, process-independent encoding of a set's stored values
/// into `h`. Entries are ordered by resolved name so the digest does not
/// depend on interning order; the used table is excluded.
pub(crate) fn write_canonical_values(set: &ParameterSet, h: &mut Xxh3) {
    use std::hash::Hasher as _;

    let mut entries: Vec<(&str, &ParameterValue)> = set
        .values
        .iter()
        .map(|(k, v)| (interner::resolve(*k), v))
        .collect();
    entries.sort_unstable_by_key(|(name, _)| *name);

    h.write_usize(entries.len());
    for (name, value) in entries {
        h.write(name.as_bytes());
        h.write_u8(0);
        value.write_canonical(h);
    }
}

// Identity is the stored values; the used table is bookkeeping.
impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for ParameterSet {}

impl Hash for ParameterSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str) -> ParameterKey<bool> {
        ParameterKey::new(name, false)
    }

    #[test]
    fn test_get_unset_returns_default_and_marks_used() {
        let key = ParameterKey::new("Test.BoneCount", 16u32);
        let mut params = ParameterSet::new();

        assert_eq!(params.get(&key), 16);
        assert_eq!(params.used_len(), 1);

        let used = params.used_parameters();
        assert_eq!(used.peek(&key), Some(16));
    }

    #[test]
    fn test_peek_does_not_mark_used() {
        let key = flag("Test.PeekFlag");
        let mut params = ParameterSet::new();
        params.set(&key, true);

        assert_eq!(params.peek(&key), Some(true));
        assert_eq!(params.used_len(), 0);
    }

    #[test]
    fn test_set_refreshes_used_value() {
        let key = ParameterKey::new("Test.MaxBones", 0u32);
        let mut params = ParameterSet::new();
        params.set(&key, 32);

        assert_eq!(params.get(&key), 32);
        params.set(&key, 64);

        // The read stays marked, but the recorded value is the adjusted one
        let used = params.used_parameters();
        assert_eq!(used.peek(&key), Some(64));
    }

    #[test]
    fn test_raise_only_grows() {
        let key = ParameterKey::new("Test.RaiseBones", 8u32);
        let mut params = ParameterSet::new();

        assert_eq!(params.raise(&key, 4), 8);
        assert_eq!(params.raise(&key, 72), 72);
        assert_eq!(params.peek(&key), Some(72));
    }

    #[test]
    fn test_hash_ignores_insertion_order() {
        use std::hash::BuildHasher;

        let a = ParameterKey::new("Test.OrderA", 0i32);
        let b = ParameterKey::new("Test.OrderB", 0i32);

        let mut p1 = ParameterSet::new();
        p1.set(&a, 1);
        p1.set(&b, 2);

        let mut p2 = ParameterSet::new();
        p2.set(&b, 2);
        p2.set(&a, 1);

        assert_eq!(p1, p2);
        let hasher = rustc_hash::FxBuildHasher;
        assert_eq!(hasher.hash_one(&p1), hasher.hash_one(&p2));
    }

    #[test]
    fn test_type_mismatch_falls_back_to_default() {
        let as_int = ParameterKey::new("Test.Conflicted", 7i32);
        let as_bool = ParameterKey::new("Test.Conflicted", true);

        let mut params = ParameterSet::new();
        params.set(&as_int, 42);

        // Same name, different declared type: default wins
        assert!(params.get(&as_bool));
    }

    #[test]
    fn test_merge_other_wins() {
        let a = flag("Test.MergeA");
        let b = flag("Test.MergeB");

        let mut base = ParameterSet::new();
        base.set(&a, false);

        let mut over = ParameterSet::new();
        over.set(&a, true);
        over.set(&b, true);

        base.merge(&over);
        assert_eq!(base.peek(&a), Some(true));
        assert_eq!(base.peek(&b), Some(true));
    }
}
