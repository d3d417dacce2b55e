//! Bytecode Cache
//!
//! Memoizes backend output by composite content key and provides the
//! at-most-one-compile-in-flight-per-key guarantee: the first requester
//! of a missing key runs the backend, concurrent requesters of the same
//! key receive the same [`PendingCompile`] handle and observe the
//! identical outcome. Entries for different keys never contend beyond the
//! map lock.
//!
//! [`BytecodeCache::reset`] performs targeted invalidation: every cached
//! entry whose fragment set intersects the modified names is dropped,
//! unrelated entries (including in-flight ones) are untouched.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use xxhash_rust::xxh3::Xxh3;

use crate::compiler::backend::{BackendResult, CompiledOutcome, PendingCompile};
use crate::params::{self, ParameterSet};
use crate::source::ShaderMixinSource;
use crate::storage::SourceHash;
use crate::utils::interner::{self, Symbol};

/// Composite content key: structural tree hash, used-parameter values,
/// and per-fragment source hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u128);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Derives the cache key for one compilation.
///
/// Any change to the tree structure, to a used-parameter value, or to a
/// contributing fragment's source hash changes the key. Fragment hashes
/// are folded in name order, so the digest is independent of traversal
/// order.
#[must_use]
pub fn compute_cache_key(
    mixin: &ShaderMixinSource,
    used: &ParameterSet,
    source_hashes: &[(&str, SourceHash)],
) -> CacheKey {
    use std::hash::Hasher as _;

    let mut h = Xxh3::new();
    mixin.write_canonical(&mut h);
    params::set::write_canonical_values(used, &mut h);

    let mut hashes: Vec<(&str, SourceHash)> = source_hashes.to_vec();
    hashes.sort_unstable_by_key(|(name, _)| *name);
    h.write_usize(hashes.len());
    for (name, hash) in hashes {
        h.write(name.as_bytes());
        h.write_u8(0);
        h.write_u128(hash.as_u128());
    }

    CacheKey(h.digest128())
}

/// What a cache query produced for the caller.
pub enum CachedCompile {
    /// A finished outcome — a hit, or a synchronous compile that just ran.
    Ready(CompiledOutcome),
    /// A shared handle for the single compilation in flight for this key.
    Pending(Arc<PendingCompile>),
}

enum Slot {
    Ready(CompiledOutcome),
    InFlight(Arc<PendingCompile>),
}

struct CacheEntry {
    slot: Slot,
    /// Fragment names the entry's tree transitively depends on.
    fragments: FxHashSet<Symbol>,
}

type EntryMap = FxHashMap<CacheKey, CacheEntry>;

/// Concurrent bytecode store keyed by [`CacheKey`].
#[derive(Default)]
pub struct BytecodeCache {
    entries: Arc<Mutex<EntryMap>>,
}

impl BytecodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key`, running `compile` when the key is absent.
    ///
    /// The compile closure runs outside the map lock; requesters arriving
    /// while it runs receive the in-flight handle instead of re-running
    /// the backend. Failed outcomes (no bytecode) are not cached, so a
    /// fixed fragment can be retried without an explicit reset.
    pub fn get_or_compile<F>(
        &self,
        key: CacheKey,
        fragments: FxHashSet<Symbol>,
        compile: F,
    ) -> CachedCompile
    where
        F: FnOnce() -> BackendResult,
    {
        let pending = {
            let mut map = self.entries.lock();
            match map.get(&key) {
                Some(entry) => match &entry.slot {
                    Slot::Ready(outcome) => {
                        log::debug!("Bytecode cache hit for {key}");
                        return CachedCompile::Ready(outcome.clone());
                    }
                    Slot::InFlight(handle) => {
                        log::debug!("Joining in-flight compilation for {key}");
                        return CachedCompile::Pending(handle.clone());
                    }
                },
                None => {
                    let handle = Arc::new(PendingCompile::new());
                    map.insert(
                        key,
                        CacheEntry {
                            slot: Slot::InFlight(handle.clone()),
                            fragments,
                        },
                    );
                    handle
                }
            }
        };

        match compile() {
            BackendResult::Done(outcome) => {
                Self::finalize(&self.entries, key, &pending, &outcome);
                pending.fulfill(outcome.clone());
                CachedCompile::Ready(outcome)
            }
            BackendResult::Deferred(backend_handle) => {
                // Bridge the backend's handle into the one already handed
                // to other requesters, then finalize the map entry.
                let entries = self.entries.clone();
                let published = pending.clone();
                std::thread::spawn(move || {
                    let outcome = backend_handle.wait();
                    Self::finalize(&entries, key, &published, &outcome);
                    published.fulfill(outcome);
                });
                CachedCompile::Pending(pending)
            }
        }
    }

    /// Stores the outcome for `key`, unless the entry was invalidated (or
    /// replaced) while the compilation ran.
    fn finalize(
        entries: &Mutex<EntryMap>,
        key: CacheKey,
        expected: &Arc<PendingCompile>,
        outcome: &CompiledOutcome,
    ) {
        let mut map = entries.lock();
        let ours = matches!(
            map.get(&key),
            Some(CacheEntry { slot: Slot::InFlight(handle), .. })
                if Arc::ptr_eq(handle, expected)
        );
        if !ours {
            // Reset raced us; the fresh result may already be stale.
            return;
        }
        if outcome.bytecode.is_some() {
            let entry = map.get_mut(&key).expect("checked above");
            entry.slot = Slot::Ready(outcome.clone());
        } else {
            map.remove(&key);
        }
    }

    /// Invalidates every entry depending on one of the named fragments.
    ///
    /// Returns the number of entries dropped. Entries for unrelated keys,
    /// including compilations currently in flight, are untouched.
    pub fn reset(&self, fragments: &[&str]) -> usize {
        let symbols: FxHashSet<Symbol> =
            fragments.iter().filter_map(|name| interner::get(name)).collect();
        if symbols.is_empty() {
            return 0;
        }

        let mut map = self.entries.lock();
        let before = map.len();
        map.retain(|_, entry| entry.fragments.is_disjoint(&symbols));
        let dropped = before - map.len();
        if dropped > 0 {
            log::debug!("Invalidated {dropped} cached bytecode(s) for modified fragments");
        }
        dropped
    }

    /// Number of cached entries (ready and in flight).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
