//! Content-Addressed Fragment Storage
//!
//! The compiler obtains raw fragment source text and its content-derived
//! identity through an externally supplied [`ContentStorage`]. The core
//! only depends on the contract "given a logical fragment path, retrieve
//! bytes and a content hash"; where the bytes live is the provider's
//! business.
//!
//! A missing fragment hashes to [`SourceHash::ZERO`] ("untracked"), which
//! forces conservative cache behavior upstream: an untracked entry is
//! treated as always-stale rather than silently skipping invalidation.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::{Result, WeftError};

/// Content-derived identity of one fragment source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceHash(u128);

impl SourceHash {
    /// The "untracked" hash: no content identity is known.
    pub const ZERO: SourceHash = SourceHash(0);

    /// Hashes raw fragment bytes.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(xxh3_128(data))
    }

    /// Whether this is the untracked hash.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The raw 128-bit digest.
    #[inline]
    #[must_use]
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Provider of fragment source bytes and their content identity.
///
/// Implementations must be safe for concurrent reads; compilations on
/// separate threads query storage simultaneously.
pub trait ContentStorage: Send + Sync {
    /// Whether a fragment exists at this logical path.
    fn exists(&self, path: &str) -> bool;

    /// Reads the fragment's bytes.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// The fragment's content hash — the chunk-header identity used in
    /// composite cache keys. [`SourceHash::ZERO`] when the path is
    /// missing or the provider does not track content.
    fn content_hash(&self, path: &str) -> SourceHash;
}

struct StoredChunk {
    data: Vec<u8>,
    hash: SourceHash,
}

/// In-memory [`ContentStorage`], hashing chunks on insert.
///
/// The standard provider for tests and tooling; engine integrations
/// supply their own asset-database-backed implementation.
#[derive(Default)]
pub struct MemoryStorage {
    chunks: RwLock<FxHashMap<String, Arc<StoredChunk>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a fragment source.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        let hash = SourceHash::of(&data);
        self.chunks
            .write()
            .insert(path.to_string(), Arc::new(StoredChunk { data, hash }));
    }

    /// Removes a fragment source. Returns whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.chunks.write().remove(path).is_some()
    }

    /// Number of stored fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether no fragments are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

impl ContentStorage for MemoryStorage {
    fn exists(&self, path: &str) -> bool {
        self.chunks.read().contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.chunks
            .read()
            .get(path)
            .map(|chunk| chunk.data.clone())
            .ok_or_else(|| WeftError::FragmentSourceNotFound(path.to_string()))
    }

    fn content_hash(&self, path: &str) -> SourceHash {
        self.chunks
            .read()
            .get(path)
            .map_or(SourceHash::ZERO, |chunk| chunk.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_read_round_trip() {
        let storage = MemoryStorage::new();
        storage.insert("Basic", "float4 main() { return 1; }");

        assert!(storage.exists("Basic"));
        assert_eq!(
            storage.read("Basic").unwrap(),
            b"float4 main() { return 1; }"
        );
    }

    #[test]
    fn test_missing_fragment_hashes_to_zero() {
        let storage = MemoryStorage::new();
        assert!(storage.content_hash("Missing").is_zero());
        assert_eq!(
            storage.read("Missing").unwrap_err(),
            WeftError::FragmentSourceNotFound("Missing".to_string())
        );
    }

    #[test]
    fn test_content_hash_tracks_content() {
        let storage = MemoryStorage::new();
        storage.insert("Frag", "v1");
        let h1 = storage.content_hash("Frag");

        storage.insert("Frag", "v2");
        let h2 = storage.content_hash("Frag");

        assert_ne!(h1, h2);
        assert!(!h1.is_zero());

        storage.insert("Frag", "v1");
        assert_eq!(storage.content_hash("Frag"), h1);
    }
}
