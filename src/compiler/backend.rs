//! Backend Contract
//!
//! The seam between the composition core and a concrete shader compiler.
//! A backend receives a fully resolved mixin tree plus the used-parameter
//! snapshot, and returns either a finished [`CompiledOutcome`] or a
//! [`PendingCompile`] handle when the work is offloaded to a worker.
//!
//! Backend failures are data errors: they are reported through the
//! outcome's log, never raised. Determinism is part of the contract — the
//! same cache key must always produce the same bytecode.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use xxhash_rust::xxh3::xxh3_128;

use crate::compiler::result::EffectLog;
use crate::params::ParameterSet;
use crate::source::ShaderMixinSource;
use crate::storage::SourceHash;

/// Platform-specific compiled output of one mixin tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectBytecode {
    data: Vec<u8>,
    hash: u128,
}

impl EffectBytecode {
    /// Wraps compiled bytes, computing their content hash.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let hash = xxh3_128(&data);
        Self { data, hash }
    }

    /// The compiled bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Content hash of the bytes.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u128 {
        self.hash
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What one backend invocation produced: optional bytecode plus its log.
///
/// No bytecode with error entries is a failed compilation; no bytecode
/// with an empty log is "nothing to compile".
#[derive(Debug, Clone, Default)]
pub struct CompiledOutcome {
    pub bytecode: Option<Arc<EffectBytecode>>,
    pub log: EffectLog,
}

impl CompiledOutcome {
    /// A successful outcome with no diagnostics.
    #[must_use]
    pub fn ready(bytecode: EffectBytecode) -> Self {
        Self {
            bytecode: Some(Arc::new(bytecode)),
            log: EffectLog::new(),
        }
    }

    /// A failed outcome carrying only diagnostics.
    #[must_use]
    pub fn failed(log: EffectLog) -> Self {
        Self {
            bytecode: None,
            log,
        }
    }
}

/// Shared handle for a compilation running on a worker.
///
/// Multiple requesters of the same cache key hold clones of one handle;
/// [`wait`](PendingCompile::wait) blocks until the single in-flight
/// compilation fulfills it. Once submitted, a compilation runs to
/// completion — there is no cancellation.
#[derive(Default)]
pub struct PendingCompile {
    outcome: Mutex<Option<CompiledOutcome>>,
    ready: Condvar,
}

impl PendingCompile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the outcome and wakes all waiters. Fulfilling twice is a
    /// worker bug; the first outcome wins.
    pub fn fulfill(&self, outcome: CompiledOutcome) {
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
            self.ready.notify_all();
        } else {
            log::warn!("Pending compilation fulfilled twice; keeping the first outcome");
        }
    }

    /// Blocks until the outcome is published, then returns a clone of it.
    #[must_use]
    pub fn wait(&self) -> CompiledOutcome {
        let mut slot = self.outcome.lock();
        while slot.is_none() {
            self.ready.wait(&mut slot);
        }
        slot.as_ref().expect("guarded by loop").clone()
    }

    /// Non-blocking probe.
    #[must_use]
    pub fn try_get(&self) -> Option<CompiledOutcome> {
        self.outcome.lock().clone()
    }
}

impl std::fmt::Debug for PendingCompile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.try_get().is_some() {
            "fulfilled"
        } else {
            "in-flight"
        };
        f.debug_struct("PendingCompile").field("state", &state).finish()
    }
}

/// What a backend `compile` call returns.
#[derive(Debug)]
pub enum BackendResult {
    /// Compilation finished synchronously.
    Done(CompiledOutcome),
    /// Compilation was offloaded; the handle is fulfilled later.
    Deferred(Arc<PendingCompile>),
}

/// Bytecode attached to a [`CompilerResult`](super::CompilerResult):
/// either immediately available or still compiling.
///
/// [`wait`](CompiledBytecode::wait) is the single join point; for `Ready`
/// bytecode it returns immediately (the backend log was already copied
/// into the result), for `Pending` it blocks until the worker fulfills
/// the shared handle and returns the outcome including the worker's log.
#[derive(Debug, Clone)]
pub enum CompiledBytecode {
    Ready(Arc<EffectBytecode>),
    Pending(Arc<PendingCompile>),
}

impl CompiledBytecode {
    /// Whether the compilation is still in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, CompiledBytecode::Pending(_))
    }

    /// Joins the compilation and returns its outcome.
    #[must_use]
    pub fn wait(&self) -> CompiledOutcome {
        match self {
            CompiledBytecode::Ready(bytecode) => CompiledOutcome {
                bytecode: Some(bytecode.clone()),
                log: EffectLog::new(),
            },
            CompiledBytecode::Pending(handle) => handle.wait(),
        }
    }
}

/// The pluggable code generator behind the effect compiler.
///
/// Implemented once per target graphics API. The default trait methods
/// encode the base contract: sources are untracked
/// ([`SourceHash::ZERO`]) and cache reset is a no-op; concrete backends
/// override both to get incremental recompilation.
pub trait EffectBackend: Send + Sync {
    /// Compiles a fully resolved tree against the used-parameter
    /// snapshot.
    fn compile(&self, mixin: &ShaderMixinSource, parameters: &ParameterSet) -> BackendResult;

    /// Content hash of one named fragment's source, for composite cache
    /// keys.
    fn shader_source_hash(&self, _fragment: &str) -> SourceHash {
        SourceHash::ZERO
    }

    /// Drops backend-side caches for the named fragments.
    fn reset_cache(&self, _fragments: &[&str]) {}
}

/// Adapter running a synchronous backend on worker threads.
///
/// Every `compile` returns a [`BackendResult::Deferred`] handle fulfilled
/// from a spawned worker — the asynchronous-backend contract made
/// concrete for backends that are themselves blocking.
pub struct ThreadedBackend<B> {
    inner: Arc<B>,
}

impl<B: EffectBackend + 'static> ThreadedBackend<B> {
    #[must_use]
    pub fn new(inner: B) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<B: EffectBackend + 'static> EffectBackend for ThreadedBackend<B> {
    fn compile(&self, mixin: &ShaderMixinSource, parameters: &ParameterSet) -> BackendResult {
        let handle = Arc::new(PendingCompile::new());
        let worker_handle = handle.clone();
        let inner = self.inner.clone();
        let mixin = mixin.clone();
        let parameters = parameters.clone();

        std::thread::spawn(move || {
            let outcome = match inner.compile(&mixin, &parameters) {
                BackendResult::Done(outcome) => outcome,
                BackendResult::Deferred(nested) => nested.wait(),
            };
            worker_handle.fulfill(outcome);
        });

        BackendResult::Deferred(handle)
    }

    fn shader_source_hash(&self, fragment: &str) -> SourceHash {
        self.inner.shader_source_hash(fragment)
    }

    fn reset_cache(&self, fragments: &[&str]) {
        self.inner.reset_cache(fragments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_compile_delivers_to_all_waiters() {
        let handle = Arc::new(PendingCompile::new());
        let bytecode = EffectBytecode::new(b"compiled".to_vec());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                std::thread::spawn(move || handle.wait())
            })
            .collect();

        handle.fulfill(CompiledOutcome::ready(bytecode.clone()));

        for waiter in waiters {
            let outcome = waiter.join().unwrap();
            assert_eq!(outcome.bytecode.as_deref(), Some(&bytecode));
        }
    }

    #[test]
    fn test_fulfill_twice_keeps_first() {
        let handle = PendingCompile::new();
        handle.fulfill(CompiledOutcome::ready(EffectBytecode::new(b"first".to_vec())));
        handle.fulfill(CompiledOutcome::ready(EffectBytecode::new(b"second".to_vec())));

        let outcome = handle.wait();
        assert_eq!(outcome.bytecode.unwrap().data(), b"first");
    }

    #[test]
    fn test_ready_bytecode_waits_immediately() {
        let bytecode = Arc::new(EffectBytecode::new(b"xyz".to_vec()));
        let compiled = CompiledBytecode::Ready(bytecode.clone());

        assert!(!compiled.is_pending());
        assert_eq!(compiled.wait().bytecode, Some(bytecode));
    }
}
