//! Effect Compilation
//!
//! The output side of the pipeline:
//!
//! - [`EffectCompiler`]: normalization, used-parameter injection, and
//!   backend dispatch through the bytecode cache
//! - [`EffectBackend`]: the pluggable per-graphics-API code generator,
//!   with [`SourceAssemblerBackend`] as the storage-backed reference
//!   implementation and [`ThreadedBackend`] as the worker-thread adapter
//! - [`BytecodeCache`]: content-keyed memoization with
//!   at-most-one-compile-in-flight-per-key semantics
//! - [`CompilerResult`]: module label, ordered log, bytecode (ready or
//!   pending), and the used-parameter snapshot

pub mod assembler;
pub mod backend;
pub mod cache;
pub mod effect;
pub mod result;

pub use assembler::SourceAssemblerBackend;
pub use backend::{
    BackendResult, CompiledBytecode, CompiledOutcome, EffectBackend, EffectBytecode,
    PendingCompile, ThreadedBackend,
};
pub use cache::{BytecodeCache, CacheKey, CachedCompile, compute_cache_key};
pub use effect::EffectCompiler;
pub use result::{CompilerResult, EffectLog, LogEntry, LogSeverity};
