#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! Weft — a shader mixin composition compiler.
//!
//! Weft assembles a final GPU shader program from a tree of named,
//! parameterized fragments ("mixins"), resolves conditional composition
//! logic driven by a key/value parameter set, and emits platform-specific
//! bytecode with content-addressed caching.

pub mod compiler;
pub mod compose;
pub mod errors;
pub mod params;
pub mod registry;
pub mod source;
pub mod storage;
pub mod utils;

pub use compiler::{
    BackendResult, CompiledBytecode, CompiledOutcome, CompilerResult, EffectBackend,
    EffectBytecode, EffectCompiler, EffectLog, LogEntry, LogSeverity, SourceAssemblerBackend,
    ThreadedBackend,
};
pub use compose::{CompositionContext, MixinBuilder, SlotState};
pub use errors::{Result, WeftError};
pub use params::{
    GraphicsPlatform, GraphicsProfile, ParameterKey, ParameterSet, ParameterValue,
};
pub use registry::{MixinRegistry, MixinRegistryBuilder};
pub use source::{
    CompositionSlot, ShaderClassSource, ShaderGeneratorSource, ShaderMacros, ShaderMixinSource,
    ShaderSource,
};
pub use storage::{ContentStorage, MemoryStorage, SourceHash};
pub use utils::interner;
