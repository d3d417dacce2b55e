//! Error Types
//!
//! This module defines the error types used throughout the compiler.
//!
//! # Overview
//!
//! The main error type [`WeftError`] covers all failure modes including:
//! - Shader-source normalization errors (unsupported kind, missing names)
//! - Mixin registry errors (unresolved or duplicate generator names)
//! - Composition-stack consistency violations
//! - Storage provider errors
//!
//! # Error policy
//!
//! Configuration errors (a bad shader source, an unresolved mixin name) are
//! fatal to the current compilation and surface as a fatal entry in the
//! [`CompilerResult`](crate::compiler::CompilerResult) log. Backend
//! compilation failures are *data* errors: they are recorded in the log and
//! never raised, so a caller can decide to fall back to previously cached
//! bytecode. Composition-stack violations indicate a builder bug and abort
//! the compilation immediately.

use thiserror::Error;

/// The main error type for the Weft compiler.
///
/// Each variant carries enough context to identify the offending shader
/// source, mixin name, or composition slot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeftError {
    // ========================================================================
    // Shader source normalization errors
    // ========================================================================
    /// The shader source variant cannot be compiled by this pipeline.
    #[error("Unsupported shader source kind: {0}")]
    UnsupportedSourceKind(&'static str),

    /// A mixin tree was produced without a name.
    #[error("Missing mixin name on composed shader source")]
    MissingMixinName,

    // ========================================================================
    // Registry errors
    // ========================================================================
    /// A referenced mixin generator is not present in the registry.
    #[error("Mixin generator not found: '{name}' (requested by '{requested_by}')")]
    MixinNotFound {
        /// The unresolved generator name
        name: String,
        /// The mixin or source that referenced it
        requested_by: String,
    },

    /// A generator name was registered twice.
    #[error("Mixin generator registered twice: '{0}'")]
    DuplicateMixin(String),

    // ========================================================================
    // Composition stack errors
    // ========================================================================
    /// A composition slot was closed out of LIFO order.
    #[error("Composition slot '{expected}' closed out of order (got '{actual}')")]
    MismatchedComposition {
        /// The slot on top of the stack
        expected: String,
        /// The slot the caller tried to close
        actual: String,
    },

    /// A slot close was requested with no slot open.
    #[error("Composition pop with no open slot")]
    CompositionStackUnderflow,

    /// A builder returned while composition slots were still open.
    #[error("Builder for '{mixin}' exited with {open} unclosed composition slot(s)")]
    UnclosedComposition {
        /// The mixin whose builder misbehaved
        mixin: String,
        /// Number of slots left open
        open: usize,
    },

    /// A composition slot argument was malformed.
    #[error("Malformed composition slot '{slot}': {reason}")]
    MalformedSlot {
        /// The offending slot name
        slot: String,
        /// Why it was rejected
        reason: String,
    },

    // ========================================================================
    // Storage errors
    // ========================================================================
    /// A fragment source could not be retrieved from storage.
    #[error("Fragment source not found in storage: '{0}'")]
    FragmentSourceNotFound(String),
}

/// Alias for `Result<T, WeftError>`.
pub type Result<T> = std::result::Result<T, WeftError>;
