//! Mixin Composition
//!
//! The evaluation model that expands a generator reference into a composed
//! [`ShaderMixinSource`](crate::source::ShaderMixinSource) tree:
//!
//! - [`MixinBuilder`]: one unit of composition logic per registered
//!   generator — a short, declarative sequence of conditionals over
//!   parameter reads deciding which fragments and nested slots to emit
//! - [`CompositionStack`]: the LIFO push/pop protocol for composition
//!   slots, with out-of-order closes rejected as builder bugs
//! - [`CompositionContext`]: the API handed to builders; its scoped
//!   [`compose`](CompositionContext::compose) helpers guarantee balanced
//!   slots on every exit path, including early returns
//!
//! Composition is synchronous and single-threaded per compilation call;
//! independent compilations may run concurrently with their own contexts.

pub mod builder;
pub mod context;
pub mod stack;

pub use builder::MixinBuilder;
pub use context::CompositionContext;
pub use stack::{CompositionStack, SlotState};
