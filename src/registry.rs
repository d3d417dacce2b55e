//! Mixin Registry
//!
//! Process-wide table mapping generator names to their
//! [`MixinBuilder`]s. Registration happens once, during bootstrap, through
//! [`MixinRegistryBuilder`]; the built [`MixinRegistry`] is immutable by
//! construction, so concurrent lookups during composition need no
//! synchronization.
//!
//! Registering the same name twice is an error: a silently replaced
//! builder would make hot-reloaded generator modules shadow each other in
//! registration order, which is never what the caller meant.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::compose::MixinBuilder;
use crate::errors::{Result, WeftError};
use crate::utils::interner::{self, Symbol};

/// Append-only registration phase.
#[derive(Default)]
pub struct MixinRegistryBuilder {
    builders: FxHashMap<Symbol, Arc<dyn MixinBuilder>>,
}

impl MixinRegistryBuilder {
    /// Creates an empty registration phase and pre-interns well-known
    /// parameter names.
    #[must_use]
    pub fn new() -> Self {
        interner::preload_well_known();
        Self::default()
    }

    /// Registers a builder under a generator name.
    ///
    /// Fails with [`WeftError::DuplicateMixin`] when the name is taken.
    pub fn register(&mut self, name: &str, builder: impl MixinBuilder + 'static) -> Result<()> {
        let sym = interner::intern(name);
        if self.builders.contains_key(&sym) {
            return Err(WeftError::DuplicateMixin(name.to_string()));
        }
        self.builders.insert(sym, Arc::new(builder));
        Ok(())
    }

    /// Finalizes registration. No further builders can be added.
    #[must_use]
    pub fn build(self) -> MixinRegistry {
        log::debug!("Mixin registry sealed with {} generator(s)", self.builders.len());
        MixinRegistry {
            builders: self.builders,
        }
    }
}

/// Immutable name → builder table, safe for concurrent lookup.
pub struct MixinRegistry {
    builders: FxHashMap<Symbol, Arc<dyn MixinBuilder>>,
}

impl MixinRegistry {
    /// Starts a registration phase.
    #[must_use]
    pub fn builder() -> MixinRegistryBuilder {
        MixinRegistryBuilder::new()
    }

    /// Looks up the builder registered under `name`.
    ///
    /// Returns `None` for unregistered names; composition turns that into
    /// a hard error naming the missing mixin and its requesting parent.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn MixinBuilder>> {
        let sym = interner::get(name)?;
        self.builders.get(&sym).cloned()
    }

    /// Whether a generator name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.builders.contains_key(&sym))
    }

    /// Number of registered generators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no generators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::CompositionContext;

    fn noop(_ctx: &mut CompositionContext<'_>) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_lookup_registered_name() {
        let mut builder = MixinRegistry::builder();
        builder.register("ForwardShading", noop).unwrap();
        let registry = builder.build();

        assert!(registry.lookup("ForwardShading").is_some());
        assert!(registry.contains("ForwardShading"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unregistered_name_is_none() {
        let registry = MixinRegistry::builder().build();
        assert!(registry.lookup("DoesNotExist").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut builder = MixinRegistry::builder();
        builder.register("Twice", noop).unwrap();

        let err = builder.register("Twice", noop).unwrap_err();
        assert_eq!(err, WeftError::DuplicateMixin("Twice".to_string()));
    }
}
