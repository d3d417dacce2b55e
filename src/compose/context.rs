//! Composition Context
//!
//! The API handed to [`MixinBuilder`](crate::compose::MixinBuilder)s.
//! All tree mutation goes through the context, which owns the
//! [`CompositionStack`] and the registry/parameter references for one
//! compilation: fragments are mixed into the node currently on top of the
//! stack, and nested slots are opened with the scoped
//! [`compose`](CompositionContext::compose) helpers, which close the slot
//! on every exit path — an unbalanced slot cannot be written with this
//! API.
//!
//! The raw [`push_composition`](CompositionContext::push_composition) /
//! [`pop_composition`](CompositionContext::pop_composition) protocol is
//! still exposed for callers that need manual control; it keeps the full
//! LIFO validation of the underlying stack.

use crate::compose::stack::{CompositionStack, SlotState};
use crate::errors::{Result, WeftError};
use crate::params::{ParameterKey, ParameterSet, ParameterType};
use crate::registry::MixinRegistry;
use crate::source::{ShaderClassSource, ShaderMixinSource, ShaderSource};

/// Builder-facing view of one composition in progress.
pub struct CompositionContext<'a> {
    registry: &'a MixinRegistry,
    params: &'a mut ParameterSet,
    stack: CompositionStack,
}

impl<'a> CompositionContext<'a> {
    /// Creates a context with a fresh root node named `root_name`.
    #[must_use]
    pub fn new(registry: &'a MixinRegistry, params: &'a mut ParameterSet, root_name: &str) -> Self {
        Self {
            registry,
            params,
            stack: CompositionStack::new(ShaderMixinSource::new(root_name)),
        }
    }

    // ── Mixing fragments ─────────────────────────────────────────────────────

    /// Appends a fragment to the current node.
    ///
    /// If `name` resolves to a registered generator, the generator is
    /// expanded recursively into the current node instead; otherwise the
    /// name is taken as a plain fragment reference.
    pub fn mixin(&mut self, name: &str) -> Result<()> {
        if let Some(builder) = self.registry.lookup(name) {
            builder.generate(self)
        } else {
            self.stack
                .current_mut()
                .add_mixin(ShaderClassSource::new(name));
            Ok(())
        }
    }

    /// Appends a raw fragment reference (with instantiation arguments) to
    /// the current node. Never consults the registry.
    pub fn mixin_class(&mut self, class: ShaderClassSource) {
        self.stack.current_mut().add_mixin(class);
    }

    /// Expands a generator into the current node.
    ///
    /// Unlike [`mixin`](Self::mixin), the name *must* be registered;
    /// an unresolved name is a hard compilation error identifying the
    /// missing mixin and the requesting parent.
    pub fn mixin_generator(&mut self, name: &str) -> Result<()> {
        match self.registry.lookup(name) {
            Some(builder) => builder.generate(self),
            None => Err(WeftError::MixinNotFound {
                name: name.to_string(),
                requested_by: self.stack.current().name_str().to_string(),
            }),
        }
    }

    /// Whether the current node already contains a fragment of this class.
    ///
    /// The early-exit hook: a builder that finds a full-override fragment
    /// present returns immediately instead of mixing its remaining
    /// conditional sections.
    #[must_use]
    pub fn has_mixin(&self, class_name: &str) -> bool {
        self.stack.current().has_mixin(class_name)
    }

    /// Defines a preprocessor macro on the current node.
    pub fn add_macro(&mut self, name: &str, value: &str) {
        self.stack.current_mut().add_macro(name, value);
    }

    // ── Parameters ───────────────────────────────────────────────────────────

    /// Reads a parameter, marking it used for the current sub-tree.
    pub fn get_param<T: ParameterType>(&mut self, key: &ParameterKey<T>) -> T {
        let value = self.params.get(key);
        self.stack.record_read(key.name());
        value
    }

    /// Writes a parameter. Later readers observe the new value.
    pub fn set_param<T: ParameterType>(&mut self, key: &ParameterKey<T>, value: T) {
        self.params.set(key, value);
    }

    /// Raises a parameter to at least `value` and returns the result.
    ///
    /// The derived-value pattern: a skinning builder raises "max bones" to
    /// the actual bone count, and everything downstream observes the
    /// adjusted value.
    pub fn raise_param<T>(&mut self, key: &ParameterKey<T>, value: T) -> T
    where
        T: ParameterType + PartialOrd,
    {
        let result = self.params.raise(key, value);
        self.stack.record_read(key.name());
        result
    }

    // ── Composition slots ────────────────────────────────────────────────────

    /// Opens a single-valued slot, runs `f` with the fresh child node as
    /// the mixing target, and closes the slot — on success and on error
    /// alike.
    pub fn compose<F>(&mut self, slot: &str, child_name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.scoped(slot, false, child_name, f)
    }

    /// Array-valued variant of [`compose`](Self::compose): each call
    /// appends one sibling to the slot, in call order.
    pub fn compose_in_array<F>(&mut self, slot: &str, child_name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.scoped(slot, true, child_name, f)
    }

    /// Composes a shader-source parameter value into a single-valued slot.
    pub fn compose_source(
        &mut self,
        slot: &str,
        child_name: &str,
        source: &ShaderSource,
    ) -> Result<()> {
        self.scoped(slot, false, child_name, |ctx| ctx.apply_source(source))
    }

    /// Composes a shader-source parameter value as one element of an
    /// array-valued slot.
    pub fn compose_source_in_array(
        &mut self,
        slot: &str,
        child_name: &str,
        source: &ShaderSource,
    ) -> Result<()> {
        self.scoped(slot, true, child_name, |ctx| ctx.apply_source(source))
    }

    fn scoped<F>(&mut self, slot: &str, array: bool, child_name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.stack.push(slot, array, ShaderMixinSource::new(child_name));
        match f(self) {
            Ok(()) => self.stack.pop(slot, self.params),
            Err(e) => {
                // Keep the stack balanced so the error reported is the
                // builder's, not a follow-on unclosed-slot violation.
                let _ = self.stack.pop(slot, self.params);
                Err(e)
            }
        }
    }

    fn apply_source(&mut self, source: &ShaderSource) -> Result<()> {
        match source {
            ShaderSource::Class(class) => {
                self.mixin_class(class.clone());
                Ok(())
            }
            ShaderSource::Generator(generator) => {
                self.params.merge(generator.parameters());
                self.mixin_generator(generator.generator_name_str())
            }
            ShaderSource::Mixin(mixin) => self.stack.current_mut().absorb(mixin),
            ShaderSource::Array(sources) => {
                for source in sources {
                    self.apply_source(source)?;
                }
                Ok(())
            }
        }
    }

    // ── Raw slot protocol ────────────────────────────────────────────────────

    /// Opens a composition slot without scoping. Prefer
    /// [`compose`](Self::compose).
    pub fn push_composition(&mut self, slot: &str, array: bool, child_name: &str) {
        self.stack.push(slot, array, ShaderMixinSource::new(child_name));
    }

    /// Closes the most recently opened slot. Out-of-order closes are
    /// rejected.
    pub fn pop_composition(&mut self, slot: &str) -> Result<()> {
        self.stack.pop(slot, self.params)
    }

    // ── Introspection / completion ───────────────────────────────────────────

    /// The node mixing currently targets.
    #[must_use]
    pub fn current(&self) -> &ShaderMixinSource {
        self.stack.current()
    }

    /// The slot protocol state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.stack.state()
    }

    /// Number of open composition slots.
    #[must_use]
    pub fn open_slots(&self) -> usize {
        self.stack.open_slots()
    }

    /// Finishes the composition and returns the root node with its
    /// used-parameter snapshot attached.
    ///
    /// Fails if any composition slot is still open.
    pub fn finish(self) -> Result<ShaderMixinSource> {
        self.stack.finish(self.params)
    }
}
