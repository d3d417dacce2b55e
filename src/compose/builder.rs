//! Mixin Builders
//!
//! A [`MixinBuilder`] is the unit of logic behind one registered generator
//! name. Builders are pure over their inputs: the same parameter set always
//! produces the same tree mutations, which is what makes composed trees
//! cacheable by content hash.

use crate::compose::context::CompositionContext;
use crate::errors::Result;

/// Composition logic for one named generator.
///
/// A builder inspects the active parameters through the context, decides
/// which child fragments to mix into the current node, which nested
/// composition slots to open, and which macros to inject. Builders may
/// mutate parameters opportunistically (see
/// [`CompositionContext::raise_param`]); later builders and the backend
/// observe the adjusted values.
///
/// Builders must be `Send + Sync`: the registry shares them across
/// concurrent compilations.
pub trait MixinBuilder: Send + Sync {
    /// Populates the context's current tree node.
    fn generate(&self, ctx: &mut CompositionContext<'_>) -> Result<()>;
}

/// Plain functions and closures are builders, which keeps registration
/// terse for simple generators.
impl<F> MixinBuilder for F
where
    F: Fn(&mut CompositionContext<'_>) -> Result<()> + Send + Sync,
{
    fn generate(&self, ctx: &mut CompositionContext<'_>) -> Result<()> {
        self(ctx)
    }
}
