//! Effect Compiler
//!
//! Orchestrates one compilation: a top-level [`ShaderSource`] is
//! normalized into a composed [`ShaderMixinSource`] tree at a single
//! exhaustive match point, the platform/profile/debug parameters are
//! injected into the tree's used set, and the tree is handed to the
//! backend through the bytecode cache.
//!
//! Configuration errors (unsupported source kind, empty mixin name,
//! unresolved generator) abort the call and surface as one fatal log
//! entry on the returned result; backend failures arrive as error entries
//! from the backend's own log. The compiler itself never panics on bad
//! input.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::compiler::backend::{CompiledBytecode, EffectBackend};
use crate::compiler::cache::{BytecodeCache, CachedCompile, compute_cache_key};
use crate::compiler::result::CompilerResult;
use crate::compose::CompositionContext;
use crate::errors::{Result, WeftError};
use crate::params::{ParameterSet, well_known};
use crate::registry::MixinRegistry;
use crate::source::{ShaderMixinSource, ShaderSource};
use crate::storage::SourceHash;
use crate::utils::interner::{self, Symbol};

/// Compiles shader sources into cached, platform-specific bytecode.
///
/// One instance serves many concurrent `compile` calls; each call gets
/// its own working parameter set and composition context, while the
/// registry, backend, and bytecode cache are shared.
pub struct EffectCompiler {
    registry: Arc<MixinRegistry>,
    backend: Arc<dyn EffectBackend>,
    cache: BytecodeCache,
}

impl EffectCompiler {
    #[must_use]
    pub fn new(registry: Arc<MixinRegistry>, backend: Arc<dyn EffectBackend>) -> Self {
        Self {
            registry,
            backend,
            cache: BytecodeCache::new(),
        }
    }

    /// The shared generator registry.
    #[must_use]
    pub fn registry(&self) -> &MixinRegistry {
        &self.registry
    }

    /// Number of bytecode cache entries (ready and in flight).
    #[must_use]
    pub fn cached_bytecode_count(&self) -> usize {
        self.cache.len()
    }

    /// Compiles `source` under `parameters`.
    ///
    /// Never fails outright: configuration errors come back as a result
    /// whose log holds one fatal entry and whose bytecode is absent.
    #[must_use]
    pub fn compile(&self, source: &ShaderSource, parameters: &ParameterSet) -> CompilerResult {
        let mut params = parameters.clone();
        params.reset_used();

        let mut tree = match self.normalize(source, &mut params) {
            Ok(tree) => tree,
            Err(e) => {
                log::error!("Effect compilation failed: {e}");
                let mut result = CompilerResult::named(Self::source_label(source));
                result.log_mut().fatal(e.to_string());
                return result;
            }
        };

        // Platform, profile and debug always affect code generation, even
        // when no builder reads them explicitly.
        let _ = params.get(&well_known::PLATFORM);
        let _ = params.get(&well_known::PROFILE);
        let _ = params.get(&well_known::DEBUG);

        let mut used = tree.used_parameters().clone();
        used.merge(&params.used_parameters());
        tree.set_used_parameters(used.clone());

        let mut fragments: FxHashSet<Symbol> = FxHashSet::default();
        tree.collect_fragment_names(&mut fragments);
        let source_hashes: Vec<(&str, SourceHash)> = fragments
            .iter()
            .map(|sym| {
                let name = interner::resolve(*sym);
                (name, self.backend.shader_source_hash(name))
            })
            .collect();

        let key = compute_cache_key(&tree, &used, &source_hashes);
        log::debug!("Compiling effect '{}' (cache key {key})", tree.name_str());

        let cached = self
            .cache
            .get_or_compile(key, fragments, || self.backend.compile(&tree, &used));

        let mut result = CompilerResult::named(tree.name_str());
        match cached {
            CachedCompile::Ready(outcome) => {
                // Only populate result fields when there is something to
                // report; an all-empty result means "nothing to compile".
                if outcome.bytecode.is_some() || !outcome.log.is_empty() {
                    result.set_log(outcome.log.clone());
                    if let Some(bytecode) = outcome.bytecode {
                        result.set_bytecode(CompiledBytecode::Ready(bytecode));
                    }
                    result.set_used_parameters(used);
                }
            }
            CachedCompile::Pending(handle) => {
                result.set_bytecode(CompiledBytecode::Pending(handle));
                result.set_used_parameters(used);
            }
        }
        result
    }

    /// Invalidates cached bytecode depending on the named fragments and
    /// forwards the reset to the backend (whose base behavior is a
    /// no-op).
    pub fn reset_cache(&self, fragments: &[&str]) {
        self.cache.reset(fragments);
        self.backend.reset_cache(fragments);
    }

    /// Content hash of one named fragment's source.
    ///
    /// [`SourceHash::ZERO`] means "untracked": the fragment's staleness
    /// cannot be proven, so dependent entries are treated conservatively.
    #[must_use]
    pub fn shader_source_hash(&self, fragment: &str) -> SourceHash {
        self.backend.shader_source_hash(fragment)
    }

    // ── Normalization ────────────────────────────────────────────────────────

    fn normalize(
        &self,
        source: &ShaderSource,
        params: &mut ParameterSet,
    ) -> Result<ShaderMixinSource> {
        let tree = match source {
            ShaderSource::Class(class) => {
                // A lone fragment becomes a singleton tree named after it.
                let mut tree = ShaderMixinSource::new(class.class_name_str());
                tree.add_mixin(class.clone());
                tree
            }
            ShaderSource::Generator(generator) => {
                params.merge(generator.parameters());
                let name = generator.generator_name_str();
                let builder =
                    self.registry
                        .lookup(name)
                        .ok_or_else(|| WeftError::MixinNotFound {
                            name: name.to_string(),
                            requested_by: "<top-level>".to_string(),
                        })?;
                let mut ctx = CompositionContext::new(&self.registry, params, name);
                builder.generate(&mut ctx)?;
                ctx.finish()?
            }
            ShaderSource::Mixin(mixin) => mixin.clone(),
            other @ ShaderSource::Array(_) => {
                return Err(WeftError::UnsupportedSourceKind(other.kind()));
            }
        };

        if tree.name_str().is_empty() {
            return Err(WeftError::MissingMixinName);
        }
        Ok(tree)
    }

    fn source_label(source: &ShaderSource) -> &str {
        match source {
            ShaderSource::Class(class) => class.class_name_str(),
            ShaderSource::Generator(generator) => generator.generator_name_str(),
            ShaderSource::Mixin(mixin) => mixin.name_str(),
            ShaderSource::Array(_) => "",
        }
    }
}
