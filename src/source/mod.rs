//! Shader Sources
//!
//! The input side of the compilation pipeline:
//!
//! - [`ShaderSource`]: tagged union of everything a caller can ask the
//!   compiler to build — a single fragment reference, a named generator
//!   reference, an explicit pre-built tree, or an array (only meaningful
//!   inside composition parameters)
//! - [`ShaderClassSource`]: one fragment reference with instantiation
//!   arguments
//! - [`ShaderGeneratorSource`]: a registered generator name plus the
//!   parameters it composes under
//! - [`ShaderMixinSource`]: the composed tree (see [`mixin`])
//! - [`ShaderMacros`]: the per-node preprocessor macro table (see
//!   [`macros`])
//!
//! All source values are immutable once constructed; the compiler
//! normalizes them into a [`ShaderMixinSource`] tree at a single exhaustive
//! match point.

pub mod macros;
pub mod mixin;

pub use macros::ShaderMacros;
pub use mixin::{CompositionSlot, ShaderMixinSource};

use smallvec::SmallVec;
use xxhash_rust::xxh3::Xxh3;

use crate::params::ParameterSet;
use crate::utils::interner::{self, Symbol};

/// A reference to a single shader fragment, with optional instantiation
/// arguments.
///
/// Arguments participate in structural hashing: `Fog<LINEAR>` and
/// `Fog<EXP2>` are distinct fragments for caching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderClassSource {
    class_name: Symbol,
    generic_args: SmallVec<[Symbol; 2]>,
}

impl ShaderClassSource {
    /// Creates a fragment reference without arguments.
    #[must_use]
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: interner::intern(class_name),
            generic_args: SmallVec::new(),
        }
    }

    /// Creates a fragment reference with instantiation arguments.
    #[must_use]
    pub fn with_args(class_name: &str, args: &[&str]) -> Self {
        Self {
            class_name: interner::intern(class_name),
            generic_args: args.iter().map(|a| interner::intern(a)).collect(),
        }
    }

    /// The fragment's interned class name.
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> Symbol {
        self.class_name
    }

    /// The fragment's class name as a string.
    #[inline]
    #[must_use]
    pub fn class_name_str(&self) -> &'static str {
        interner::resolve(self.class_name)
    }

    /// The instantiation arguments as strings.
    pub fn args(&self) -> impl Iterator<Item = &'static str> {
        self.generic_args.iter().map(|sym| interner::resolve(*sym))
    }

    pub(crate) fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        h.write(self.class_name_str().as_bytes());
        h.write_u8(0);
        h.write_usize(self.generic_args.len());
        for arg in self.args() {
            h.write(arg.as_bytes());
            h.write_u8(0);
        }
    }
}

/// A reference to a registered mixin generator, plus the parameter set it
/// composes under (merged over the caller's compilation parameters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderGeneratorSource {
    generator_name: Symbol,
    parameters: ParameterSet,
}

impl ShaderGeneratorSource {
    /// Creates a generator reference with an empty parameter set.
    #[must_use]
    pub fn new(generator_name: &str) -> Self {
        Self {
            generator_name: interner::intern(generator_name),
            parameters: ParameterSet::new(),
        }
    }

    /// Creates a generator reference carrying its own parameters.
    #[must_use]
    pub fn with_parameters(generator_name: &str, parameters: ParameterSet) -> Self {
        Self {
            generator_name: interner::intern(generator_name),
            parameters,
        }
    }

    /// The generator's interned name.
    #[inline]
    #[must_use]
    pub fn generator_name(&self) -> Symbol {
        self.generator_name
    }

    /// The generator's name as a string.
    #[inline]
    #[must_use]
    pub fn generator_name_str(&self) -> &'static str {
        interner::resolve(self.generator_name)
    }

    /// The parameters carried by this reference.
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }
}

/// Everything a caller can hand to the effect compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShaderSource {
    /// A single fragment, wrapped into a singleton tree at compile time.
    Class(ShaderClassSource),
    /// A named generator reference, expanded through the registry.
    Generator(ShaderGeneratorSource),
    /// An explicit pre-built tree, used as-is.
    Mixin(ShaderMixinSource),
    /// An ordered list of sources. Only meaningful as a composition
    /// parameter value; rejected at the top level of a compilation.
    Array(Vec<ShaderSource>),
}

impl ShaderSource {
    /// Convenience constructor for a plain fragment reference.
    #[must_use]
    pub fn class(class_name: &str) -> Self {
        ShaderSource::Class(ShaderClassSource::new(class_name))
    }

    /// Convenience constructor for a generator reference.
    #[must_use]
    pub fn generator(generator_name: &str) -> Self {
        ShaderSource::Generator(ShaderGeneratorSource::new(generator_name))
    }

    /// Short kind label for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ShaderSource::Class(_) => "class",
            ShaderSource::Generator(_) => "generator",
            ShaderSource::Mixin(_) => "mixin",
            ShaderSource::Array(_) => "array",
        }
    }

    pub(crate) fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        match self {
            ShaderSource::Class(class) => {
                h.write_u8(1);
                class.write_canonical(h);
            }
            ShaderSource::Generator(generator) => {
                h.write_u8(2);
                h.write(generator.generator_name_str().as_bytes());
                h.write_u8(0);
                crate::params::set::write_canonical_values(generator.parameters(), h);
            }
            ShaderSource::Mixin(mixin) => {
                h.write_u8(3);
                mixin.write_canonical(h);
            }
            ShaderSource::Array(sources) => {
                h.write_u8(4);
                h.write_usize(sources.len());
                for source in sources {
                    source.write_canonical(h);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_args_change_identity() {
        let linear = ShaderClassSource::with_args("Fog", &["LINEAR"]);
        let exp2 = ShaderClassSource::with_args("Fog", &["EXP2"]);
        assert_ne!(linear, exp2);

        let mut h1 = Xxh3::new();
        let mut h2 = Xxh3::new();
        linear.write_canonical(&mut h1);
        exp2.write_canonical(&mut h2);
        assert_ne!(h1.digest128(), h2.digest128());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(ShaderSource::class("Basic").kind(), "class");
        assert_eq!(ShaderSource::generator("Forward").kind(), "generator");
        assert_eq!(ShaderSource::Array(Vec::new()).kind(), "array");
    }
}
