//! Typed Parameter Keys
//!
//! A [`ParameterKey`] is an immutable `(name, type, default)` descriptor.
//! The interned name is the key's identity: two keys constructed anywhere
//! in the process with the same name denote the same semantic slot.

use std::marker::PhantomData;

use crate::params::value::ParameterType;
use crate::utils::interner::{self, Symbol};

/// Immutable descriptor identifying one parameter slot.
///
/// Keys are cheap to construct and are usually declared once as statics:
///
/// ```rust,ignore
/// use std::sync::LazyLock;
/// use weft::params::ParameterKey;
///
/// static LIGHT_COUNT: LazyLock<ParameterKey<u32>> =
///     LazyLock::new(|| ParameterKey::new("Lighting.DirectLightCount", 0));
/// ```
#[derive(Debug, Clone)]
pub struct ParameterKey<T> {
    name: Symbol,
    default: T,
    _ty: PhantomData<fn() -> T>,
}

impl<T: ParameterType> ParameterKey<T> {
    /// Creates a key with the given name and default value.
    #[must_use]
    pub fn new(name: &str, default: T) -> Self {
        Self {
            name: interner::intern(name),
            default,
            _ty: PhantomData,
        }
    }

    /// The key's interned name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// The key's name as a string.
    #[inline]
    #[must_use]
    pub fn name_str(&self) -> &'static str {
        interner::resolve(self.name)
    }

    /// The declared default, returned by reads of a never-set key.
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.default
    }
}

impl<T: ParameterType> PartialEq for ParameterKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: ParameterType> Eq for ParameterKey<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_same_identity() {
        let a = ParameterKey::new("Material.HasNormalMap", false);
        let b = ParameterKey::new("Material.HasNormalMap", true);

        // Identity is the name; defaults are per-declaration
        assert_eq!(a, b);
        assert_eq!(a.name(), b.name());
        assert_eq!(a.name_str(), "Material.HasNormalMap");
    }

    #[test]
    fn test_distinct_names_differ() {
        let a = ParameterKey::new("Material.KeyA", 0u32);
        let b = ParameterKey::new("Material.KeyB", 0u32);
        assert_ne!(a, b);
    }
}
