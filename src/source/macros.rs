//! Preprocessor Macro Table
//!
//! Macro definitions injected by builders into a mixin tree node.
//!
//! Internally uses an ordered `Vec<(Symbol, Symbol)>`, ensuring that
//! identical macro sets produce identical hash values regardless of the
//! order builders inserted them in.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

use crate::utils::interner::{self, Symbol};

/// A collection of preprocessor macro definitions.
///
/// # Performance
///
/// - Insertion/lookup: O(log n) via binary search
/// - Comparison and hashing: integer symbol pairs only
#[derive(Debug, Clone, Default)]
pub struct ShaderMacros {
    defines: Vec<(Symbol, Symbol)>,
}

impl ShaderMacros {
    /// Creates an empty macro table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a macro (maintains sorted order).
    ///
    /// If the name exists, updates its value; otherwise inserts.
    pub fn set(&mut self, name: &str, value: &str) {
        let name_sym = interner::intern(name);
        let value_sym = interner::intern(value);
        self.set_symbol(name_sym, value_sym);
    }

    /// Sets a macro using pre-interned symbols.
    #[inline]
    pub fn set_symbol(&mut self, name: Symbol, value: Symbol) {
        match self.defines.binary_search_by_key(&name, |&(k, _)| k) {
            Ok(idx) => self.defines[idx].1 = value,
            Err(idx) => self.defines.insert(idx, (name, value)),
        }
    }

    /// Whether a macro is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        interner::get(name)
            .is_some_and(|sym| self.defines.binary_search_by_key(&sym, |&(k, _)| k).is_ok())
    }

    /// Gets a macro value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static str> {
        let sym = interner::get(name)?;
        self.defines
            .binary_search_by_key(&sym, |&(k, _)| k)
            .ok()
            .map(|idx| interner::resolve(self.defines[idx].1))
    }

    /// Merges macros from another table; `other` wins on conflicts.
    pub fn merge(&mut self, other: &ShaderMacros) {
        for &(name, value) in &other.defines {
            self.set_symbol(name, value);
        }
    }

    /// Iterates all `(name, value)` pairs as symbols.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &(Symbol, Symbol)> {
        self.defines.iter()
    }

    /// Iterates all `(name, value)` pairs as strings.
    #[inline]
    pub fn iter_strings(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.defines
            .iter()
            .map(|&(k, v)| (interner::resolve(k), interner::resolve(v)))
    }

    /// Number of macros.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Whether the table is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Feeds a canonical, process-independent encoding into `h`.
    ///
    /// Resolved strings are hashed rather than symbol ids, so the digest
    /// does not depend on interning order.
    pub(crate) fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        h.write_usize(self.defines.len());
        for (name, value) in self.iter_strings() {
            h.write(name.as_bytes());
            h.write_u8(b'=');
            h.write(value.as_bytes());
            h.write_u8(0);
        }
    }
}

impl Hash for ShaderMacros {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.defines.hash(state);
    }
}

impl PartialEq for ShaderMacros {
    fn eq(&self, other: &Self) -> bool {
        self.defines == other.defines
    }
}

impl Eq for ShaderMacros {}

impl From<&[(&str, &str)]> for ShaderMacros {
    fn from(defines: &[(&str, &str)]) -> Self {
        let mut result = Self::new();
        for (k, v) in defines {
            result.set(k, v);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut macros = ShaderMacros::new();
        macros.set("MAX_LIGHTS", "8");
        macros.set("HAS_SKINNING", "1");

        assert!(macros.contains("MAX_LIGHTS"));
        assert_eq!(macros.get("MAX_LIGHTS"), Some("8"));
        assert_eq!(macros.get("NOT_DEFINED"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut macros = ShaderMacros::new();
        macros.set("MAX_BONES", "32");
        macros.set("MAX_BONES", "64");

        assert_eq!(macros.len(), 1);
        assert_eq!(macros.get("MAX_BONES"), Some("64"));
    }

    #[test]
    fn test_canonical_hash_ignores_insertion_order() {
        let mut m1 = ShaderMacros::new();
        m1.set("A", "1");
        m1.set("B", "2");

        let mut m2 = ShaderMacros::new();
        m2.set("B", "2");
        m2.set("A", "1");

        let mut h1 = Xxh3::new();
        let mut h2 = Xxh3::new();
        m1.write_canonical(&mut h1);
        m2.write_canonical(&mut h2);
        assert_eq!(h1.digest128(), h2.digest128());
    }

    #[test]
    fn test_merge_other_wins() {
        let mut m1 = ShaderMacros::from(&[("A", "1"), ("B", "2")][..]);
        let m2 = ShaderMacros::from(&[("B", "3"), ("C", "4")][..]);

        m1.merge(&m2);

        assert_eq!(m1.get("A"), Some("1"));
        assert_eq!(m1.get("B"), Some("3"));
        assert_eq!(m1.get("C"), Some("4"));
    }
}
