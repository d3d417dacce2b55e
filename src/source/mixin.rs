//! Composed Mixin Trees
//!
//! [`ShaderMixinSource`] is the named tree node produced by composition:
//! an ordered list of child fragments, named composition slots (single or
//! array valued), the macro table, and the used-parameter snapshot of the
//! subtree. Nodes are built bottom-up by mixin builders and never mutated
//! once composition completes.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use xxhash_rust::xxh3::Xxh3;

use crate::errors::{Result, WeftError};
use crate::params::ParameterSet;
use crate::source::ShaderClassSource;
use crate::source::macros::ShaderMacros;
use crate::utils::interner::{self, Symbol};

/// A named composition slot: one nested sub-tree, or an ordered list.
///
/// Pushing repeatedly into an array slot appends siblings in push order;
/// the order is structural and participates in hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositionSlot {
    Single(Box<ShaderMixinSource>),
    Array(Vec<ShaderMixinSource>),
}

impl CompositionSlot {
    fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        match self {
            CompositionSlot::Single(child) => {
                h.write_u8(1);
                child.write_canonical(h);
            }
            CompositionSlot::Array(children) => {
                h.write_u8(2);
                h.write_usize(children.len());
                for child in children {
                    child.write_canonical(h);
                }
            }
        }
    }
}

/// A node of the composed mixin tree.
///
/// Identity is the name plus structural content; the used-parameter
/// snapshot is bookkeeping and excluded from equality and hashing.
#[derive(Debug, Clone)]
pub struct ShaderMixinSource {
    name: Symbol,
    mixins: SmallVec<[ShaderClassSource; 4]>,
    /// Sorted by slot symbol; array elements keep push order.
    compositions: Vec<(Symbol, CompositionSlot)>,
    macros: ShaderMacros,
    used_parameters: ParameterSet,
}

impl ShaderMixinSource {
    /// Creates an empty node with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: interner::intern(name),
            ..Default::default()
        }
    }

    /// The node's interned name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// The node's name as a string. Empty for a default-constructed node.
    #[inline]
    #[must_use]
    pub fn name_str(&self) -> &'static str {
        interner::resolve(self.name)
    }

    // ── Child fragments ──────────────────────────────────────────────────────

    /// Appends a child fragment in mix order.
    pub fn add_mixin(&mut self, class: ShaderClassSource) {
        self.mixins.push(class);
    }

    /// The child fragments in mix order.
    #[inline]
    #[must_use]
    pub fn mixins(&self) -> &[ShaderClassSource] {
        &self.mixins
    }

    /// Whether a fragment with this class name was already mixed in.
    ///
    /// Builders use this to detect full-override fragments and short-circuit
    /// the remainder of their conditional sections.
    #[must_use]
    pub fn has_mixin(&self, class_name: &str) -> bool {
        interner::get(class_name)
            .is_some_and(|sym| self.mixins.iter().any(|m| m.class_name() == sym))
    }

    // ── Composition slots ────────────────────────────────────────────────────

    /// Attaches a single-valued composition slot.
    ///
    /// Replaces an existing single child of the same slot. Fails with
    /// [`WeftError::MalformedSlot`] if the slot already holds an array.
    pub fn set_composition(&mut self, slot: &str, child: ShaderMixinSource) -> Result<()> {
        let sym = interner::intern(slot);
        match self.compositions.binary_search_by_key(&sym, |&(k, _)| k) {
            Ok(idx) => match &mut self.compositions[idx].1 {
                CompositionSlot::Single(existing) => {
                    *existing = Box::new(child);
                    Ok(())
                }
                CompositionSlot::Array(_) => Err(WeftError::MalformedSlot {
                    slot: slot.to_string(),
                    reason: "slot already holds an array composition".to_string(),
                }),
            },
            Err(idx) => {
                self.compositions
                    .insert(idx, (sym, CompositionSlot::Single(Box::new(child))));
                Ok(())
            }
        }
    }

    /// Appends a child to an array-valued composition slot.
    ///
    /// Creates the array on first push. Fails with
    /// [`WeftError::MalformedSlot`] if the slot already holds a single child.
    pub fn push_composition(&mut self, slot: &str, child: ShaderMixinSource) -> Result<()> {
        let sym = interner::intern(slot);
        match self.compositions.binary_search_by_key(&sym, |&(k, _)| k) {
            Ok(idx) => match &mut self.compositions[idx].1 {
                CompositionSlot::Array(children) => {
                    children.push(child);
                    Ok(())
                }
                CompositionSlot::Single(_) => Err(WeftError::MalformedSlot {
                    slot: slot.to_string(),
                    reason: "slot already holds a single composition".to_string(),
                }),
            },
            Err(idx) => {
                self.compositions
                    .insert(idx, (sym, CompositionSlot::Array(vec![child])));
                Ok(())
            }
        }
    }

    /// Looks up a composition slot by name.
    #[must_use]
    pub fn composition(&self, slot: &str) -> Option<&CompositionSlot> {
        let sym = interner::get(slot)?;
        self.compositions
            .binary_search_by_key(&sym, |&(k, _)| k)
            .ok()
            .map(|idx| &self.compositions[idx].1)
    }

    /// Iterates `(slot, value)` pairs in slot-symbol order.
    pub fn compositions(&self) -> impl Iterator<Item = (&'static str, &CompositionSlot)> {
        self.compositions
            .iter()
            .map(|(sym, slot)| (interner::resolve(*sym), slot))
    }

    // ── Macros ───────────────────────────────────────────────────────────────

    /// Defines a preprocessor macro on this node.
    pub fn add_macro(&mut self, name: &str, value: &str) {
        self.macros.set(name, value);
    }

    /// The node's macro table.
    #[inline]
    #[must_use]
    pub fn macros(&self) -> &ShaderMacros {
        &self.macros
    }

    /// Merges another node's content into this one, keeping this node's
    /// name. Used when an explicit pre-built tree is supplied as a
    /// composition parameter.
    pub(crate) fn absorb(&mut self, other: &ShaderMixinSource) -> Result<()> {
        for mixin in other.mixins() {
            self.add_mixin(mixin.clone());
        }
        for (slot, value) in other.compositions() {
            match value {
                CompositionSlot::Single(child) => self.set_composition(slot, (**child).clone())?,
                CompositionSlot::Array(children) => {
                    for child in children {
                        self.push_composition(slot, child.clone())?;
                    }
                }
            }
        }
        self.macros.merge(&other.macros);
        Ok(())
    }

    // ── Used parameters ──────────────────────────────────────────────────────

    /// The parameter subset read while composing this subtree.
    #[inline]
    #[must_use]
    pub fn used_parameters(&self) -> &ParameterSet {
        &self.used_parameters
    }

    pub(crate) fn set_used_parameters(&mut self, used: ParameterSet) {
        self.used_parameters = used;
    }

    // ── Hashing / traversal ──────────────────────────────────────────────────

    /// Content hash over name and structural content (used parameters are
    /// excluded). Process-independent: resolved strings are hashed, not
    /// symbol ids.
    #[must_use]
    pub fn structural_hash(&self) -> u128 {
        let mut h = Xxh3::new();
        self.write_canonical(&mut h);
        h.digest128()
    }

    pub(crate) fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        h.write(self.name_str().as_bytes());
        h.write_u8(0);

        h.write_usize(self.mixins.len());
        for mixin in &self.mixins {
            mixin.write_canonical(h);
        }

        // Slot order is canonicalized by name so hash identity does not
        // depend on interning order.
        let mut slots: Vec<(&str, &CompositionSlot)> = self
            .compositions
            .iter()
            .map(|(sym, slot)| (interner::resolve(*sym), slot))
            .collect();
        slots.sort_unstable_by_key(|(name, _)| *name);

        h.write_usize(slots.len());
        for (name, slot) in slots {
            h.write(name.as_bytes());
            h.write_u8(0);
            slot.write_canonical(h);
        }

        self.macros.write_canonical(h);
    }

    /// Collects every fragment name this tree depends on: the class name of
    /// each mixed-in fragment plus each node name, recursively.
    pub fn collect_fragment_names(&self, out: &mut FxHashSet<Symbol>) {
        out.insert(self.name);
        for mixin in &self.mixins {
            out.insert(mixin.class_name());
        }
        for (_, slot) in &self.compositions {
            match slot {
                CompositionSlot::Single(child) => child.collect_fragment_names(out),
                CompositionSlot::Array(children) => {
                    for child in children {
                        child.collect_fragment_names(out);
                    }
                }
            }
        }
    }
}

impl Default for ShaderMixinSource {
    fn default() -> Self {
        Self {
            name: interner::intern(""),
            mixins: SmallVec::new(),
            compositions: Vec::new(),
            macros: ShaderMacros::default(),
            used_parameters: ParameterSet::default(),
        }
    }
}

impl PartialEq for ShaderMixinSource {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.mixins == other.mixins
            && self.compositions == other.compositions
            && self.macros == other.macros
    }
}

impl Eq for ShaderMixinSource {}

impl Hash for ShaderMixinSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.mixins.hash(state);
        self.compositions.hash(state);
        self.macros.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ShaderClassSource;

    #[test]
    fn test_array_slot_preserves_push_order() {
        let mut node = ShaderMixinSource::new("Lighting");
        node.push_composition("directGroups", ShaderMixinSource::new("LightDirectional"))
            .unwrap();
        node.push_composition("directGroups", ShaderMixinSource::new("LightPoint"))
            .unwrap();

        let Some(CompositionSlot::Array(children)) = node.composition("directGroups") else {
            panic!("expected array slot");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name_str(), "LightDirectional");
        assert_eq!(children[1].name_str(), "LightPoint");
    }

    #[test]
    fn test_single_and_array_modes_do_not_mix() {
        let mut node = ShaderMixinSource::new("Material");
        node.set_composition("surface", ShaderMixinSource::new("SurfaceDiffuse"))
            .unwrap();

        let err = node
            .push_composition("surface", ShaderMixinSource::new("SurfaceSpecular"))
            .unwrap_err();
        assert!(matches!(err, WeftError::MalformedSlot { .. }));
    }

    #[test]
    fn test_structural_hash_excludes_used_parameters() {
        use crate::params::ParameterKey;

        let mut a = ShaderMixinSource::new("Base");
        a.add_mixin(ShaderClassSource::new("TransformVS"));

        let mut b = a.clone();
        let mut used = ParameterSet::new();
        let _ = used.get(&ParameterKey::new("Test.Unrelated", false));
        b.set_used_parameters(used.used_parameters());

        assert_eq!(a.structural_hash(), b.structural_hash());
        assert_eq!(a, b);
    }

    #[test]
    fn test_structural_hash_sees_macros_and_children() {
        let mut a = ShaderMixinSource::new("Base");
        a.add_mixin(ShaderClassSource::new("TransformVS"));

        let mut b = a.clone();
        b.add_macro("MAX_BONES", "64");
        assert_ne!(a.structural_hash(), b.structural_hash());

        let mut c = a.clone();
        c.add_mixin(ShaderClassSource::new("SkinningVS"));
        assert_ne!(a.structural_hash(), c.structural_hash());
    }
}
