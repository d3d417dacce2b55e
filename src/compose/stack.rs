//! Composition Stack
//!
//! The push/pop protocol for composition slots. Each open slot is a frame
//! holding the sub-tree under construction; the root frame is always
//! present. The protocol is strictly LIFO: a pop must name the most
//! recently pushed slot, and a composition must finish with only the root
//! frame open. Violations are internal-consistency errors — they indicate
//! a builder bug, not bad input — and abort the compilation.
//!
//! State machine per nesting depth: [`SlotState::Idle`] (only the root
//! open) and [`SlotState::InSlot`] with the slot name and array mode.

use rustc_hash::FxHashSet;

use crate::errors::{Result, WeftError};
use crate::params::ParameterSet;
use crate::source::ShaderMixinSource;
use crate::utils::interner::{self, Symbol};

/// Observable state of the composition stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No composition slot is open; mixing targets the root node.
    Idle,
    /// The most recently opened slot.
    InSlot {
        /// Slot name on the parent node.
        slot: &'static str,
        /// Whether repeated pushes append siblings.
        array: bool,
    },
}

struct Frame {
    node: ShaderMixinSource,
    /// `(slot name, array mode)` binding this frame to its parent;
    /// `None` for the root frame.
    binding: Option<(Symbol, bool)>,
    /// Parameter keys read while this frame was open (children included
    /// after their pop merges into us).
    reads: FxHashSet<Symbol>,
}

/// LIFO stack of mixin tree nodes under construction.
pub struct CompositionStack {
    frames: Vec<Frame>,
}

impl CompositionStack {
    /// Creates a stack with the given root node open.
    #[must_use]
    pub fn new(root: ShaderMixinSource) -> Self {
        Self {
            frames: vec![Frame {
                node: root,
                binding: None,
                reads: FxHashSet::default(),
            }],
        }
    }

    /// The node mixing currently targets.
    #[must_use]
    pub fn current(&self) -> &ShaderMixinSource {
        &self.frames.last().expect("root frame always present").node
    }

    pub(crate) fn current_mut(&mut self) -> &mut ShaderMixinSource {
        &mut self.frames.last_mut().expect("root frame always present").node
    }

    /// Number of open composition slots (0 when only the root is open).
    #[must_use]
    pub fn open_slots(&self) -> usize {
        self.frames.len() - 1
    }

    /// The current protocol state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        match self.frames.last().and_then(|f| f.binding.as_ref()) {
            None => SlotState::Idle,
            Some((slot, array)) => SlotState::InSlot {
                slot: interner::resolve(*slot),
                array: *array,
            },
        }
    }

    /// Records a parameter read against the current frame.
    pub(crate) fn record_read(&mut self, name: Symbol) {
        self.frames
            .last_mut()
            .expect("root frame always present")
            .reads
            .insert(name);
    }

    /// Opens a composition slot on the current node and makes `child` the
    /// mixing target.
    pub fn push(&mut self, slot: &str, array: bool, child: ShaderMixinSource) {
        self.frames.push(Frame {
            node: child,
            binding: Some((interner::intern(slot), array)),
            reads: FxHashSet::default(),
        });
    }

    /// Closes the most recently opened slot and attaches its sub-tree to
    /// the parent node.
    ///
    /// `slot` must name the slot on top of the stack; anything else is a
    /// LIFO violation. The child's used-parameter snapshot is taken from
    /// `params` before attaching, restricted to the keys read while the
    /// frame was open.
    pub fn pop(&mut self, slot: &str, params: &ParameterSet) -> Result<()> {
        if self.frames.len() == 1 {
            return Err(WeftError::CompositionStackUnderflow);
        }

        let top = self.frames.last().expect("checked above");
        let (bound_slot, array) = top.binding.expect("non-root frame has a binding");
        let bound_name = interner::resolve(bound_slot);
        if bound_slot != interner::intern(slot) {
            return Err(WeftError::MismatchedComposition {
                expected: bound_name.to_string(),
                actual: slot.to_string(),
            });
        }

        let frame = self.frames.pop().expect("checked above");
        let mut child = frame.node;
        child.set_used_parameters(params.used_subset(&frame.reads));

        let parent = self.frames.last_mut().expect("root frame remains");
        parent.reads.extend(frame.reads.iter().copied());
        if array {
            parent.node.push_composition(bound_name, child)
        } else {
            parent.node.set_composition(bound_name, child)
        }
    }

    /// Consumes the stack and returns the finished root.
    ///
    /// Fails with [`WeftError::UnclosedComposition`] if any slot is still
    /// open. The root's used-parameter snapshot covers every key read
    /// during the whole composition.
    pub fn finish(mut self, params: &ParameterSet) -> Result<ShaderMixinSource> {
        if self.frames.len() != 1 {
            let open = self.open_slots();
            let mixin = self.frames[0].node.name_str().to_string();
            return Err(WeftError::UnclosedComposition { mixin, open });
        }

        let frame = self.frames.pop().expect("root frame present");
        let mut root = frame.node;
        root.set_used_parameters(params.used_parameters());
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> CompositionStack {
        CompositionStack::new(ShaderMixinSource::new("Root"))
    }

    #[test]
    fn test_nested_push_pop_returns_to_idle() {
        let params = ParameterSet::new();
        let mut s = stack();
        assert_eq!(s.state(), SlotState::Idle);

        s.push("outer", false, ShaderMixinSource::new("Outer"));
        s.push("inner", false, ShaderMixinSource::new("Inner"));
        assert_eq!(s.open_slots(), 2);

        s.pop("inner", &params).unwrap();
        s.pop("outer", &params).unwrap();
        assert_eq!(s.open_slots(), 0);
        assert_eq!(s.state(), SlotState::Idle);

        let root = s.finish(&params).unwrap();
        assert!(root.composition("outer").is_some());
    }

    #[test]
    fn test_out_of_order_pop_is_rejected() {
        let params = ParameterSet::new();
        let mut s = stack();
        s.push("outer", false, ShaderMixinSource::new("Outer"));
        s.push("inner", false, ShaderMixinSource::new("Inner"));

        let err = s.pop("outer", &params).unwrap_err();
        assert!(matches!(
            err,
            WeftError::MismatchedComposition { expected, actual }
                if expected == "inner" && actual == "outer"
        ));
    }

    #[test]
    fn test_pop_with_no_open_slot_underflows() {
        let params = ParameterSet::new();
        let mut s = stack();
        assert_eq!(
            s.pop("anything", &params).unwrap_err(),
            WeftError::CompositionStackUnderflow
        );
    }

    #[test]
    fn test_finish_with_open_slot_fails() {
        let params = ParameterSet::new();
        let mut s = stack();
        s.push("left_open", false, ShaderMixinSource::new("Child"));

        let err = s.finish(&params).unwrap_err();
        assert!(matches!(err, WeftError::UnclosedComposition { open: 1, .. }));
    }
}
