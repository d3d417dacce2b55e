//! Compilation Parameters
//!
//! Typed key/value parameters driving compile-time decisions:
//!
//! - [`ParameterKey`]: immutable `(name, type, default)` descriptor; the
//!   interned name is the key's identity across the whole process
//! - [`ParameterValue`]: the value union stored in a set (flags, scalars,
//!   strings, and composition-array shader sources)
//! - [`ParameterSet`]: sorted symbol table with used-read tracking
//! - [`well_known`]: platform / profile / debug keys every compilation
//!   depends on
//!
//! # Used-parameter tracking
//!
//! Reading a key during composition marks it *used* even though the value
//! is unchanged — the used subset captures which inputs were actually on
//! the decision path, and is what the bytecode cache key is derived from.

pub mod key;
pub mod set;
pub mod value;
pub mod well_known;

pub use key::ParameterKey;
pub use set::ParameterSet;
pub use value::{ParameterType, ParameterValue};
pub use well_known::{GraphicsPlatform, GraphicsProfile};
