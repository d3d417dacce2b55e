//! Parameter Value Union
//!
//! [`ParameterValue`] is the storage representation inside a
//! [`ParameterSet`](super::ParameterSet). The [`ParameterType`] trait maps
//! between Rust-side types and the stored union, so typed keys can be read
//! and written without callers touching the union directly.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

use crate::source::ShaderSource;
use crate::utils::interner::{self, Symbol};

/// A value stored in a parameter set.
///
/// `Float` participates in hashing via its bit pattern, so identical values
/// always produce identical cache keys. `Source` carries shader sources
/// (possibly [`ShaderSource::Array`] lists) that builders expand into
/// composition slots.
#[derive(Debug, Clone)]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Str(Symbol),
    Source(Box<ShaderSource>),
}

impl ParameterValue {
    /// Short kind label for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Int(_) => "int",
            ParameterValue::UInt(_) => "uint",
            ParameterValue::Float(_) => "float",
            ParameterValue::Str(_) => "str",
            ParameterValue::Source(_) => "source",
        }
    }

    /// Feeds a canonical, process-independent encoding into `h`.
    pub(crate) fn write_canonical(&self, h: &mut Xxh3) {
        use std::hash::Hasher as _;

        match self {
            ParameterValue::Bool(v) => {
                h.write_u8(1);
                h.write_u8(u8::from(*v));
            }
            ParameterValue::Int(v) => {
                h.write_u8(2);
                h.write_i32(*v);
            }
            ParameterValue::UInt(v) => {
                h.write_u8(3);
                h.write_u32(*v);
            }
            ParameterValue::Float(v) => {
                h.write_u8(4);
                h.write_u32(v.to_bits());
            }
            ParameterValue::Str(v) => {
                h.write_u8(5);
                h.write(interner::resolve(*v).as_bytes());
                h.write_u8(0);
            }
            ParameterValue::Source(v) => {
                h.write_u8(6);
                v.write_canonical(h);
            }
        }
    }
}

impl PartialEq for ParameterValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParameterValue::Bool(a), ParameterValue::Bool(b)) => a == b,
            (ParameterValue::Int(a), ParameterValue::Int(b)) => a == b,
            (ParameterValue::UInt(a), ParameterValue::UInt(b)) => a == b,
            // Bit comparison keeps Eq lawful and NaN-stable for cache keys
            (ParameterValue::Float(a), ParameterValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ParameterValue::Str(a), ParameterValue::Str(b)) => a == b,
            (ParameterValue::Source(a), ParameterValue::Source(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParameterValue {}

impl Hash for ParameterValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ParameterValue::Bool(v) => v.hash(state),
            ParameterValue::Int(v) => v.hash(state),
            ParameterValue::UInt(v) => v.hash(state),
            ParameterValue::Float(v) => v.to_bits().hash(state),
            ParameterValue::Str(v) => v.hash(state),
            ParameterValue::Source(v) => v.hash(state),
        }
    }
}

/// Conversion between Rust types and [`ParameterValue`].
///
/// Implemented for the scalar types, `String`, [`ShaderSource`], and
/// `Vec<ShaderSource>`. `from_value` returns `None` on a kind mismatch,
/// which callers treat as "fall back to the key default".
pub trait ParameterType: Clone {
    fn into_value(self) -> ParameterValue;
    fn from_value(value: &ParameterValue) -> Option<Self>;
}

impl ParameterType for bool {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Bool(self)
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParameterType for i32 {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Int(self)
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParameterType for u32 {
    fn into_value(self) -> ParameterValue {
        ParameterValue::UInt(self)
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::UInt(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParameterType for f32 {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Float(self)
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl ParameterType for String {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Str(interner::intern(&self))
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Str(v) => Some(interner::resolve(*v).to_string()),
            _ => None,
        }
    }
}

impl ParameterType for ShaderSource {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Source(Box::new(self))
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Source(v) => Some((**v).clone()),
            _ => None,
        }
    }
}

impl ParameterType for Vec<ShaderSource> {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Source(Box::new(ShaderSource::Array(self)))
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Source(v) => match &**v {
                ShaderSource::Array(sources) => Some(sources.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}
