//! Well-Known Compilation Keys
//!
//! The platform / profile / debug parameters every compilation depends on.
//! The effect compiler injects these into the used-parameter set of every
//! composed tree unconditionally — they always affect code generation even
//! when no builder reads them explicitly.

use std::fmt;
use std::sync::LazyLock;

use crate::params::key::ParameterKey;
use crate::params::value::{ParameterType, ParameterValue};
use crate::utils::interner;

/// Target graphics API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsPlatform {
    #[default]
    Vulkan,
    Direct3D12,
    Metal,
    OpenGl,
}

impl GraphicsPlatform {
    /// Stable identifier used in parameter values and log output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GraphicsPlatform::Vulkan => "vulkan",
            GraphicsPlatform::Direct3D12 => "d3d12",
            GraphicsPlatform::Metal => "metal",
            GraphicsPlatform::OpenGl => "opengl",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "vulkan" => Some(GraphicsPlatform::Vulkan),
            "d3d12" => Some(GraphicsPlatform::Direct3D12),
            "metal" => Some(GraphicsPlatform::Metal),
            "opengl" => Some(GraphicsPlatform::OpenGl),
            _ => None,
        }
    }
}

impl fmt::Display for GraphicsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParameterType for GraphicsPlatform {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Str(interner::intern(self.as_str()))
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Str(sym) => Self::parse(interner::resolve(*sym)),
            _ => None,
        }
    }
}

/// Target feature level within a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GraphicsProfile {
    Level10_0,
    #[default]
    Level11_0,
    Level12_0,
}

impl GraphicsProfile {
    /// Stable identifier used in parameter values and log output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GraphicsProfile::Level10_0 => "level_10_0",
            GraphicsProfile::Level11_0 => "level_11_0",
            GraphicsProfile::Level12_0 => "level_12_0",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "level_10_0" => Some(GraphicsProfile::Level10_0),
            "level_11_0" => Some(GraphicsProfile::Level11_0),
            "level_12_0" => Some(GraphicsProfile::Level12_0),
            _ => None,
        }
    }
}

impl fmt::Display for GraphicsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParameterType for GraphicsProfile {
    fn into_value(self) -> ParameterValue {
        ParameterValue::Str(interner::intern(self.as_str()))
    }

    fn from_value(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Str(sym) => Self::parse(interner::resolve(*sym)),
            _ => None,
        }
    }
}

/// Target platform for the compiled bytecode.
pub static PLATFORM: LazyLock<ParameterKey<GraphicsPlatform>> =
    LazyLock::new(|| ParameterKey::new("Effect.GraphicsPlatform", GraphicsPlatform::default()));

/// Target feature profile for the compiled bytecode.
pub static PROFILE: LazyLock<ParameterKey<GraphicsProfile>> =
    LazyLock::new(|| ParameterKey::new("Effect.GraphicsProfile", GraphicsProfile::default()));

/// Whether the backend should emit debug-friendly bytecode.
pub static DEBUG: LazyLock<ParameterKey<bool>> =
    LazyLock::new(|| ParameterKey::new("Effect.CompileDebug", false));
