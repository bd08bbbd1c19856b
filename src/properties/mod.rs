// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Property identifiers and value types
//!
//! The serialized identifier strings in this module are a wire contract
//! shared with existing IPC callers and must not change: `Property` unit
//! variants and the value enums serialize to exactly their Rust names
//! (`ChargeControlEndThreshold`, `BalancePerformance`, ...).

pub mod capability;
pub mod state;

pub use capability::*;
pub use state::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CamelCase names of the controllable properties.
///
/// Declaration order is the fixed global order used when claiming more than
/// one property for a joint transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Property {
    ChargeControlEndThreshold,
    DgpuDisable,
    GpuMuxMode,
    PostAnimationSound,
    PanelOd,
    MiniLedMode,
    EgpuEnable,
    ThrottlePolicy,
    PptPl1Spl,
    PptPl2Sppt,
    PptFppt,
    PptApuSppt,
    PptPlatformSppt,
    NvDynamicBoost,
    NvTempTarget,
}

impl Property {
    /// All known properties, in declaration order.
    pub const ALL: [Property; 15] = [
        Property::ChargeControlEndThreshold,
        Property::DgpuDisable,
        Property::GpuMuxMode,
        Property::PostAnimationSound,
        Property::PanelOd,
        Property::MiniLedMode,
        Property::EgpuEnable,
        Property::ThrottlePolicy,
        Property::PptPl1Spl,
        Property::PptPl2Sppt,
        Property::PptFppt,
        Property::PptApuSppt,
        Property::PptPlatformSppt,
        Property::NvDynamicBoost,
        Property::NvTempTarget,
    ];

    /// The wire identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::ChargeControlEndThreshold => "ChargeControlEndThreshold",
            Property::DgpuDisable => "DgpuDisable",
            Property::GpuMuxMode => "GpuMuxMode",
            Property::PostAnimationSound => "PostAnimationSound",
            Property::PanelOd => "PanelOd",
            Property::MiniLedMode => "MiniLedMode",
            Property::EgpuEnable => "EgpuEnable",
            Property::ThrottlePolicy => "ThrottlePolicy",
            Property::PptPl1Spl => "PptPl1Spl",
            Property::PptPl2Sppt => "PptPl2Sppt",
            Property::PptFppt => "PptFppt",
            Property::PptApuSppt => "PptApuSppt",
            Property::PptPlatformSppt => "PptPlatformSppt",
            Property::NvDynamicBoost => "NvDynamicBoost",
            Property::NvTempTarget => "NvTempTarget",
        }
    }

    /// The canonical value shape for this property. Exactly one per property.
    pub fn shape(&self) -> ValueShape {
        match self {
            Property::ChargeControlEndThreshold
            | Property::PptPl1Spl
            | Property::PptPl2Sppt
            | Property::PptFppt
            | Property::PptApuSppt
            | Property::PptPlatformSppt
            | Property::NvDynamicBoost
            | Property::NvTempTarget => ValueShape::Uint,
            Property::DgpuDisable
            | Property::PostAnimationSound
            | Property::PanelOd
            | Property::MiniLedMode
            | Property::EgpuEnable => ValueShape::Bool,
            Property::GpuMuxMode => ValueShape::GpuMode,
            Property::ThrottlePolicy => ValueShape::ThrottlePolicy,
        }
    }

    /// Whether this is one of the five package-power-tracking limits.
    pub fn is_ppt(&self) -> bool {
        matches!(
            self,
            Property::PptPl1Spl
                | Property::PptPl2Sppt
                | Property::PptFppt
                | Property::PptApuSppt
                | Property::PptPlatformSppt
        )
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Property::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown property: {s}"))
    }
}

/// The canonical value shape of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueShape {
    Bool,
    Uint,
    GpuMode,
    ThrottlePolicy,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Bool => "boolean",
            ValueShape::Uint => "integer",
            ValueShape::GpuMode => "GpuMode",
            ValueShape::ThrottlePolicy => "ThrottlePolicy",
        };
        f.write_str(name)
    }
}

/// CPU frequency scaling governor as reported by cpufreq.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuGovernor {
    Performance,
    #[default]
    Powersave,
    /// The kernel reported a governor outside the known set.
    BadValue,
}

impl CpuGovernor {
    pub fn from_sysfs(raw: &str) -> Self {
        match raw.trim() {
            "performance" => CpuGovernor::Performance,
            "powersave" => CpuGovernor::Powersave,
            _ => CpuGovernor::BadValue,
        }
    }
}

/// CPU energy-performance preference hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuEpp {
    #[default]
    Default,
    Performance,
    BalancePerformance,
    BalancePower,
    Power,
}

impl CpuEpp {
    /// The cpufreq sysfs spelling.
    pub fn to_sysfs(self) -> &'static str {
        match self {
            CpuEpp::Default => "default",
            CpuEpp::Performance => "performance",
            CpuEpp::BalancePerformance => "balance_performance",
            CpuEpp::BalancePower => "balance_power",
            CpuEpp::Power => "power",
        }
    }

    pub fn from_sysfs(raw: &str) -> Option<Self> {
        match raw.trim() {
            "default" => Some(CpuEpp::Default),
            "performance" => Some(CpuEpp::Performance),
            "balance_performance" => Some(CpuEpp::BalancePerformance),
            "balance_power" => Some(CpuEpp::BalancePower),
            "power" => Some(CpuEpp::Power),
            _ => None,
        }
    }
}

/// GPU output routing mode.
///
/// `Error` and `NotSupported` exist only for wire compatibility with older
/// callers that receive read-state sentinels; they are never selectable write
/// targets. Capability and fault state live in [`capability::Support`]
/// instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuMode {
    Discrete,
    #[default]
    Optimus,
    Integrated,
    Egpu,
    Vfio,
    Ultimate,
    Error,
    NotSupported,
}

impl GpuMode {
    /// Whether this variant is a real operating mode rather than a read-state
    /// sentinel.
    pub fn is_selectable(self) -> bool {
        !matches!(self, GpuMode::Error | GpuMode::NotSupported)
    }

    /// Whether this mode routes the display through the discrete GPU.
    pub fn needs_dgpu(self) -> bool {
        matches!(self, GpuMode::Discrete | GpuMode::Ultimate)
    }

    /// Raw value of the asus-wmi `gpu_mux_mode` attribute. Only the two
    /// modes the binary mux can represent encode; `Ultimate` and the
    /// extended modes do not survive a read-back through this attribute and
    /// must be driven through their own surfaces.
    pub fn to_mux_raw(self) -> Option<u8> {
        match self {
            GpuMode::Discrete => Some(0),
            GpuMode::Optimus => Some(1),
            _ => None,
        }
    }

    pub fn from_mux_raw(raw: u8) -> Self {
        match raw {
            0 => GpuMode::Discrete,
            1 => GpuMode::Optimus,
            _ => GpuMode::Error,
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpuMode::Discrete => "Discrete",
            GpuMode::Optimus => "Optimus",
            GpuMode::Integrated => "Integrated",
            GpuMode::Egpu => "Egpu",
            GpuMode::Vfio => "Vfio",
            GpuMode::Ultimate => "Ultimate",
            GpuMode::Error => "Error",
            GpuMode::NotSupported => "NotSupported",
        };
        f.write_str(name)
    }
}

/// Thermal throttle policy (`throttle_thermal_policy` in asus-wmi).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrottlePolicy {
    #[default]
    Balanced,
    Performance,
    Quiet,
}

impl ThrottlePolicy {
    pub const ALL: [ThrottlePolicy; 3] = [
        ThrottlePolicy::Balanced,
        ThrottlePolicy::Performance,
        ThrottlePolicy::Quiet,
    ];

    /// Raw value of the asus-wmi attribute.
    pub fn to_raw(self) -> u8 {
        match self {
            ThrottlePolicy::Balanced => 0,
            ThrottlePolicy::Performance => 1,
            ThrottlePolicy::Quiet => 2,
        }
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(ThrottlePolicy::Balanced),
            1 => Some(ThrottlePolicy::Performance),
            2 => Some(ThrottlePolicy::Quiet),
            _ => None,
        }
    }
}

impl fmt::Display for ThrottlePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThrottlePolicy::Balanced => "Balanced",
            ThrottlePolicy::Performance => "Performance",
            ThrottlePolicy::Quiet => "Quiet",
        };
        f.write_str(name)
    }
}

/// A typed property value.
///
/// Externally tagged serde representation keeps the payload unambiguous on
/// the wire (`{"GpuMode":"Discrete"}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Uint(u32),
    GpuMode(GpuMode),
    ThrottlePolicy(ThrottlePolicy),
}

impl PropertyValue {
    pub fn shape(&self) -> ValueShape {
        match self {
            PropertyValue::Bool(_) => ValueShape::Bool,
            PropertyValue::Uint(_) => ValueShape::Uint,
            PropertyValue::GpuMode(_) => ValueShape::GpuMode,
            PropertyValue::ThrottlePolicy(_) => ValueShape::ThrottlePolicy,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            PropertyValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_gpu_mode(&self) -> Option<GpuMode> {
        match self {
            PropertyValue::GpuMode(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_throttle_policy(&self) -> Option<ThrottlePolicy> {
        match self {
            PropertyValue::ThrottlePolicy(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Uint(v) => write!(f, "{v}"),
            PropertyValue::GpuMode(m) => write!(f, "{m}"),
            PropertyValue::ThrottlePolicy(p) => write!(f, "{p}"),
        }
    }
}
