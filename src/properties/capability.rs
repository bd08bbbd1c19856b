// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Hardware capability model
//!
//! `Support` wraps the real per-property constraint so that fault states
//! (`NotSupported`, `Unavailable`) can never be confused with selectable
//! values. A `CapabilitySet` is created once at probe time and only replaced
//! wholesale by an explicit re-probe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CpuEpp, CpuGovernor, GpuMode, Property, ThrottlePolicy};

/// Support status for one property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support<T> {
    /// The control surface exists and reported its constraint.
    Supported(T),
    /// The hardware does not have this control surface. Stable fact; a force
    /// flag never overrides it.
    #[default]
    NotSupported,
    /// The control surface exists but the probe could not read it. Retry the
    /// probe, or force a speculative write.
    Unavailable,
}

impl<T> Support<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Support::Supported(_))
    }

    pub fn constraint(&self) -> Option<&T> {
        match self {
            Support::Supported(c) => Some(c),
            _ => None,
        }
    }
}

/// Inclusive numeric bounds reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The legal-value constraint for one supported property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// On/off toggle.
    Toggle,
    /// Bounded integer, limits reported by the firmware attribute.
    Range(IntRange),
    /// Selectable GPU routing modes. Never contains sentinels.
    GpuModes(Vec<GpuMode>),
    /// Selectable throttle policies.
    Policies(Vec<ThrottlePolicy>),
}

/// Probed CPU frequency-scaling control surface, used by the throttle-policy
/// EPP link. Not an addressable `Property`; exposed for state reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuControl {
    pub present: bool,
    pub governor: CpuGovernor,
    pub available_epps: Vec<CpuEpp>,
}

impl CpuControl {
    pub fn supports_epp(&self, epp: CpuEpp) -> bool {
        self.present && self.available_epps.contains(&epp)
    }
}

/// Per-device record of which properties are supported and with what
/// constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    attrs: BTreeMap<Property, Support<Constraint>>,
    pub cpu: CpuControl,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the probe outcome for one property.
    pub fn insert(&mut self, property: Property, support: Support<Constraint>) {
        self.attrs.insert(property, support);
    }

    /// Support status for a property. Unprobed properties are not supported.
    pub fn support(&self, property: Property) -> &Support<Constraint> {
        static NOT_SUPPORTED: Support<Constraint> = Support::NotSupported;
        self.attrs.get(&property).unwrap_or(&NOT_SUPPORTED)
    }

    /// All properties the hardware actually supports.
    pub fn supported(&self) -> Vec<Property> {
        Property::ALL
            .iter()
            .filter(|p| self.support(**p).is_supported())
            .copied()
            .collect()
    }

    /// The numeric bounds for a property, when it is a supported range.
    pub fn range(&self, property: Property) -> Option<IntRange> {
        match self.support(property).constraint() {
            Some(Constraint::Range(range)) => Some(*range),
            _ => None,
        }
    }

    /// The selectable GPU modes, when the mux is supported.
    pub fn gpu_modes(&self) -> Option<&[GpuMode]> {
        match self.support(Property::GpuMuxMode).constraint() {
            Some(Constraint::GpuModes(modes)) => Some(modes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(property: Property, support: Support<Constraint>) -> CapabilitySet {
        let mut caps = CapabilitySet::new();
        caps.insert(property, support);
        caps
    }

    #[test]
    fn test_unprobed_property_is_not_supported() {
        let caps = CapabilitySet::new();
        assert_eq!(
            caps.support(Property::MiniLedMode),
            &Support::NotSupported
        );
        assert!(caps.supported().is_empty());
    }

    #[test]
    fn test_range_lookup() {
        let caps = set_with(
            Property::PptPl1Spl,
            Support::Supported(Constraint::Range(IntRange::new(5, 90))),
        );
        let range = caps.range(Property::PptPl1Spl).unwrap();
        assert!(range.contains(5));
        assert!(range.contains(90));
        assert!(!range.contains(91));
        assert_eq!(caps.range(Property::PptFppt), None);
    }

    #[test]
    fn test_gpu_modes_never_expose_sentinels() {
        let caps = set_with(
            Property::GpuMuxMode,
            Support::Supported(Constraint::GpuModes(vec![
                GpuMode::Discrete,
                GpuMode::Optimus,
            ])),
        );
        let modes = caps.gpu_modes().unwrap();
        assert!(modes.iter().all(|m| m.is_selectable()));
    }

    #[test]
    fn test_unavailable_is_not_supported() {
        let caps = set_with(Property::PanelOd, Support::Unavailable);
        assert!(!caps.support(Property::PanelOd).is_supported());
        assert!(caps.supported().is_empty());
    }

    #[test]
    fn test_cpu_control_epp_support() {
        let cpu = CpuControl {
            present: true,
            governor: CpuGovernor::Powersave,
            available_epps: vec![CpuEpp::Default, CpuEpp::Performance],
        };
        assert!(cpu.supports_epp(CpuEpp::Performance));
        assert!(!cpu.supports_epp(CpuEpp::Power));
        assert!(!CpuControl::default().supports_epp(CpuEpp::Default));
    }
}
