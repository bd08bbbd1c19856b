// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Map from properties to their Linux control surfaces.
//!
//! All paths are relative to a configurable filesystem root so tests can
//! point the probe and writer at a fake tree. The real daemon uses `/`.
//!
//! Surfaces:
//! - asus-wmi platform attributes (`dgpu_disable`, `gpu_mux_mode`, ...)
//! - asus-armoury firmware attributes (`ppt_*`, `nv_*`) with
//!   `current_value`/`min_value`/`max_value` files
//! - the battery charge controller (`charge_control_end_threshold`)
//! - cpufreq policy0 (governor and energy-performance preference)

use std::path::{Path, PathBuf};

use crate::properties::{GpuMode, Property, PropertyValue, ThrottlePolicy, ValueShape};

pub const PLATFORM_DIR: &str = "sys/devices/platform/asus-nb-wmi";
pub const FIRMWARE_ATTR_DIR: &str = "sys/class/firmware-attributes/asus-armoury/attributes";
pub const CPUFREQ_DIR: &str = "sys/devices/system/cpu/cpufreq/policy0";
pub const POWER_SUPPLY_DIR: &str = "sys/class/power_supply";

/// Battery names probed for the charge controller, in preference order.
pub const BATTERY_CANDIDATES: [&str; 4] = ["BAT0", "BAT1", "BATT", "BATC"];

/// The kind of control surface backing a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Single-file attribute under the asus-wmi platform device.
    Platform(&'static str),
    /// asus-armoury firmware attribute directory with value/bound files.
    FirmwareAttr(&'static str),
    /// Battery charge controller under power_supply.
    Battery,
}

impl Property {
    /// The control surface for this property.
    pub fn surface(&self) -> Surface {
        match self {
            Property::ChargeControlEndThreshold => Surface::Battery,
            Property::DgpuDisable => Surface::Platform("dgpu_disable"),
            Property::GpuMuxMode => Surface::Platform("gpu_mux_mode"),
            Property::PostAnimationSound => Surface::Platform("boot_sound"),
            Property::PanelOd => Surface::Platform("panel_od"),
            Property::MiniLedMode => Surface::Platform("mini_led_mode"),
            Property::EgpuEnable => Surface::Platform("egpu_enable"),
            Property::ThrottlePolicy => Surface::Platform("throttle_thermal_policy"),
            Property::PptPl1Spl => Surface::FirmwareAttr("ppt_pl1_spl"),
            Property::PptPl2Sppt => Surface::FirmwareAttr("ppt_pl2_sppt"),
            Property::PptFppt => Surface::FirmwareAttr("ppt_fppt"),
            Property::PptApuSppt => Surface::FirmwareAttr("ppt_apu_sppt"),
            Property::PptPlatformSppt => Surface::FirmwareAttr("ppt_platform_sppt"),
            Property::NvDynamicBoost => Surface::FirmwareAttr("nv_dynamic_boost"),
            Property::NvTempTarget => Surface::FirmwareAttr("nv_temp_target"),
        }
    }
}

/// Locate the battery directory carrying a charge-control surface.
pub fn resolve_battery(root: &Path) -> Option<PathBuf> {
    BATTERY_CANDIDATES.iter().find_map(|name| {
        let dir = root.join(POWER_SUPPLY_DIR).join(name);
        dir.join("charge_control_end_threshold")
            .exists()
            .then_some(dir)
    })
}

/// Path of the file holding the current value of a property.
pub fn value_path(root: &Path, property: Property) -> Option<PathBuf> {
    match property.surface() {
        Surface::Platform(attr) => Some(root.join(PLATFORM_DIR).join(attr)),
        Surface::FirmwareAttr(attr) => Some(
            root.join(FIRMWARE_ATTR_DIR)
                .join(attr)
                .join("current_value"),
        ),
        Surface::Battery => {
            resolve_battery(root).map(|dir| dir.join("charge_control_end_threshold"))
        }
    }
}

/// Paths of the firmware-reported bounds of a numeric firmware attribute.
pub fn bound_paths(root: &Path, property: Property) -> Option<(PathBuf, PathBuf)> {
    match property.surface() {
        Surface::FirmwareAttr(attr) => {
            let dir = root.join(FIRMWARE_ATTR_DIR).join(attr);
            Some((dir.join("min_value"), dir.join("max_value")))
        }
        _ => None,
    }
}

/// Path of a cpufreq policy0 attribute.
pub fn cpufreq_path(root: &Path, attr: &str) -> PathBuf {
    root.join(CPUFREQ_DIR).join(attr)
}

/// Encode a validated value into its sysfs spelling.
///
/// Returns `None` for combinations that never pass validation (wrong shape,
/// GPU sentinels), so the writer does not need its own shape checks.
pub fn encode(property: Property, value: &PropertyValue) -> Option<String> {
    match (property.shape(), value) {
        (ValueShape::Bool, PropertyValue::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
        (ValueShape::Uint, PropertyValue::Uint(v)) => Some(v.to_string()),
        (ValueShape::GpuMode, PropertyValue::GpuMode(mode)) => {
            mode.to_mux_raw().map(|raw| raw.to_string())
        }
        (ValueShape::ThrottlePolicy, PropertyValue::ThrottlePolicy(policy)) => {
            Some(policy.to_raw().to_string())
        }
        _ => None,
    }
}

/// Decode a raw sysfs string into a typed value.
pub fn decode(property: Property, raw: &str) -> Option<PropertyValue> {
    let raw = raw.trim();
    match property.shape() {
        ValueShape::Bool => match raw {
            "0" => Some(PropertyValue::Bool(false)),
            "1" => Some(PropertyValue::Bool(true)),
            _ => None,
        },
        ValueShape::Uint => raw.parse::<u32>().ok().map(PropertyValue::Uint),
        ValueShape::GpuMode => raw
            .parse::<u8>()
            .ok()
            .map(|v| PropertyValue::GpuMode(GpuMode::from_mux_raw(v))),
        ValueShape::ThrottlePolicy => raw
            .parse::<u8>()
            .ok()
            .and_then(ThrottlePolicy::from_raw)
            .map(PropertyValue::ThrottlePolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_property_has_a_surface() {
        for property in Property::ALL {
            // surface() is total; value_path only depends on battery presence.
            let _ = property.surface();
        }
    }

    #[test]
    fn test_platform_value_path() {
        let path = value_path(Path::new("/"), Property::DgpuDisable).unwrap();
        assert_eq!(
            path,
            Path::new("/sys/devices/platform/asus-nb-wmi/dgpu_disable")
        );
    }

    #[test]
    fn test_firmware_attr_paths() {
        let root = Path::new("/");
        let value = value_path(root, Property::PptFppt).unwrap();
        assert!(value.ends_with("ppt_fppt/current_value"));
        let (min, max) = bound_paths(root, Property::NvTempTarget).unwrap();
        assert!(min.ends_with("nv_temp_target/min_value"));
        assert!(max.ends_with("nv_temp_target/max_value"));
        assert_eq!(bound_paths(root, Property::PanelOd), None);
    }

    #[test]
    fn test_encode_rejects_wrong_shape() {
        assert_eq!(encode(Property::DgpuDisable, &PropertyValue::Uint(1)), None);
        assert_eq!(
            encode(Property::GpuMuxMode, &PropertyValue::GpuMode(GpuMode::Error)),
            None
        );
        // Ultimate has no faithful binary-mux spelling; writing raw 0 would
        // read back as Discrete.
        assert_eq!(
            encode(
                Property::GpuMuxMode,
                &PropertyValue::GpuMode(GpuMode::Ultimate)
            ),
            None
        );
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let cases = [
            (Property::DgpuDisable, PropertyValue::Bool(true)),
            (Property::ChargeControlEndThreshold, PropertyValue::Uint(80)),
            (
                Property::GpuMuxMode,
                PropertyValue::GpuMode(GpuMode::Optimus),
            ),
            (
                Property::ThrottlePolicy,
                PropertyValue::ThrottlePolicy(ThrottlePolicy::Quiet),
            ),
        ];
        for (property, value) in cases {
            let raw = encode(property, &value).unwrap();
            assert_eq!(decode(property, &raw), Some(value));
        }
    }

    #[test]
    fn test_decode_garbage() {
        assert_eq!(decode(Property::PanelOd, "2"), None);
        assert_eq!(decode(Property::PptPl1Spl, "watts"), None);
        assert_eq!(decode(Property::ThrottlePolicy, "9"), None);
    }
}
