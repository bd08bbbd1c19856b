// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Capability detection against the Linux sysfs control surfaces.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::properties::{
    CapabilitySet, Constraint, CpuControl, CpuEpp, CpuGovernor, GpuMode, IntRange, Property,
    PropertyValue, Support, ThrottlePolicy,
};
use crate::sysfs;

use super::{HardwareProbe, ProbeReport};

/// Charge threshold bounds enforced by the charge controller.
const CHARGE_LIMIT_RANGE: IntRange = IntRange { min: 20, max: 100 };

/// Fallback bounds when a firmware attribute reports `-1` (unused) limits.
const FIRMWARE_ATTR_FALLBACK: IntRange = IntRange { min: 0, max: 255 };

pub struct SysfsProbe {
    root: PathBuf,
    timeout: Duration,
}

impl SysfsProbe {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    fn detect_blocking(root: &Path) -> ProbeReport {
        let mut report = ProbeReport::default();
        for property in Property::ALL {
            let (support, value) = probe_property(root, property);
            if let Some(value) = value {
                report.values.push((property, value));
            }
            report.caps.insert(property, support);
        }
        report.caps.cpu = probe_cpu(root);
        debug!(
            supported = report.caps.supported().len(),
            cpu = report.caps.cpu.present,
            "hardware probe complete"
        );
        report
    }
}

#[async_trait]
impl HardwareProbe for SysfsProbe {
    async fn detect(&self) -> Result<ProbeReport, ProbeError> {
        let root = self.root.clone();
        let task = tokio::task::spawn_blocking(move || Self::detect_blocking(&root));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(join)) => Err(ProbeError::Unreadable {
                path: "probe task".into(),
                source: std::io::Error::other(join),
            }),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

/// Probe one property's control surface.
fn probe_property(root: &Path, property: Property) -> (Support<Constraint>, Option<PropertyValue>) {
    let path = match sysfs::value_path(root, property) {
        Some(path) => path,
        // Battery charge surface absent on every candidate battery.
        None => return (Support::NotSupported, None),
    };
    if !path.exists() {
        return (Support::NotSupported, None);
    }

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%property, path = %path.display(), %err, "control surface unreadable");
            return (Support::Unavailable, None);
        }
    };
    let value = match sysfs::decode(property, &raw) {
        Some(value) => value,
        None => {
            warn!(%property, raw = raw.trim(), "control surface value unparsable");
            return (Support::Unavailable, None);
        }
    };

    (Support::Supported(constraint_for(root, property)), Some(value))
}

/// Build the legal-value constraint for a supported property.
fn constraint_for(root: &Path, property: Property) -> Constraint {
    match property {
        Property::ChargeControlEndThreshold => Constraint::Range(CHARGE_LIMIT_RANGE),
        Property::GpuMuxMode => {
            // The asus-wmi mux is a two-way switch; extended modes come from
            // a separate GPU supervisor and are admitted via its capability
            // report instead.
            Constraint::GpuModes(vec![GpuMode::Discrete, GpuMode::Optimus])
        }
        Property::ThrottlePolicy => Constraint::Policies(ThrottlePolicy::ALL.to_vec()),
        _ if property.is_ppt()
            || matches!(property, Property::NvDynamicBoost | Property::NvTempTarget) =>
        {
            Constraint::Range(firmware_range(root, property))
        }
        _ => Constraint::Toggle,
    }
}

/// Bounds of a firmware attribute, with fallback for `-1` (unused) markers.
fn firmware_range(root: &Path, property: Property) -> IntRange {
    let Some((min_path, max_path)) = sysfs::bound_paths(root, property) else {
        return FIRMWARE_ATTR_FALLBACK;
    };
    let min = read_bound(&min_path).unwrap_or(FIRMWARE_ATTR_FALLBACK.min);
    let max = read_bound(&max_path).unwrap_or(FIRMWARE_ATTR_FALLBACK.max);
    if min > max {
        return FIRMWARE_ATTR_FALLBACK;
    }
    IntRange { min, max }
}

fn read_bound(path: &Path) -> Option<u32> {
    let raw = fs::read_to_string(path).ok()?;
    let value: i64 = raw.trim().parse().ok()?;
    // `-1` means the firmware does not use this bound.
    u32::try_from(value).ok()
}

/// Probe the cpufreq policy0 surface for the EPP link.
fn probe_cpu(root: &Path) -> CpuControl {
    let governor_path = sysfs::cpufreq_path(root, "scaling_governor");
    if !governor_path.exists() {
        return CpuControl::default();
    }
    let governor = fs::read_to_string(&governor_path)
        .map(|raw| CpuGovernor::from_sysfs(&raw))
        .unwrap_or(CpuGovernor::BadValue);

    let available_epps = fs::read_to_string(sysfs::cpufreq_path(
        root,
        "energy_performance_available_preferences",
    ))
    .map(|raw| {
        raw.split_whitespace()
            .filter_map(CpuEpp::from_sysfs)
            .collect()
    })
    .unwrap_or_default();

    CpuControl {
        present: true,
        governor,
        available_epps,
    }
}
