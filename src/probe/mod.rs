// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Hardware capability detection.
//!
//! The probe runs once at startup and on explicit refresh. It distinguishes
//! three outcomes per property: the control surface is present and readable
//! (`Supported` with its constraint), absent (`NotSupported`, a stable fact),
//! or present but unreadable (`Unavailable`, retry later or force). Only a
//! probe that cannot run at all yields a `ProbeError`.

pub mod mock;
pub mod sysfs;

pub use mock::MockProbe;
pub use sysfs::SysfsProbe;

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::properties::{CapabilitySet, Property, PropertyValue};

/// Everything one detection pass learned: the capability set plus the
/// current hardware values used to seed the property store.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub caps: CapabilitySet,
    pub values: Vec<(Property, PropertyValue)>,
}

/// Detects which hardware capabilities are present.
#[async_trait]
pub trait HardwareProbe: Send + Sync {
    async fn detect(&self) -> Result<ProbeReport, ProbeError>;
}
