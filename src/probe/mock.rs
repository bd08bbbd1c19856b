// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Mock hardware probe for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::properties::{CapabilitySet, Constraint, CpuControl, Property, PropertyValue, Support};

use super::{HardwareProbe, ProbeReport};

/// A probe returning a pre-built report.
#[derive(Default)]
pub struct MockProbe {
    report: Mutex<ProbeReport>,
    fail: AtomicBool,
}

impl MockProbe {
    pub fn new(report: ProbeReport) -> Self {
        Self {
            report: Mutex::new(report),
            fail: AtomicBool::new(false),
        }
    }

    /// Add one supported property with its constraint and current value.
    pub fn with_supported(
        self,
        property: Property,
        constraint: Constraint,
        value: PropertyValue,
    ) -> Self {
        {
            let mut report = self.report.lock().unwrap();
            report.caps.insert(property, Support::Supported(constraint));
            report.values.push((property, value));
        }
        self
    }

    /// Advertise a cpufreq control surface.
    pub fn with_cpu(self, cpu: CpuControl) -> Self {
        self.report.lock().unwrap().caps.cpu = cpu;
        self
    }

    /// Mark a property's control surface present but unreadable.
    pub fn with_unavailable(self, property: Property) -> Self {
        self.report
            .lock()
            .unwrap()
            .caps
            .insert(property, Support::Unavailable);
        self
    }

    /// Script the next `detect` calls to fail with a timeout.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Replace the report returned by future `detect` calls.
    pub fn set_report(&self, report: ProbeReport) {
        *self.report.lock().unwrap() = report;
    }
}

#[async_trait]
impl HardwareProbe for MockProbe {
    async fn detect(&self) -> Result<ProbeReport, ProbeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProbeError::Timeout);
        }
        Ok(self.report.lock().unwrap().clone())
    }
}
