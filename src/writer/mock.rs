// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Mock hardware writer for testing
//!
//! Provides a configurable in-memory implementation of the `HardwareWriter`
//! trait so transition logic can be tested without touching sysfs. Failures
//! are scripted per property as a queue of per-call outcomes, which makes
//! rollback paths (including failing rollbacks) reproducible.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::WriteError;
use crate::properties::{CpuEpp, Property, PropertyValue};

use super::HardwareWriter;

#[derive(Clone, Default)]
pub struct MockWriter {
    /// Current surface values, updated by successful writes.
    values: Arc<Mutex<HashMap<Property, PropertyValue>>>,
    /// Per-property queue of "should this write call fail". Exhausted queues
    /// mean success.
    fail_plan: Arc<Mutex<HashMap<Property, VecDeque<bool>>>>,
    /// Every attempted write, in order, including rollback writes.
    writes: Arc<Mutex<Vec<(Property, PropertyValue)>>>,
    /// EPP hints applied through the linked policy write.
    epps: Arc<Mutex<Vec<CpuEpp>>>,
    /// Whether `apply_epp` fails.
    fail_epp: Arc<Mutex<bool>>,
    /// Artificial latency per write, for concurrency tests.
    write_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the current value of a surface (read() fails for unseeded ones).
    pub fn with_value(self, property: Property, value: PropertyValue) -> Self {
        self.values.lock().unwrap().insert(property, value);
        self
    }

    /// Script the outcomes of successive write calls to one property.
    pub fn with_fail_plan(self, property: Property, plan: &[bool]) -> Self {
        self.fail_plan
            .lock()
            .unwrap()
            .insert(property, plan.iter().copied().collect());
        self
    }

    /// Make `apply_epp` fail.
    pub fn with_epp_failure(self) -> Self {
        *self.fail_epp.lock().unwrap() = true;
        self
    }

    /// Delay every write, so a second request can observe Busy.
    pub fn with_write_delay(self, delay: Duration) -> Self {
        *self.write_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Every attempted write in call order, rollbacks included.
    pub fn writes(&self) -> Vec<(Property, PropertyValue)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// The current (mock) surface value.
    pub fn current(&self, property: Property) -> Option<PropertyValue> {
        self.values.lock().unwrap().get(&property).copied()
    }

    pub fn applied_epps(&self) -> Vec<CpuEpp> {
        self.epps.lock().unwrap().clone()
    }

    fn next_outcome(&self, property: Property) -> bool {
        self.fail_plan
            .lock()
            .unwrap()
            .get_mut(&property)
            .and_then(|plan| plan.pop_front())
            .unwrap_or(false)
    }
}

#[async_trait]
impl HardwareWriter for MockWriter {
    async fn write(&self, property: Property, value: &PropertyValue) -> Result<(), WriteError> {
        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.writes.lock().unwrap().push((property, *value));
        if self.next_outcome(property) {
            return Err(WriteError::Io {
                property,
                source: std::io::Error::other("scripted failure"),
            });
        }
        self.values.lock().unwrap().insert(property, *value);
        Ok(())
    }

    async fn read(&self, property: Property) -> Result<PropertyValue, WriteError> {
        self.values
            .lock()
            .unwrap()
            .get(&property)
            .copied()
            .ok_or(WriteError::Unreadable { property })
    }

    async fn apply_epp(&self, epp: CpuEpp) -> Result<(), WriteError> {
        if *self.fail_epp.lock().unwrap() {
            return Err(WriteError::Io {
                property: Property::ThrottlePolicy,
                source: std::io::Error::other("scripted EPP failure"),
            });
        }
        self.epps.lock().unwrap().push(epp);
        Ok(())
    }
}
