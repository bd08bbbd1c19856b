// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Owned store of current property states.
//!
//! The store is exclusively owned by `ControlCore`, which is its only writer.
//! Reads never fail and return clones; mutation is a compare-and-swap keyed
//! on the revision counter, so the core can never overwrite a state it did
//! not just validate against.

use std::collections::HashMap;

use chrono::Utc;

use crate::error::{PlatformError, Result};
use crate::properties::{Property, PropertyState, PropertyValue};

#[derive(Debug, Default)]
pub struct PropertyStore {
    states: HashMap<Property, PropertyState>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed initial states from probed hardware values. Used once at startup
    /// and after an explicit re-read.
    pub fn seed(&mut self, values: impl IntoIterator<Item = (Property, PropertyValue)>) {
        for (property, value) in values {
            self.states.insert(property, PropertyState::seeded(value));
        }
    }

    /// Last-known state of a property. Never fails; an unknown property
    /// yields the default (no value, revision 0).
    pub fn get(&self, property: Property) -> PropertyState {
        self.states.get(&property).cloned().unwrap_or_default()
    }

    /// Commit a new value if `expected_revision` still matches.
    ///
    /// On success the revision increments by exactly one, the commit
    /// timestamp is refreshed, and any stale mark is cleared.
    pub fn set(
        &mut self,
        property: Property,
        value: PropertyValue,
        expected_revision: u64,
    ) -> Result<PropertyState> {
        let entry = self.states.entry(property).or_default();
        if entry.revision != expected_revision {
            return Err(PlatformError::StaleRevision {
                property,
                expected: expected_revision,
                actual: entry.revision,
            });
        }
        entry.value = Some(value);
        entry.revision += 1;
        entry.last_written = Some(Utc::now());
        entry.stale = false;
        Ok(entry.clone())
    }

    /// Mark a property's state untrusted after a partial write failure.
    /// The revision still advances so optimistic readers notice the change.
    pub fn mark_stale(&mut self, property: Property) -> PropertyState {
        let entry = self.states.entry(property).or_default();
        entry.stale = true;
        entry.revision += 1;
        entry.clone()
    }

    /// Replace a property's state with a fresh hardware read, clearing any
    /// stale mark.
    pub fn reseed(&mut self, property: Property, value: PropertyValue) -> PropertyState {
        let entry = self.states.entry(property).or_default();
        entry.value = Some(value);
        entry.revision += 1;
        entry.last_written = None;
        entry.stale = false;
        entry.clone()
    }

    /// Snapshot of every known property state.
    pub fn snapshot(&self) -> HashMap<Property, PropertyState> {
        self.states.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_never_fails() {
        let store = PropertyStore::new();
        let state = store.get(Property::PanelOd);
        assert_eq!(state.revision, 0);
        assert_eq!(state.value, None);
    }

    #[test]
    fn test_set_increments_revision_by_one() {
        let mut store = PropertyStore::new();
        let s1 = store
            .set(Property::PanelOd, PropertyValue::Bool(true), 0)
            .unwrap();
        assert_eq!(s1.revision, 1);
        let s2 = store
            .set(Property::PanelOd, PropertyValue::Bool(false), 1)
            .unwrap();
        assert_eq!(s2.revision, 2);
        assert!(s2.last_written.is_some());
    }

    #[test]
    fn test_set_rejects_stale_revision() {
        let mut store = PropertyStore::new();
        store
            .set(Property::PanelOd, PropertyValue::Bool(true), 0)
            .unwrap();
        let err = store
            .set(Property::PanelOd, PropertyValue::Bool(false), 0)
            .unwrap_err();
        assert!(matches!(
            err,
            PlatformError::StaleRevision {
                expected: 0,
                actual: 1,
                ..
            }
        ));
        // Value unchanged by the failed CAS.
        assert_eq!(
            store.get(Property::PanelOd).value,
            Some(PropertyValue::Bool(true))
        );
    }

    #[test]
    fn test_mark_stale_and_reseed() {
        let mut store = PropertyStore::new();
        store
            .set(Property::PptFppt, PropertyValue::Uint(55), 0)
            .unwrap();
        let stale = store.mark_stale(Property::PptFppt);
        assert!(stale.stale);
        assert_eq!(stale.revision, 2);

        let fresh = store.reseed(Property::PptFppt, PropertyValue::Uint(60));
        assert!(!fresh.stale);
        assert_eq!(fresh.value, Some(PropertyValue::Uint(60)));
    }

    #[test]
    fn test_seed_is_trusted_revision_zero() {
        let mut store = PropertyStore::new();
        store.seed([(Property::DgpuDisable, PropertyValue::Bool(false))]);
        let state = store.get(Property::DgpuDisable);
        assert_eq!(state.revision, 0);
        assert!(!state.stale);
    }

    #[test]
    fn test_stale_set_clears_mark() {
        let mut store = PropertyStore::new();
        store
            .set(Property::PptFppt, PropertyValue::Uint(55), 0)
            .unwrap();
        let stale = store.mark_stale(Property::PptFppt);
        let committed = store
            .set(Property::PptFppt, PropertyValue::Uint(65), stale.revision)
            .unwrap();
        assert!(!committed.stale);
    }
}
