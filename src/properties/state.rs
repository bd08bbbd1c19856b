// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Property state snapshots and transition payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Property, PropertyValue};

/// Current state of one property.
///
/// Callers always receive clones of this snapshot, never references into the
/// live store. `revision` increases by exactly one per committed write and is
/// the token for optimistic concurrency. `stale` means the last write to this
/// property ended in a partial failure and the value cannot be trusted until
/// re-read from hardware.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyState {
    pub value: Option<PropertyValue>,
    pub revision: u64,
    pub last_written: Option<DateTime<Utc>>,
    pub stale: bool,
}

impl PropertyState {
    /// Seed state from a probed hardware value (revision 0, trusted).
    pub fn seeded(value: PropertyValue) -> Self {
        Self {
            value: Some(value),
            revision: 0,
            last_written: None,
            stale: false,
        }
    }
}

/// A requested change to one property.
///
/// Ephemeral; exists only for the duration of one `ControlCore` call. At most
/// one dependent clearing side-effect may ride along (`clear`), applied only
/// if both legs validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub property: Property,
    pub value: PropertyValue,
    #[serde(default)]
    pub force: bool,
    /// A boolean property to jointly set to `false`, e.g. clearing
    /// `DgpuDisable` while switching the mux to `Discrete`.
    #[serde(default)]
    pub clear: Option<Property>,
}

impl TransitionRequest {
    pub fn new(property: Property, value: PropertyValue) -> Self {
        Self {
            property,
            value,
            force: false,
            clear: None,
        }
    }

    /// Attempt the write even if the capability probe failed. Never
    /// overrides `NotSupported`.
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Jointly clear a conflicting boolean property in the same transition.
    pub fn with_clear(mut self, property: Property) -> Self {
        self.clear = Some(property);
        self
    }
}

/// A committed transition, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub property: Property,
    pub state: PropertyState,
    /// Present when the request carried a clearing side-effect that was
    /// committed in lockstep.
    pub cleared: Option<(Property, PropertyState)>,
}

/// Requested package-power-tracking limits, applied as one logical write.
///
/// Absent fields are left untouched. The write order is fixed: PL1, PL2,
/// FPPT, APU-SPPT, platform-SPPT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PptSet {
    pub pl1_spl: Option<u32>,
    pub pl2_sppt: Option<u32>,
    pub fppt: Option<u32>,
    pub apu_sppt: Option<u32>,
    pub platform_sppt: Option<u32>,
}

impl PptSet {
    /// The touched (property, value) pairs in fixed write order.
    pub fn entries(&self) -> Vec<(Property, PropertyValue)> {
        let fields = [
            (Property::PptPl1Spl, self.pl1_spl),
            (Property::PptPl2Sppt, self.pl2_sppt),
            (Property::PptFppt, self.fppt),
            (Property::PptApuSppt, self.apu_sppt),
            (Property::PptPlatformSppt, self.platform_sppt),
        ];
        fields
            .into_iter()
            .filter_map(|(p, v)| v.map(|v| (p, PropertyValue::Uint(v))))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Outcome attached to a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOutcome {
    /// The write committed and the state is trusted.
    Applied,
    /// The write failed cleanly; the prior state still holds.
    Failed { reason: String },
    /// A multi-step write failed and rollback was incomplete; the state is
    /// unknown until re-read.
    StateUnknown { reason: String },
}

/// One entry of the change-notification stream.
///
/// Emitted per successful or failed transition. Late subscribers receive only
/// future events, never history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub property: Property,
    pub state: PropertyState,
    pub outcome: ChangeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::GpuMode;

    #[test]
    fn test_seeded_state() {
        let state = PropertyState::seeded(PropertyValue::Uint(80));
        assert_eq!(state.revision, 0);
        assert!(!state.stale);
        assert_eq!(state.last_written, None);
    }

    #[test]
    fn test_request_builders() {
        let req = TransitionRequest::new(
            Property::GpuMuxMode,
            PropertyValue::GpuMode(GpuMode::Discrete),
        )
        .forced()
        .with_clear(Property::DgpuDisable);
        assert!(req.force);
        assert_eq!(req.clear, Some(Property::DgpuDisable));
    }

    #[test]
    fn test_ppt_set_fixed_order() {
        let set = PptSet {
            pl1_spl: Some(30),
            fppt: Some(55),
            platform_sppt: Some(80),
            ..Default::default()
        };
        let entries = set.entries();
        assert_eq!(
            entries.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            vec![
                Property::PptPl1Spl,
                Property::PptFppt,
                Property::PptPlatformSppt
            ]
        );
    }

    #[test]
    fn test_ppt_set_empty() {
        assert!(PptSet::default().is_empty());
    }

    #[test]
    fn test_request_wire_shape() {
        let req = TransitionRequest::new(Property::DgpuDisable, PropertyValue::Bool(true));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["property"], "DgpuDisable");
        assert_eq!(json["value"]["Bool"], true);
    }
}
