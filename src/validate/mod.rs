// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Transition legality rules.
//!
//! Pure rule evaluation: no hardware access, no store mutation. Rules are
//! applied in a fixed order — value shape, hardware support, probe
//! availability, cross-property conflicts, numeric bounds — and the first
//! violation wins. Both legs of a joint (clearing) request are validated
//! against the same capability snapshot before either is written.

use tracing::debug;

use crate::error::Rejection;
use crate::properties::{
    CapabilitySet, Constraint, PptSet, Property, PropertyValue, Support, TransitionRequest,
    ValueShape,
};
use crate::store::PropertyStore;

pub struct TransitionValidator;

impl TransitionValidator {
    /// Decide whether a requested change is legal given hardware capability
    /// and the current values of interacting properties.
    pub fn validate(
        request: &TransitionRequest,
        caps: &CapabilitySet,
        store: &PropertyStore,
    ) -> Result<(), Rejection> {
        Self::check_shape(request.property, &request.value)?;
        Self::check_support(request.property, request.force, caps)?;
        Self::check_conflicts(request, store)?;
        Self::check_bounds(request.property, &request.value, caps)?;

        if let Some(cleared) = request.clear {
            // The side-effect leg always writes `false` to a toggle.
            if cleared.shape() != ValueShape::Bool {
                return Err(Rejection::TypeMismatch {
                    property: cleared,
                    expected: cleared.shape(),
                });
            }
            Self::check_support(cleared, request.force, caps)?;
        }

        debug!(property = %request.property, value = %request.value, "transition validated");
        Ok(())
    }

    /// Validate a grouped power-limit write: every touched limit must be
    /// supported and within its firmware-reported bounds.
    pub fn validate_ppt_set(set: &PptSet, caps: &CapabilitySet) -> Result<(), Rejection> {
        for (property, value) in set.entries() {
            Self::check_support(property, false, caps)?;
            Self::check_bounds(property, &value, caps)?;
        }
        Ok(())
    }

    /// Rule 1: the value must match the property's canonical shape, and GPU
    /// read-state sentinels are never legal write targets.
    fn check_shape(property: Property, value: &PropertyValue) -> Result<(), Rejection> {
        let mismatch = || Rejection::TypeMismatch {
            property,
            expected: property.shape(),
        };
        if value.shape() != property.shape() {
            return Err(mismatch());
        }
        if let PropertyValue::GpuMode(mode) = value {
            if !mode.is_selectable() {
                return Err(mismatch());
            }
        }
        Ok(())
    }

    /// Rules 2 and 3: hardware absence is final; a failed probe may be
    /// bypassed with the force flag (the write then proceeds speculatively).
    fn check_support(
        property: Property,
        force: bool,
        caps: &CapabilitySet,
    ) -> Result<(), Rejection> {
        match caps.support(property) {
            Support::Supported(_) => Ok(()),
            Support::NotSupported => Err(Rejection::Unsupported { property }),
            Support::Unavailable if force => {
                debug!(%property, "probe unavailable, forced speculative write");
                Ok(())
            }
            Support::Unavailable => Err(Rejection::ProbeUnavailable { property }),
        }
    }

    /// The properties whose current value rule 4 reads when validating a
    /// change to `property`. Callers must hold these for the whole
    /// transition, otherwise the partner can commit between validation and
    /// commit and leave the pair in a state rule 4 exists to forbid.
    pub fn interacting(property: Property) -> &'static [Property] {
        match property {
            Property::GpuMuxMode => &[Property::DgpuDisable],
            Property::DgpuDisable => &[Property::GpuMuxMode, Property::EgpuEnable],
            Property::EgpuEnable => &[Property::DgpuDisable],
            _ => &[],
        }
    }

    /// Rule 4: cross-property conflicts around the dGPU.
    fn check_conflicts(
        request: &TransitionRequest,
        store: &PropertyStore,
    ) -> Result<(), Rejection> {
        let dgpu_disabled = store
            .get(Property::DgpuDisable)
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let clears_dgpu = request.clear == Some(Property::DgpuDisable);

        match (request.property, &request.value) {
            // The discrete GPU cannot be the active mux target while disabled,
            // unless the same request atomically re-enables it.
            (Property::GpuMuxMode, PropertyValue::GpuMode(mode)) => {
                if mode.needs_dgpu() && dgpu_disabled && !clears_dgpu {
                    return Err(Rejection::ConflictingState {
                        property: Property::GpuMuxMode,
                        with: Property::DgpuDisable,
                        reason: "discrete GPU cannot drive the display while disabled".into(),
                    });
                }
            }
            // Cannot disable the GPU that currently drives the display.
            (Property::DgpuDisable, PropertyValue::Bool(true)) => {
                let mux_needs_dgpu = store
                    .get(Property::GpuMuxMode)
                    .value
                    .and_then(|v| v.as_gpu_mode())
                    .map(|m| m.needs_dgpu())
                    .unwrap_or(false);
                if mux_needs_dgpu {
                    return Err(Rejection::ConflictingState {
                        property: Property::DgpuDisable,
                        with: Property::GpuMuxMode,
                        reason: "mux currently routes the display through the dGPU".into(),
                    });
                }
            }
            // The eGPU path runs through the dGPU interface.
            (Property::EgpuEnable, PropertyValue::Bool(true)) => {
                if dgpu_disabled && !clears_dgpu {
                    return Err(Rejection::ConflictingState {
                        property: Property::EgpuEnable,
                        with: Property::DgpuDisable,
                        reason: "eGPU cannot be enabled while the dGPU is disabled".into(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Rule 5: numeric values must fall within the capability-reported
    /// bounds; enum values must be in the reported selectable set.
    fn check_bounds(
        property: Property,
        value: &PropertyValue,
        caps: &CapabilitySet,
    ) -> Result<(), Rejection> {
        let constraint = match caps.support(property).constraint() {
            Some(c) => c,
            // Forced write against an unavailable surface: nothing to check.
            None => return Ok(()),
        };
        match (constraint, value) {
            (Constraint::Range(range), PropertyValue::Uint(v)) => {
                if !range.contains(*v) {
                    return Err(Rejection::OutOfRange {
                        property,
                        value: *v,
                        min: range.min,
                        max: range.max,
                    });
                }
            }
            (Constraint::GpuModes(modes), PropertyValue::GpuMode(mode)) => {
                if !modes.contains(mode) {
                    return Err(Rejection::Unsupported { property });
                }
            }
            (Constraint::Policies(policies), PropertyValue::ThrottlePolicy(policy)) => {
                if !policies.contains(policy) {
                    return Err(Rejection::Unsupported { property });
                }
            }
            (Constraint::Toggle, PropertyValue::Bool(_)) => {}
            // Shape rule already ran; a constraint/value kind mismatch here
            // means the probe recorded a constraint of the wrong kind.
            _ => {
                return Err(Rejection::TypeMismatch {
                    property,
                    expected: property.shape(),
                })
            }
        }
        Ok(())
    }
}
