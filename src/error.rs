// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Error types for platformd
//!
//! This module defines all error types used throughout the control core.
//! The taxonomy follows the daemon contract: transient errors (`Probe`,
//! `Busy`, write timeouts) may be retried by the caller; rejections are
//! permanent and caller-fixable; `PartialFailure` leaves the affected
//! property states marked stale until re-read.

use thiserror::Error;

use crate::properties::{Property, ValueShape};

/// Main error type for platformd operations
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Hardware probe failed (transient, retry later)
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Request rejected by validation (permanent, caller-fixable)
    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    /// Another transition for the same property is in flight
    #[error("Busy: a transition for {property} is already in flight")]
    Busy { property: Property },

    /// Hardware write failed
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Compare-and-swap on the property store missed
    #[error("Stale revision for {property}: expected {expected}, found {actual}")]
    StaleRevision {
        property: Property,
        expected: u64,
        actual: u64,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Probe-specific error types
///
/// Distinct from "unsupported": a `ProbeError` means a control surface that
/// should be readable was not, and the probe may be retried. Hardware absence
/// is a stable fact recorded in the `CapabilitySet` instead.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A control surface exists but could not be read
    #[error("Control surface unreadable: {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A control surface returned a value that could not be parsed
    #[error("Control surface returned unparsable value: {path}: {raw:?}")]
    Unparsable { path: String, raw: String },

    /// Probe did not complete in time
    #[error("Probe timed out")]
    Timeout,
}

/// Validation rejection reasons
///
/// These are returned verbatim to callers; frontends are expected to render
/// the message as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The requested value does not match the property's canonical shape
    #[error("{property} expects a {expected} value")]
    TypeMismatch {
        property: Property,
        expected: ValueShape,
    },

    /// The hardware does not have this control surface
    #[error("{property} is not supported on this hardware")]
    Unsupported { property: Property },

    /// The probe could not read this control surface; retry or force
    #[error("{property} capability is unavailable (probe failed); re-probe or force")]
    ProbeUnavailable { property: Property },

    /// The request conflicts with the current value of another property
    #[error("{property} conflicts with {with}: {reason}")]
    ConflictingState {
        property: Property,
        with: Property,
        reason: String,
    },

    /// A numeric value falls outside the capability-reported bounds
    #[error("{property} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        property: Property,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Hardware write failure kinds
#[derive(Error, Debug)]
pub enum WriteError {
    /// The physical write failed
    #[error("Write to {property} failed: {source}")]
    Io {
        property: Property,
        #[source]
        source: std::io::Error,
    },

    /// The write did not complete in time
    #[error("Write to {property} timed out")]
    Timeout { property: Property },

    /// Pre-write read-back failed, so rollback would be impossible
    #[error("Cannot read current value of {property} before writing")]
    Unreadable { property: Property },

    /// A multi-step write failed partway and rollback did not fully succeed.
    /// Every property in `applied` plus `failed` must be treated as unknown
    /// until re-read.
    #[error("Partial failure: {failed} failed after {applied:?}; state unknown, re-read required")]
    PartialFailure {
        applied: Vec<Property>,
        failed: Property,
    },
}

impl WriteError {
    /// The property this write was targeting.
    pub fn property(&self) -> Property {
        match self {
            WriteError::Io { property, .. }
            | WriteError::Timeout { property }
            | WriteError::Unreadable { property }
            | WriteError::PartialFailure {
                failed: property, ..
            } => *property,
        }
    }
}

impl PlatformError {
    /// Whether the caller may reasonably retry the same request.
    ///
    /// Rejections are permanent until the caller changes the request or the
    /// interacting state; everything transient (probe failures, busy
    /// properties, write timeouts) is fair game for backoff-and-retry.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Probe(_) => true,
            PlatformError::Busy { .. } => true,
            PlatformError::Write(WriteError::Timeout { .. }) => true,
            PlatformError::Write(_) => false,
            PlatformError::Rejected(_) => false,
            PlatformError::StaleRevision { .. } => false,
            PlatformError::Io(_) => false,
            PlatformError::Json(_) => false,
            PlatformError::Config(_) => false,
        }
    }
}

/// Result type alias for platformd operations
pub type Result<T> = std::result::Result<T, PlatformError>;

impl From<toml::de::Error> for PlatformError {
    fn from(err: toml::de::Error) -> Self {
        PlatformError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PlatformError {
    fn from(err: toml::ser::Error) -> Self {
        PlatformError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_names_property() {
        let err = PlatformError::Busy {
            property: Property::GpuMuxMode,
        };
        assert!(err.to_string().contains("GpuMuxMode"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_out_of_range_names_bounds() {
        let err = Rejection::OutOfRange {
            property: Property::PptPl1Spl,
            value: 120,
            min: 5,
            max: 90,
        };
        let msg = err.to_string();
        assert!(msg.contains("PptPl1Spl"));
        assert!(msg.contains("120"));
        assert!(msg.contains("90"));
    }

    #[test]
    fn test_rejection_is_permanent() {
        let err = PlatformError::Rejected(Rejection::Unsupported {
            property: Property::MiniLedMode,
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn test_partial_failure_message() {
        let err = WriteError::PartialFailure {
            applied: vec![Property::PptPl1Spl, Property::PptPl2Sppt],
            failed: Property::PptFppt,
        };
        let msg = err.to_string();
        assert!(msg.contains("PptFppt"));
        assert!(msg.contains("re-read"));
        assert!(!PlatformError::from(err).is_transient());
    }

    #[test]
    fn test_write_timeout_is_transient() {
        let err = PlatformError::Write(WriteError::Timeout {
            property: Property::ChargeControlEndThreshold,
        });
        assert!(err.is_transient());
    }

    #[test]
    fn test_write_error_property() {
        let err = WriteError::Timeout {
            property: Property::PanelOd,
        };
        assert_eq!(err.property(), Property::PanelOd);
    }

    #[test]
    fn test_conflicting_state_renders_reason() {
        let err = Rejection::ConflictingState {
            property: Property::GpuMuxMode,
            with: Property::DgpuDisable,
            reason: "discrete GPU cannot drive the display while disabled".into(),
        };
        assert!(err.to_string().contains("DgpuDisable"));
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok() -> Result<u64> {
            Ok(7)
        }
        assert_eq!(ok().unwrap(), 7);
    }
}
