// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! platformd - platform power, thermal, and GPU control core.
//!
//! This crate owns and arbitrates hardware power/thermal/GPU state on
//! laptop-class systems: CPU energy-performance preference, GPU mux and
//! dGPU/eGPU switching, thermal throttle policy, package power limits, and
//! the battery charge controller.
//!
//! Architecture highlights:
//! - `properties`: property identifiers, wire-compatible value enums,
//!   capability and state models
//! - `probe`: hardware capability detection from sysfs
//! - `store`: the owned, revision-counted property state store
//! - `validate`: transition legality rules (shape, support, conflicts,
//!   bounds)
//! - `writer`: physical write sequencing with retry and rollback
//! - `core`: the `ControlCore` orchestrator serving concurrent requests
//!
//! IPC frontends and UI layers live outside this crate; they consume the
//! `ControlCore` API and the change-notification stream.

pub mod config;
pub mod core;
pub mod error;
pub mod probe;
pub mod properties;
pub mod store;
pub mod sysfs;
pub mod validate;
pub mod writer;

pub use config::PlatformConfig;
pub use core::ControlCore;
pub use error::{PlatformError, ProbeError, Rejection, Result, WriteError};
