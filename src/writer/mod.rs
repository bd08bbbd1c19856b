// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Hardware write sequencing.
//!
//! `HardwareWriter` performs the physical single-surface writes; the
//! sequencers in this module compose them into logical multi-step writes
//! with rollback. Rollback restores the pre-write values read back in this
//! same call; when rollback itself fails the result is `PartialFailure` and
//! every touched property must be treated as unknown until re-read.

pub mod mock;
pub mod sysfs;

pub use mock::MockWriter;
pub use sysfs::SysfsWriter;

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::ResilienceConfig;
use crate::error::WriteError;
use crate::properties::{CpuEpp, Property, PropertyValue};

/// Applies validated changes to the physical device.
///
/// Implementations own their timeouts: a write that does not complete in
/// time surfaces as `WriteError::Timeout`.
#[async_trait]
pub trait HardwareWriter: Send + Sync {
    /// Write one value to one control surface.
    async fn write(&self, property: Property, value: &PropertyValue) -> Result<(), WriteError>;

    /// Read the current value back from the control surface.
    async fn read(&self, property: Property) -> Result<PropertyValue, WriteError>;

    /// Apply a CPU energy-performance preference across cpufreq policies.
    /// Only invoked as part of a linked throttle-policy write.
    async fn apply_epp(&self, epp: CpuEpp) -> Result<(), WriteError>;
}

/// Apply a multi-entry logical write in the given fixed order.
///
/// Pre-write values are read back first so a failed later step can restore
/// earlier steps. A clean rollback reports the original error; an incomplete
/// rollback reports `PartialFailure` naming everything touched.
pub async fn write_group(
    writer: &dyn HardwareWriter,
    entries: &[(Property, PropertyValue)],
) -> Result<(), WriteError> {
    let mut applied: Vec<(Property, PropertyValue)> = Vec::with_capacity(entries.len());

    for (property, value) in entries {
        let prior = match writer.read(*property).await {
            Ok(prior) => prior,
            Err(_) => {
                return rollback(writer, &applied, WriteError::Unreadable {
                    property: *property,
                })
                .await
            }
        };
        if let Err(err) = writer.write(*property, value).await {
            return rollback(writer, &applied, err).await;
        }
        applied.push((*property, prior));
    }

    debug!(count = entries.len(), "group write committed");
    Ok(())
}

/// Commit a throttle policy together with its linked EPP hint as one logical
/// write. The policy file is written first; an EPP failure rolls it back.
pub async fn write_policy(
    writer: &dyn HardwareWriter,
    value: &PropertyValue,
    linked_epp: Option<CpuEpp>,
) -> Result<(), WriteError> {
    let property = Property::ThrottlePolicy;
    let prior = writer
        .read(property)
        .await
        .map_err(|_| WriteError::Unreadable { property })?;

    writer.write(property, value).await?;

    if let Some(epp) = linked_epp {
        if let Err(err) = writer.apply_epp(epp).await {
            warn!(%err, "linked EPP write failed, rolling back policy");
            return rollback(writer, &[(property, prior)], err).await;
        }
    }
    Ok(())
}

/// Roll back already-applied steps in reverse order, then report either the
/// original (clean) error or a partial failure.
async fn rollback(
    writer: &dyn HardwareWriter,
    applied: &[(Property, PropertyValue)],
    cause: WriteError,
) -> Result<(), WriteError> {
    let mut restored = true;
    for (property, prior) in applied.iter().rev() {
        if let Err(err) = writer.write(*property, prior).await {
            warn!(%property, %err, "rollback write failed");
            restored = false;
        }
    }
    if restored {
        Err(cause)
    } else {
        Err(WriteError::PartialFailure {
            applied: applied.iter().map(|(p, _)| *p).collect(),
            failed: cause.property(),
        })
    }
}

/// Retry schedule for transient failures of a single physical write.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

impl From<&ResilienceConfig> for RetryConfig {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff with jitter for a given attempt number.
    pub(crate) fn delay(&self, attempt: u32) -> Duration {
        let exponential_ms = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = exponential_ms.min(self.max_delay_ms);

        let jitter_range = (capped_ms as f64 * self.jitter) as i64;
        let jitter_ms = if jitter_range > 0 {
            rand::rng().random_range(-jitter_range..=jitter_range)
        } else {
            0
        };
        Duration::from_millis((capped_ms as i64 + jitter_ms).max(0) as u64)
    }
}

/// Whether a raw IO failure is worth retrying within the same write call.
pub(crate) fn io_is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{GpuMode, Property};

    fn uint(v: u32) -> PropertyValue {
        PropertyValue::Uint(v)
    }

    #[tokio::test]
    async fn test_group_write_fixed_order() {
        let writer = MockWriter::new()
            .with_value(Property::PptPl1Spl, uint(30))
            .with_value(Property::PptPl2Sppt, uint(40))
            .with_value(Property::PptFppt, uint(50));
        let entries = vec![
            (Property::PptPl1Spl, uint(35)),
            (Property::PptPl2Sppt, uint(45)),
            (Property::PptFppt, uint(55)),
        ];
        write_group(&writer, &entries).await.unwrap();
        assert_eq!(writer.writes(), entries);
    }

    #[tokio::test]
    async fn test_group_write_clean_rollback() {
        // FPPT fails once; rollback of the earlier steps succeeds, so the
        // caller gets the original error and may trust the prior state.
        let writer = MockWriter::new()
            .with_value(Property::PptPl1Spl, uint(30))
            .with_value(Property::PptPl2Sppt, uint(40))
            .with_value(Property::PptFppt, uint(50))
            .with_fail_plan(Property::PptFppt, &[true]);
        let entries = vec![
            (Property::PptPl1Spl, uint(35)),
            (Property::PptPl2Sppt, uint(45)),
            (Property::PptFppt, uint(55)),
        ];
        let err = write_group(&writer, &entries).await.unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));

        // Earlier steps were restored in reverse order.
        assert_eq!(
            writer.writes(),
            vec![
                (Property::PptPl1Spl, uint(35)),
                (Property::PptPl2Sppt, uint(45)),
                (Property::PptFppt, uint(55)),
                (Property::PptPl2Sppt, uint(40)),
                (Property::PptPl1Spl, uint(30)),
            ]
        );
    }

    #[tokio::test]
    async fn test_group_write_partial_failure() {
        // PL2 succeeds, FPPT fails, and the PL2 rollback write also fails:
        // the result must be PartialFailure naming everything touched.
        let writer = MockWriter::new()
            .with_value(Property::PptPl2Sppt, uint(40))
            .with_value(Property::PptFppt, uint(50))
            .with_fail_plan(Property::PptFppt, &[true])
            .with_fail_plan(Property::PptPl2Sppt, &[false, true]);
        let entries = vec![
            (Property::PptPl2Sppt, uint(45)),
            (Property::PptFppt, uint(55)),
        ];
        let err = write_group(&writer, &entries).await.unwrap_err();
        match err {
            WriteError::PartialFailure { applied, failed } => {
                assert_eq!(applied, vec![Property::PptPl2Sppt]);
                assert_eq!(failed, Property::PptFppt);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_policy_write_rolls_back_on_epp_failure() {
        let writer = MockWriter::new()
            .with_value(
                Property::ThrottlePolicy,
                PropertyValue::ThrottlePolicy(crate::properties::ThrottlePolicy::Balanced),
            )
            .with_epp_failure();
        let err = write_policy(
            &writer,
            &PropertyValue::ThrottlePolicy(crate::properties::ThrottlePolicy::Performance),
            Some(CpuEpp::Performance),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WriteError::Io { .. }));
        // Policy file restored.
        assert_eq!(
            writer.current(Property::ThrottlePolicy),
            Some(PropertyValue::ThrottlePolicy(
                crate::properties::ThrottlePolicy::Balanced
            ))
        );
    }

    #[tokio::test]
    async fn test_policy_write_without_link() {
        let writer = MockWriter::new().with_value(
            Property::ThrottlePolicy,
            PropertyValue::ThrottlePolicy(crate::properties::ThrottlePolicy::Quiet),
        );
        write_policy(
            &writer,
            &PropertyValue::ThrottlePolicy(crate::properties::ThrottlePolicy::Balanced),
            None,
        )
        .await
        .unwrap();
        assert!(writer.applied_epps().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_prior_aborts_before_writing() {
        let writer = MockWriter::new(); // no value seeded -> read fails
        let err = write_group(&writer, &[(Property::GpuMuxMode, PropertyValue::GpuMode(GpuMode::Optimus))])
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Unreadable { .. }));
        assert!(writer.writes().is_empty());
    }

    #[test]
    fn test_retry_delay_caps() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 200,
            jitter: 0.0,
        };
        assert_eq!(config.delay(0), Duration::from_millis(50));
        assert_eq!(config.delay(1), Duration::from_millis(100));
        assert_eq!(config.delay(10), Duration::from_millis(200));
    }

    #[test]
    fn test_io_transience() {
        assert!(io_is_transient(&std::io::Error::from(
            std::io::ErrorKind::Interrupted
        )));
        assert!(!io_is_transient(&std::io::Error::from(
            std::io::ErrorKind::PermissionDenied
        )));
    }
}
