// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Physical writes through the Linux sysfs control surfaces.
//!
//! Each write runs on the blocking pool under a timeout, with bounded
//! retry for transient kernel-side errors (EINTR/EAGAIN class). Values
//! arriving here have already passed validation; the encode step only
//! guards against programming errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::config::PlatformConfig;
use crate::error::WriteError;
use crate::properties::{CpuEpp, Property, PropertyValue};
use crate::sysfs;

use super::{io_is_transient, HardwareWriter, RetryConfig};

pub struct SysfsWriter {
    root: PathBuf,
    timeout: Duration,
    retry: RetryConfig,
}

impl SysfsWriter {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration, retry: RetryConfig) -> Self {
        Self {
            root: root.into(),
            timeout,
            retry,
        }
    }

    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::new(
            config.sysfs_root.clone(),
            Duration::from_millis(config.write_timeout_ms),
            RetryConfig::from(&config.resilience),
        )
    }

    fn surface_path(&self, property: Property) -> Result<PathBuf, WriteError> {
        sysfs::value_path(&self.root, property).ok_or(WriteError::Unreadable { property })
    }

    /// One physical write attempt on the blocking pool, under the timeout.
    async fn write_once(&self, property: Property, encoded: String) -> Result<(), WriteError> {
        let path = self.surface_path(property)?;
        let task = tokio::task::spawn_blocking(move || fs::write(&path, encoded.as_bytes()));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(source))) => Err(WriteError::Io { property, source }),
            Ok(Err(join)) => Err(WriteError::Io {
                property,
                source: std::io::Error::other(join),
            }),
            Err(_) => Err(WriteError::Timeout { property }),
        }
    }

    fn cpufreq_policies(&self) -> Vec<PathBuf> {
        let cpufreq = self.root.join("sys/devices/system/cpu/cpufreq");
        let Ok(entries) = fs::read_dir(&cpufreq) else {
            return Vec::new();
        };
        let mut policies: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("policy"))
                    .unwrap_or(false)
            })
            .collect();
        policies.sort();
        policies
    }
}

#[async_trait]
impl HardwareWriter for SysfsWriter {
    async fn write(&self, property: Property, value: &PropertyValue) -> Result<(), WriteError> {
        let encoded = sysfs::encode(property, value).ok_or(WriteError::Io {
            property,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "value shape does not match property",
            ),
        })?;

        let mut attempt = 0;
        loop {
            match self.write_once(property, encoded.clone()).await {
                Ok(()) => {
                    debug!(%property, value = %value, "hardware write committed");
                    return Ok(());
                }
                Err(WriteError::Io { source, .. })
                    if io_is_transient(&source) && attempt < self.retry.max_retries =>
                {
                    let delay = self.retry.delay(attempt);
                    trace!(%property, attempt, ?delay, "transient write failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(%property, %err, "hardware write failed");
                    return Err(err);
                }
            }
        }
    }

    async fn read(&self, property: Property) -> Result<PropertyValue, WriteError> {
        let path = self.surface_path(property)?;
        let task = tokio::task::spawn_blocking(move || fs::read_to_string(&path));
        let raw = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(raw))) => raw,
            Ok(Ok(Err(_))) | Ok(Err(_)) => return Err(WriteError::Unreadable { property }),
            Err(_) => return Err(WriteError::Timeout { property }),
        };
        sysfs::decode(property, &raw).ok_or(WriteError::Unreadable { property })
    }

    async fn apply_epp(&self, epp: CpuEpp) -> Result<(), WriteError> {
        let property = Property::ThrottlePolicy; // EPP rides on the policy transition
        let policies = self.cpufreq_policies();
        if policies.is_empty() {
            return Err(WriteError::Io {
                property,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no cpufreq policies present",
                ),
            });
        }
        let spelled = epp.to_sysfs();
        for policy in policies {
            let path = policy.join("energy_performance_preference");
            let task =
                tokio::task::spawn_blocking(move || fs::write(&path, spelled.as_bytes()));
            match tokio::time::timeout(self.timeout, task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(source))) => return Err(WriteError::Io { property, source }),
                Ok(Err(join)) => {
                    return Err(WriteError::Io {
                        property,
                        source: std::io::Error::other(join),
                    })
                }
                Err(_) => return Err(WriteError::Timeout { property }),
            }
        }
        debug!(epp = spelled, "energy-performance preference applied");
        Ok(())
    }
}
