// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Daemon configuration
//!
//! Loaded from TOML at startup; every field has a sensible default so a
//! missing file is not an error. The sysfs root exists so tests (and
//! containers) can point the core at a fake tree.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::properties::{CpuEpp, ThrottlePolicy};

/// Top-level configuration for the control core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Filesystem root the sysfs paths are resolved against.
    pub sysfs_root: PathBuf,
    /// Per-write timeout in milliseconds.
    pub write_timeout_ms: u64,
    /// Whole-probe timeout in milliseconds.
    pub probe_timeout_ms: u64,
    /// Retry behavior for transient write failures.
    pub resilience: ResilienceConfig,
    /// Throttle-policy to CPU EPP linkage.
    pub policy_epp: PolicyEppLink,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/"),
            write_timeout_ms: 2000,
            probe_timeout_ms: 5000,
            resilience: ResilienceConfig::default(),
            policy_epp: PolicyEppLink::default(),
        }
    }
}

impl PlatformConfig {
    /// System-wide config path, with a per-user fallback for unprivileged
    /// runs.
    pub fn default_path() -> PathBuf {
        let system = PathBuf::from("/etc/platformd/config.toml");
        if system.exists() {
            return system;
        }
        dirs::config_dir()
            .map(|dir| dir.join("platformd/config.toml"))
            .unwrap_or(system)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: PlatformConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Retry configuration for transient hardware write failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay in milliseconds (exponentially increased).
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter fraction (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 50,
            max_delay_ms: 500,
            jitter: 0.2,
        }
    }
}

/// Linkage between the platform throttle policy and the CPU
/// energy-performance preference.
///
/// When enabled and the cpufreq surface is present, committing a throttle
/// policy also applies the mapped EPP as one logical multi-step write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyEppLink {
    pub enabled: bool,
    pub quiet: CpuEpp,
    pub balanced: CpuEpp,
    pub performance: CpuEpp,
}

impl Default for PolicyEppLink {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet: CpuEpp::Power,
            balanced: CpuEpp::BalancePerformance,
            performance: CpuEpp::Performance,
        }
    }
}

impl PolicyEppLink {
    /// The EPP hint linked to a throttle policy.
    pub fn epp_for(&self, policy: ThrottlePolicy) -> CpuEpp {
        match policy {
            ThrottlePolicy::Quiet => self.quiet,
            ThrottlePolicy::Balanced => self.balanced,
            ThrottlePolicy::Performance => self.performance,
        }
    }
}
