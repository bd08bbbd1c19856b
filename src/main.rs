// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! platformd - platform control daemon.
//!
//! Boots the control core against the real sysfs surfaces and keeps it
//! running. IPC frontends attach out-of-process; this binary only owns the
//! core lifecycle.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use platformd::config::PlatformConfig;
use platformd::core::ControlCore;
use platformd::error::Result;

#[derive(Parser, Debug)]
#[command(name = "platformd", version, about = "Platform power/thermal/GPU control core")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probe hardware, print the capability report, and exit.
    #[arg(long)]
    probe_only: bool,

    /// Print the startup snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PlatformConfig::load_from(path)?,
        None => PlatformConfig::load()?,
    };

    let core = ControlCore::new(&config).await?;
    let caps = core.capabilities().await;

    if cli.json {
        let snapshot: Vec<_> = core
            .list_properties()
            .into_iter()
            .map(|p| (p, core.state(p)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for property in core.list_properties() {
            let state = core.state(property);
            match state.value {
                Some(value) => info!(%property, %value, "seeded"),
                None => info!(%property, supported = caps.support(property).is_supported(), "no value"),
            }
        }
    }

    if cli.probe_only {
        return Ok(());
    }

    info!("control core running; waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
