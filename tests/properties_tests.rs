// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2026 Platformd Developers

//! Wire-format compatibility tests. The identifier strings here are consumed
//! by external clients and must never drift.

use platformd::config::PlatformConfig;
use platformd::properties::{
    CpuEpp, CpuGovernor, GpuMode, Property, PropertyValue, ThrottlePolicy, ValueShape,
};

#[test]
fn property_wire_identifiers_are_stable() {
    let expected = [
        (Property::ChargeControlEndThreshold, "ChargeControlEndThreshold"),
        (Property::DgpuDisable, "DgpuDisable"),
        (Property::GpuMuxMode, "GpuMuxMode"),
        (Property::PostAnimationSound, "PostAnimationSound"),
        (Property::PanelOd, "PanelOd"),
        (Property::MiniLedMode, "MiniLedMode"),
        (Property::EgpuEnable, "EgpuEnable"),
        (Property::ThrottlePolicy, "ThrottlePolicy"),
        (Property::PptPl1Spl, "PptPl1Spl"),
        (Property::PptPl2Sppt, "PptPl2Sppt"),
        (Property::PptFppt, "PptFppt"),
        (Property::PptApuSppt, "PptApuSppt"),
        (Property::PptPlatformSppt, "PptPlatformSppt"),
        (Property::NvDynamicBoost, "NvDynamicBoost"),
        (Property::NvTempTarget, "NvTempTarget"),
    ];
    assert_eq!(expected.len(), Property::ALL.len());
    for (property, name) in expected {
        assert_eq!(property.as_str(), name);
        assert_eq!(property.to_string(), name);
        assert_eq!(serde_json::to_string(&property).unwrap(), format!("\"{name}\""));
        assert_eq!(name.parse::<Property>().unwrap(), property);
    }
}

#[test]
fn gpu_mode_wire_identifiers_include_sentinels() {
    let expected = [
        (GpuMode::Discrete, "Discrete"),
        (GpuMode::Optimus, "Optimus"),
        (GpuMode::Integrated, "Integrated"),
        (GpuMode::Egpu, "Egpu"),
        (GpuMode::Vfio, "Vfio"),
        (GpuMode::Ultimate, "Ultimate"),
        (GpuMode::Error, "Error"),
        (GpuMode::NotSupported, "NotSupported"),
    ];
    for (mode, name) in expected {
        assert_eq!(mode.to_string(), name);
        assert_eq!(serde_json::to_string(&mode).unwrap(), format!("\"{name}\""));
        let parsed: GpuMode = serde_json::from_str(&format!("\"{name}\"")).unwrap();
        assert_eq!(parsed, mode);
    }
}

#[test]
fn throttle_policy_wire_identifiers_are_stable() {
    let expected = [
        (ThrottlePolicy::Balanced, "Balanced"),
        (ThrottlePolicy::Performance, "Performance"),
        (ThrottlePolicy::Quiet, "Quiet"),
    ];
    for (policy, name) in expected {
        assert_eq!(policy.to_string(), name);
        assert_eq!(serde_json::to_string(&policy).unwrap(), format!("\"{name}\""));
    }
}

#[test]
fn cpu_wire_identifiers_are_stable() {
    assert_eq!(
        serde_json::to_string(&CpuGovernor::Performance).unwrap(),
        "\"Performance\""
    );
    assert_eq!(
        serde_json::to_string(&CpuGovernor::Powersave).unwrap(),
        "\"Powersave\""
    );
    assert_eq!(
        serde_json::to_string(&CpuGovernor::BadValue).unwrap(),
        "\"BadValue\""
    );

    let epps = [
        (CpuEpp::Default, "Default", "default"),
        (CpuEpp::Performance, "Performance", "performance"),
        (
            CpuEpp::BalancePerformance,
            "BalancePerformance",
            "balance_performance",
        ),
        (CpuEpp::BalancePower, "BalancePower", "balance_power"),
        (CpuEpp::Power, "Power", "power"),
    ];
    for (epp, wire, sysfs) in epps {
        assert_eq!(serde_json::to_string(&epp).unwrap(), format!("\"{wire}\""));
        assert_eq!(epp.to_sysfs(), sysfs);
        assert_eq!(CpuEpp::from_sysfs(sysfs), Some(epp));
    }
}

#[test]
fn property_value_is_externally_tagged() {
    assert_eq!(
        serde_json::to_string(&PropertyValue::Bool(true)).unwrap(),
        r#"{"Bool":true}"#
    );
    assert_eq!(
        serde_json::to_string(&PropertyValue::Uint(80)).unwrap(),
        r#"{"Uint":80}"#
    );
    assert_eq!(
        serde_json::to_string(&PropertyValue::GpuMode(GpuMode::Discrete)).unwrap(),
        r#"{"GpuMode":"Discrete"}"#
    );
    assert_eq!(
        serde_json::to_string(&PropertyValue::ThrottlePolicy(ThrottlePolicy::Quiet)).unwrap(),
        r#"{"ThrottlePolicy":"Quiet"}"#
    );
}

#[test]
fn every_property_has_exactly_one_shape() {
    for property in Property::ALL {
        let shape = property.shape();
        match shape {
            ValueShape::Uint => assert!(
                property.is_ppt()
                    || matches!(
                        property,
                        Property::ChargeControlEndThreshold
                            | Property::NvDynamicBoost
                            | Property::NvTempTarget
                    )
            ),
            ValueShape::GpuMode => assert_eq!(property, Property::GpuMuxMode),
            ValueShape::ThrottlePolicy => assert_eq!(property, Property::ThrottlePolicy),
            ValueShape::Bool => assert!(!property.is_ppt()),
        }
    }
}

#[test]
fn config_round_trips_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = PlatformConfig::default();
    config.write_timeout_ms = 750;
    config.resilience.max_retries = 5;
    config.policy_epp.quiet = CpuEpp::BalancePower;
    config.save_to(&path).unwrap();

    let loaded = PlatformConfig::load_from(&path).unwrap();
    assert_eq!(loaded.write_timeout_ms, 750);
    assert_eq!(loaded.resilience.max_retries, 5);
    assert_eq!(loaded.policy_epp.quiet, CpuEpp::BalancePower);
    assert_eq!(loaded.probe_timeout_ms, config.probe_timeout_ms);
}
