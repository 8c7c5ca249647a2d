//! Tests for configuration validation

use contention::config::{
    CatalogConfig, CatalogEntry, DriverConfig, JobEntry, MachineConfig, SimulationConfig,
    UsageSource,
};
use contention::core::{builtin, Index, ResourceUsageSpec};

#[test]
fn test_machine_config_validation() {
    assert!(MachineConfig::default().validate().is_ok());
}

#[test]
fn test_machine_config_invalid_cores() {
    let invalid = MachineConfig::default().with_cpu_cores(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_machine_config_invalid_speed() {
    assert!(MachineConfig::default().with_cpu_speed(0.0).validate().is_err());
    assert!(MachineConfig::default()
        .with_cpu_speed(f64::INFINITY)
        .validate()
        .is_err());
}

#[test]
fn test_machine_config_allows_zero_bus_speed() {
    let cfg = MachineConfig::default()
        .with_memory_speed(0.0)
        .with_disk_speed(0.0);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_machine_config_rejects_negative_capacity() {
    let cfg = MachineConfig::default().with_memory_capacity(-1.0);
    assert!(cfg.validate().unwrap_err().contains("memory_capacity"));
}

#[test]
fn test_machine_config_from_json_fills_defaults() {
    let cfg = MachineConfig::from_json_str(r#"{ "cpu_cores": 4 }"#).unwrap();
    assert_eq!(cfg.cpu_cores, 4);
    assert!((cfg.cpu_speed - 8.0).abs() < f64::EPSILON);
}

#[test]
fn test_driver_config_validation() {
    assert!(DriverConfig::default().validate().is_ok());
    let invalid = DriverConfig {
        tick_millis: 0,
        time_scale: 1.0,
    };
    assert!(invalid.validate().is_err());
    let invalid = DriverConfig {
        tick_millis: 10,
        time_scale: -2.0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_simulation_config_from_json() {
    let json = r#"{
        "machine": { "cpu_speed": 16.0, "cpu_cores": 2 },
        "catalog": {
            "entries": [
                { "kind": "job", "index": 7000, "name": "Scan Sectors",
                  "usage": { "inline": { "cycles_required": 120.0, "disk_ratio": 0.5, "disk_required": 4 } } },
                { "kind": "objective", "index": 7001, "name": "Disk Mapped", "jobs": [7000] }
            ]
        },
        "driver": { "tick_millis": 50, "time_scale": 4.0 }
    }"#;

    let config = SimulationConfig::from_json_str(json).unwrap();
    assert_eq!(config.machine.cpu_cores, 2);
    assert_eq!(config.catalog.entries.len(), 2);
    assert_eq!(config.driver.tick_millis, 50);
}

#[test]
fn test_simulation_config_reports_section() {
    let json = r#"{ "machine": { "cpu_cores": 0 } }"#;
    let err = SimulationConfig::from_json_str(json).unwrap_err();
    assert!(err.starts_with("machine invalid"), "{err}");
}

#[test]
fn test_simulation_config_parse_error() {
    let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"), "{err}");
}

#[test]
fn test_catalog_rejects_invalid_inline_usage() {
    let catalog = CatalogConfig::new().with_entry(CatalogEntry::Job(JobEntry {
        index: None,
        name: "Broken".into(),
        usage: UsageSource::Inline(ResourceUsageSpec::cpu_only(0.0)),
        required_objectives: Vec::new(),
        repeat: None,
    }));
    assert!(catalog.validate().unwrap_err().contains("cycles_required"));
}

#[test]
fn test_catalog_rejects_empty_name() {
    let catalog = CatalogConfig::new().with_entry(CatalogEntry::Job(JobEntry {
        index: Some(Index(7000)),
        name: "  ".into(),
        usage: UsageSource::default(),
        required_objectives: Vec::new(),
        repeat: None,
    }));
    assert!(catalog.validate().is_err());
}

#[test]
fn test_boot_sequence_uses_builtin_indices() {
    let catalog = CatalogConfig::boot_sequence();
    let indices: Vec<Option<Index>> = catalog
        .entries
        .iter()
        .map(|entry| match entry {
            CatalogEntry::Job(job) => job.index,
            CatalogEntry::Objective(objective) => objective.index,
            CatalogEntry::UsageTemplate(template) => template.index,
        })
        .collect();
    assert_eq!(
        indices,
        vec![
            Some(builtin::RUN_DIAGNOSTIC),
            Some(builtin::RESET_HARDWARE_DEFAULTS),
            Some(builtin::REPAIR_BOOT_SECTOR),
            Some(builtin::FULLY_BOOTED),
        ]
    );
}

#[test]
fn test_load_from_missing_path_has_context() {
    let err = SimulationConfig::load_from_path(std::path::Path::new(
        "/nonexistent/contention/simulation.json",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("failed to read simulation config"));
}

#[test]
fn test_load_from_path_round_trip() {
    let path = std::env::temp_dir().join(format!("contention-config-{}.json", std::process::id()));
    let config = SimulationConfig {
        catalog: CatalogConfig::boot_sequence(),
        ..SimulationConfig::default()
    };
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = SimulationConfig::load_from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);
}
