//! Tests for builder modules

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contention::builders::{build_registry, build_registry_with, populate_registry};
use contention::config::{
    CatalogConfig, CatalogEntry, JobEntry, MachineConfig, ObjectiveEntry, SimulationConfig,
    UsageSource, UsageTemplateEntry,
};
use contention::core::{
    builtin, FinishCallback, Index, Job, Registry, RegistryError, RepeatPolicy, ResourceUsageSpec,
};

fn boot_config() -> SimulationConfig {
    SimulationConfig {
        catalog: CatalogConfig::boot_sequence(),
        ..SimulationConfig::default()
    }
}

#[test]
fn test_build_boot_sequence() {
    let registry = build_registry(&boot_config()).unwrap();

    assert_eq!(
        registry.job_indices(),
        vec![
            builtin::RUN_DIAGNOSTIC,
            builtin::RESET_HARDWARE_DEFAULTS,
            builtin::REPAIR_BOOT_SECTOR,
        ]
    );
    let objective = registry.objective(builtin::FULLY_BOOTED).unwrap();
    assert_eq!(objective.name(), "Fully Booted");
    assert_eq!(objective.dependents().len(), 3);
    assert!(!objective.is_complete());

    let job = registry.job(builtin::RUN_DIAGNOSTIC).unwrap();
    assert_eq!(*job.base_usage(), ResourceUsageSpec::default_process());
}

#[test]
fn test_build_rejects_invalid_machine() {
    let cfg = SimulationConfig {
        machine: MachineConfig::default().with_cpu_cores(0),
        ..SimulationConfig::default()
    };
    let err = build_registry(&cfg).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidConfig(_)));
}

#[test]
fn test_build_resolves_templates_and_auto_indices() {
    let template = ResourceUsageSpec::new(30.0, 0.5, 0.0, 2, 0).unwrap();
    let catalog = CatalogConfig::new()
        .with_entry(CatalogEntry::UsageTemplate(UsageTemplateEntry {
            index: None,
            usage: template,
        }))
        .with_entry(CatalogEntry::Job(JobEntry {
            index: None,
            name: "Defragment".into(),
            usage: UsageSource::Template(builtin::FIRST_USER_DEFINED),
            required_objectives: Vec::new(),
            repeat: Some(RepeatPolicy::new(1.0)),
        }));

    let mut registry = Registry::new(&MachineConfig::default()).unwrap();
    let defined = populate_registry(&mut registry, &catalog, |_, _| None).unwrap();

    assert_eq!(defined, vec![Index(7000), Index(7001)]);
    let job = registry.job(Index(7001)).unwrap();
    assert_eq!(*job.base_usage(), template);
    assert!(job.is_repeatable());
}

#[test]
fn test_build_reports_unknown_template() {
    let catalog = CatalogConfig::new().with_entry(CatalogEntry::Job(JobEntry {
        index: None,
        name: "Orphan".into(),
        usage: UsageSource::Template(Index(9999)),
        required_objectives: Vec::new(),
        repeat: None,
    }));
    let cfg = SimulationConfig {
        catalog,
        ..SimulationConfig::default()
    };
    let err = build_registry(&cfg).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownIndex { .. }));
}

#[test]
fn test_build_reports_unknown_objective_dependency() {
    let catalog = CatalogConfig::new().with_entry(CatalogEntry::Objective(ObjectiveEntry {
        index: None,
        name: "Nothing".into(),
        jobs: vec![Index(4242)],
    }));
    let cfg = SimulationConfig {
        catalog,
        ..SimulationConfig::default()
    };
    assert!(build_registry(&cfg).is_err());
}

#[test]
fn test_finish_factory_sees_each_job() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let registry = build_registry_with(&boot_config(), move |index, entry| {
        assert_eq!(entry.index, Some(index));
        counter.fetch_add(1, Ordering::SeqCst);
        let callback: FinishCallback = Arc::new(|_: &Job, _: &Registry| {});
        Some(callback)
    })
    .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert_eq!(registry.job_indices().len(), 3);
}
