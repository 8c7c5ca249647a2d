//! Tests for the registry

use std::sync::Arc;

use contention::config::MachineConfig;
use contention::core::{
    builtin, EntryKind, Index, JobDefinition, ListChange, Registry, RegistryError,
    ResourceUsageSpec,
};
use parking_lot::Mutex;

fn registry() -> Registry {
    Registry::new(&MachineConfig::default()).unwrap()
}

#[test]
fn test_builtin_properties_installed() {
    let registry = registry();
    assert!((registry.value::<f64>(builtin::CPU_SPEED).unwrap() - 8.0).abs() < f64::EPSILON);
    assert_eq!(registry.value::<u32>(builtin::CPU_CORES).unwrap(), 1);
    assert_eq!(registry.property_name(builtin::DISK_BUS_USAGE).unwrap(), "Disk Bus Usage");
    assert_eq!(
        registry.usage_template(builtin::DEFAULT_USAGE_TEMPLATE).unwrap(),
        ResourceUsageSpec::default_process()
    );
    assert!(registry.queued_jobs().is_empty());
    assert!(registry.running_jobs().is_empty());
}

#[test]
fn test_machine_handles_alias_indexed_cells() {
    let registry = registry();
    registry.set_value(builtin::CPU_SPEED, 12.0_f64).unwrap();
    assert!((registry.machine().cpu_speed.get() - 12.0).abs() < f64::EPSILON);
    assert!((registry.machine().cpu_capacity() - 12.0).abs() < f64::EPSILON);
}

#[test]
fn test_rejects_invalid_machine_config() {
    let err = Registry::new(&MachineConfig::default().with_cpu_speed(-1.0)).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidConfig(_)));
}

#[test]
fn test_duplicate_property_index() {
    let mut registry = registry();
    let err = registry
        .define_property(builtin::CPU_SPEED, "Again", 1.0_f64)
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateIndex {
            kind: EntryKind::Property,
            index: builtin::CPU_SPEED,
        }
    );
}

#[test]
fn test_unbound_index_rejected() {
    let mut registry = registry();
    let err = registry.define_property(Index::UNBOUND, "Nowhere", 0_u8).unwrap_err();
    assert_eq!(err, RegistryError::Unbound);
}

#[test]
fn test_type_mismatch() {
    let registry = registry();
    let err = registry.value::<bool>(builtin::CPU_SPEED).unwrap_err();
    assert!(matches!(err, RegistryError::TypeMismatch { index, .. } if index == builtin::CPU_SPEED));
}

#[test]
fn test_unknown_lookups() {
    let registry = registry();
    assert!(matches!(
        registry.job(Index(4242)),
        Err(RegistryError::UnknownIndex { kind: EntryKind::Job, .. })
    ));
    assert!(matches!(
        registry.objective(Index(4242)),
        Err(RegistryError::UnknownIndex { kind: EntryKind::Objective, .. })
    ));
    assert!(registry.resource(Index(4242)).is_err());
    assert!(registry.value::<f64>(Index(4242)).is_err());
}

#[test]
fn test_auto_indices_start_at_user_range() {
    let mut registry = registry();
    let flag = registry.add_property("Tabs Visible", false).unwrap();
    let template = registry
        .add_usage_template(ResourceUsageSpec::cpu_only(5.0))
        .unwrap();
    let job = registry
        .add_job(JobDefinition::new("Probe", ResourceUsageSpec::cpu_only(5.0)))
        .unwrap();
    assert_eq!(flag, builtin::FIRST_USER_DEFINED);
    assert_eq!(template, flag.offset(1));
    assert_eq!(job, flag.offset(2));
    assert_eq!(registry.reserve_index(), flag.offset(3));
}

#[test]
fn test_subscribe_by_index() {
    let registry = registry();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = registry
        .subscribe(builtin::MEMORY_CAPACITY, move |v: &f64| sink.lock().push(*v))
        .unwrap();

    registry.set_value(builtin::MEMORY_CAPACITY, 64.0_f64).unwrap();
    assert!(registry.unsubscribe(builtin::MEMORY_CAPACITY, id).unwrap());
    registry.set_value(builtin::MEMORY_CAPACITY, 128.0_f64).unwrap();

    assert_eq!(*seen.lock(), vec![32.0, 64.0]);
}

#[test]
fn test_list_property_by_index() {
    let mut registry = registry();
    let index = registry.add_list_property::<String>("Console History").unwrap();
    assert_eq!(registry.property_name(index).unwrap(), "Console History");

    let lengths = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lengths);
    let history = registry.list_property::<String>(index).unwrap();
    let id = history.subscribe(move |items: &[String], _: &ListChange<String>| {
        sink.lock().push(items.len());
    });

    // A second lookup returns a handle to the same list.
    registry
        .list_property::<String>(index)
        .unwrap()
        .append("boot".to_string());
    assert_eq!(history.to_vec(), vec!["boot".to_string()]);
    assert_eq!(history.index(), index);

    assert!(registry.unsubscribe(index, id).unwrap());
    history.append("login".to_string());
    assert_eq!(*lengths.lock(), vec![0, 1]);
}

#[test]
fn test_list_property_index_conflicts() {
    let mut registry = registry();
    let index = Index(7300);
    registry.define_list_property::<u32>(index, "Seen").unwrap();

    let err = registry.define_list_property::<u32>(index, "Again").unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateIndex {
            kind: EntryKind::Property,
            index,
        }
    );
    assert!(registry.define_property(index, "Scalar", 0_u32).is_err());
    assert!(registry
        .define_list_property::<u32>(builtin::CPU_SPEED, "Speeds")
        .is_err());
    assert!(registry.define_list_property::<u32>(Index::UNBOUND, "Nowhere").is_err());
}

#[test]
fn test_list_property_type_mismatch() {
    let mut registry = registry();
    let index = registry.add_list_property::<u32>("Counts").unwrap();

    assert!(matches!(
        registry.list_property::<String>(index),
        Err(RegistryError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.value::<u32>(index),
        Err(RegistryError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.list_property::<f64>(builtin::CPU_SPEED),
        Err(RegistryError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.list_property::<u32>(Index(7999)),
        Err(RegistryError::UnknownIndex { .. })
    ));
}

#[test]
fn test_resources_link_storage_property() {
    let mut registry = registry();
    let storage = registry.add_property("Data Storage", 100.0_f64).unwrap();
    let resource = registry.add_resource(storage, "Data", 0.0).unwrap();

    let data = registry.resource(resource).unwrap();
    assert_eq!(data.name(), "Data");
    assert_eq!(data.storage_property(), storage);
    data.amount().set(12.5);
    assert!((registry.resource(resource).unwrap().amount().get() - 12.5).abs() < f64::EPSILON);
}

#[test]
fn test_invalid_job_usage_rejected() {
    let mut registry = registry();
    let err = registry
        .add_job(JobDefinition::new("Nothing", ResourceUsageSpec::cpu_only(0.0)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidUsage(_)));
    assert!(registry.job_indices().is_empty());
}

#[test]
fn test_job_requiring_unknown_objective_rejected() {
    let mut registry = registry();
    let err = registry
        .add_job(JobDefinition::new("Gated", ResourceUsageSpec::cpu_only(5.0)).requires(Index(5555)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnknownIndex { kind: EntryKind::Objective, .. }));
}

#[test]
fn test_non_finite_repeat_exponent_rejected() {
    let mut registry = registry();
    let err = registry
        .add_job(JobDefinition::new("Spin", ResourceUsageSpec::cpu_only(5.0)).with_repeat(f64::NAN))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidUsage(_)));
}
