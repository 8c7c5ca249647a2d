//! Tests for error types

use contention::core::{EntryKind, Index, ListError, RegistryError};

#[test]
fn test_duplicate_index_display() {
    let err = RegistryError::DuplicateIndex {
        kind: EntryKind::Property,
        index: Index(1000),
    };
    assert_eq!(err.to_string(), "property index 1000 being reused");
}

#[test]
fn test_unknown_index_display() {
    let err = RegistryError::UnknownIndex {
        kind: EntryKind::Job,
        index: Index(4242),
    };
    assert_eq!(err.to_string(), "no job at index 4242");
}

#[test]
fn test_invalid_config_display() {
    let err = RegistryError::InvalidConfig("cpu_cores must be greater than 0".into());
    assert_eq!(err.to_string(), "config invalid: cpu_cores must be greater than 0");
}

#[test]
fn test_list_out_of_range_display() {
    let err = ListError::OutOfRange { index: 3, len: 2 };
    assert_eq!(err.to_string(), "index 3 out of range for list of length 2");
}

#[test]
fn test_errors_convert_into_anyhow() {
    fn lookup() -> contention::core::AppResult<()> {
        Err(RegistryError::Unbound.into())
    }
    let err = lookup().unwrap_err();
    assert!(err.downcast_ref::<RegistryError>().is_some());
}
