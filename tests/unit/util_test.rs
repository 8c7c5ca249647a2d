//! Tests for utility functions

use contention::core::{builtin, Index};
use contention::util::{init_tracing, init_tracing_with_default};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    init_tracing_with_default("contention=debug");
    tracing::info!("subscriber installed once");
}

#[test]
fn test_index_helpers() {
    assert!(!Index::UNBOUND.is_bound());
    assert_eq!(Index::default(), Index::UNBOUND);
    assert_eq!(builtin::CPU_SPEED.offset(1), builtin::CPU_CORES);
    assert_eq!(Index::from(7000_i32), builtin::FIRST_USER_DEFINED);
    assert_eq!(builtin::FULLY_BOOTED.to_string(), "5000");
}
