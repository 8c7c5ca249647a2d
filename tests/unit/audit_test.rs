//! Tests for audit sink

use contention::core::{build_audit_event, AuditAction, AuditSink, Index, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        1,
        0.5,
        Some(Index(7000)),
        AuditAction::Queued,
        Some("detail".to_string()),
    );

    sink.record(event);
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].sequence, 1);
    assert_eq!(events[0].job, Some(Index(7000)));
    assert_eq!(events[0].action, AuditAction::Queued);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, 0.0, None, AuditAction::Reallocated, None));
    sink.record(build_audit_event(2, 0.0, None, AuditAction::Reallocated, None));
    sink.record(build_audit_event(3, 0.0, None, AuditAction::Reallocated, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 2); // First one popped
    assert_eq!(events[1].sequence, 3);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);

    sink.record(build_audit_event(1, 0.0, None, AuditAction::Reallocated, None));
    sink.record(build_audit_event(2, 0.0, None, AuditAction::Reallocated, None));

    assert!(sink.events().is_empty());
}

#[test]
fn test_clones_share_buffer() {
    let handle = InMemoryAuditSink::new(8);
    let mut writer = handle.clone();

    writer.record(build_audit_event(1, 0.0, Some(Index(1)), AuditAction::Admitted, None));
    writer.record(build_audit_event(2, 1.0, Some(Index(1)), AuditAction::Finished, None));

    assert_eq!(handle.events().len(), 2);
    assert_eq!(handle.events_with(AuditAction::Finished).len(), 1);
}

#[test]
fn test_audit_event_serializes_snake_case() {
    let event = build_audit_event(7, 2.5, None, AuditAction::Reallocated, None);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"reallocated\""));
}
