//! Audit sink implementations.
//!
//! Records scheduler transitions in order, stamped with simulated time.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::index::Index;

/// Scheduler transition being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Job appended to the queue.
    Queued,
    /// Job moved from the queue to the running set.
    Admitted,
    /// Job removed from the queue or running set by request.
    Halted,
    /// Job reached full progress and left the running set.
    Finished,
    /// Repeatable job started a new epoch.
    Reset,
    /// Allocation was recomputed.
    Reallocated,
    /// Request had no effect given the job's state.
    Ignored,
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonic sequence number within one scheduler.
    pub sequence: u64,
    /// Simulated seconds elapsed when the event happened.
    pub at: f64,
    /// Job concerned, if any.
    pub job: Option<Index>,
    /// Transition recorded.
    pub action: AuditAction,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory audit sink for testing and dev.
///
/// Clones share the same buffer, so a caller can keep a handle while the
/// scheduler owns another.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer. A bound of zero
    /// discards every event.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events with the given action.
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    sequence: u64,
    at: f64,
    job: Option<Index>,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        sequence,
        at,
        job,
        action,
        detail,
    }
}
