//! Observable property: a single reactive value cell.
//!
//! A cell notifies its subscribers synchronously, in subscription order,
//! whenever `set` stores a value that differs from the current one.
//! Subscribing replays the current value once so no observer starts stale.
//!
//! Cells are cheap handles over shared state; cloning a cell yields another
//! handle to the same value. The internal lock is never held while callbacks
//! run, so a callback may freely read or write any cell, including the one
//! that is notifying it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::index::Index;

/// Marker trait for values that can live in an observable cell.
///
/// Equality decides whether a write is a change. `Option<T>` gives the
/// null semantics: `None` to `None` is no change, `None` to `Some` is one.
pub trait PropertyValue: Clone + PartialEq + Send + Sync + 'static {}

/// Blanket implementation: any type meeting the requirements is a `PropertyValue`.
impl<T> PropertyValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Callback invoked with the value of a property.
pub type PropertyCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct CellState<T> {
    value: T,
    subscribers: Vec<(SubscriptionId, PropertyCallback<T>)>,
}

struct Shared<T> {
    index: Index,
    name: String,
    state: Mutex<CellState<T>>,
}

/// A reactive value cell with change notification.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: PropertyValue> Observable<T> {
    /// Create an unbound, unnamed cell.
    pub fn new(value: T) -> Self {
        Self::named(Index::UNBOUND, String::new(), value)
    }

    /// Create a cell bound to a registry index.
    pub fn named(index: Index, name: impl Into<String>, value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                index,
                name: name.into(),
                state: Mutex::new(CellState {
                    value,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Registry index this cell is bound to.
    pub fn index(&self) -> Index {
        self.shared.index
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.shared.state.lock().value.clone()
    }

    /// Store `value` and notify subscribers if it differs from the current one.
    ///
    /// Returns whether a change happened.
    pub fn set(&self, value: T) -> bool {
        let subscribers = {
            let mut state = self.shared.state.lock();
            if state.value == value {
                return false;
            }
            state.value = value.clone();
            state
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect::<Vec<_>>()
        };

        for callback in subscribers {
            callback(&value);
        }
        true
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&self.get());
        self.set(next)
    }

    /// Register `callback` and immediately invoke it with the current value.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: PropertyCallback<T> = Arc::new(callback);
        let id = SubscriptionId::next();
        let current = {
            let mut state = self.shared.state.lock();
            state.subscribers.push((id, Arc::clone(&callback)));
            state.value.clone()
        };
        callback(&current);
        id
    }

    /// Remove a subscription. Returns whether it was registered.
    ///
    /// A notification already in flight still reaches the removed callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.shared.state.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(existing, _)| *existing != id);
        state.subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T: PropertyValue + fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("index", &self.shared.index)
            .field("name", &self.shared.name)
            .field("value", &self.get())
            .finish_non_exhaustive()
    }
}
