//! Observable list: an ordered reactive container.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::error::ListError;
use crate::core::index::Index;
use crate::core::property::{PropertyValue, SubscriptionId};

/// Description of the mutation that triggered a list notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange<T> {
    /// Synthetic notification delivered on subscribe.
    Replay,
    /// `value` was appended at `position`.
    Appended {
        /// Position of the new element.
        position: usize,
        /// Appended value.
        value: T,
    },
    /// `value` was removed from `position`.
    Removed {
        /// Former position of the element.
        position: usize,
        /// Removed value.
        value: T,
    },
    /// The element at `position` was replaced.
    Modified {
        /// Position of the element.
        position: usize,
        /// Previous value.
        old: T,
        /// New value.
        new: T,
    },
}

/// Callback invoked with the list contents after a mutation and the mutation itself.
pub type ListCallback<T> = Arc<dyn Fn(&[T], &ListChange<T>) + Send + Sync>;

struct ListState<T> {
    items: Vec<T>,
    subscribers: Vec<(SubscriptionId, ListCallback<T>)>,
}

struct Shared<T> {
    index: Index,
    name: String,
    state: Mutex<ListState<T>>,
}

/// An ordered sequence that notifies subscribers on every mutation.
pub struct ObservableList<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: PropertyValue> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PropertyValue> ObservableList<T> {
    /// Create an unbound, empty list.
    pub fn new() -> Self {
        Self::named(Index::UNBOUND, String::new())
    }

    /// Create an empty list bound to a registry index.
    pub fn named(index: Index, name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                index,
                name: name.into(),
                state: Mutex::new(ListState {
                    items: Vec::new(),
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Registry index this list is bound to.
    pub fn index(&self) -> Index {
        self.shared.index
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `position`.
    pub fn get(&self, position: usize) -> Result<T, ListError> {
        let state = self.shared.state.lock();
        state
            .items
            .get(position)
            .cloned()
            .ok_or(ListError::OutOfRange {
                index: position,
                len: state.items.len(),
            })
    }

    /// First element, if any.
    pub fn first(&self) -> Option<T> {
        self.shared.state.lock().items.first().cloned()
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.shared.state.lock().items.contains(value)
    }

    /// Position of the first element equal to `value`.
    pub fn position(&self, value: &T) -> Option<usize> {
        self.shared
            .state
            .lock()
            .items
            .iter()
            .position(|item| item == value)
    }

    /// Snapshot of the contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.shared.state.lock().items.clone()
    }

    /// Append `value`. Always notifies.
    pub fn append(&self, value: T) {
        self.mutate(|items| {
            items.push(value.clone());
            Some(ListChange::Appended {
                position: items.len() - 1,
                value,
            })
        });
    }

    /// Remove the first element equal to `value`. Notifies iff something was removed.
    pub fn remove_value(&self, value: &T) -> bool {
        self.mutate(|items| {
            let position = items.iter().position(|item| item == value)?;
            let value = items.remove(position);
            Some(ListChange::Removed { position, value })
        })
    }

    /// Remove and return the element at `position`. Always notifies on success.
    pub fn remove_at(&self, position: usize) -> Result<T, ListError> {
        let mut outcome = Err(ListError::OutOfRange { index: position, len: 0 });
        self.mutate(|items| {
            if position >= items.len() {
                outcome = Err(ListError::OutOfRange { index: position, len: items.len() });
                return None;
            }
            let value = items.remove(position);
            outcome = Ok(value.clone());
            Some(ListChange::Removed { position, value })
        });
        outcome
    }

    /// Replace the element at `position`. Notifies iff `value` differs from it.
    ///
    /// Returns whether the element changed.
    pub fn modify_at(&self, position: usize, value: T) -> Result<bool, ListError> {
        let mut outcome = Ok(false);
        self.mutate(|items| {
            let len = items.len();
            let Some(slot) = items.get_mut(position) else {
                outcome = Err(ListError::OutOfRange { index: position, len });
                return None;
            };
            if *slot == value {
                return None;
            }
            let old = std::mem::replace(slot, value.clone());
            outcome = Ok(true);
            Some(ListChange::Modified {
                position,
                old,
                new: value,
            })
        });
        outcome
    }

    /// Register `callback` and immediately invoke it with the current contents.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[T], &ListChange<T>) + Send + Sync + 'static,
    {
        let callback: ListCallback<T> = Arc::new(callback);
        let id = SubscriptionId::next();
        let items = {
            let mut state = self.shared.state.lock();
            state.subscribers.push((id, Arc::clone(&callback)));
            state.items.clone()
        };
        callback(&items, &ListChange::Replay);
        id
    }

    /// Remove a subscription. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.shared.state.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(existing, _)| *existing != id);
        state.subscribers.len() != before
    }

    /// Read-only view sharing this list's state.
    pub fn view(&self) -> ListView<T> {
        ListView { list: self.clone() }
    }

    /// Apply `edit` under the lock, then notify outside it if a change was reported.
    fn mutate<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut Vec<T>) -> Option<ListChange<T>>,
    {
        let (items, change, subscribers) = {
            let mut state = self.shared.state.lock();
            let Some(change) = edit(&mut state.items) else {
                return false;
            };
            let subscribers = state
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect::<Vec<_>>();
            (state.items.clone(), change, subscribers)
        };

        for callback in subscribers {
            callback(&items, &change);
        }
        true
    }
}

impl<T: PropertyValue + fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("index", &self.shared.index)
            .field("name", &self.shared.name)
            .field("items", &self.to_vec())
            .finish_non_exhaustive()
    }
}

/// Read-only handle to an [`ObservableList`] owned by someone else.
pub struct ListView<T> {
    list: ObservableList<T>,
}

impl<T> Clone for ListView<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<T: PropertyValue> ListView<T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Element at `position`.
    pub fn get(&self, position: usize) -> Result<T, ListError> {
        self.list.get(position)
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.list.contains(value)
    }

    /// Snapshot of the contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.list.to_vec()
    }

    /// Register `callback`; see [`ObservableList::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[T], &ListChange<T>) + Send + Sync + 'static,
    {
        self.list.subscribe(callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.list.unsubscribe(id)
    }
}

impl<T: PropertyValue + fmt::Debug> fmt::Debug for ListView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListView").field(&self.list).finish()
    }
}
