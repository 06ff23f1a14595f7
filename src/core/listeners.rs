//! Typed listener registry with removable handles.
//!
//! Architecture:
//! - Listeners subscribe with a callback and get a `ListenerId` back
//! - emit() invokes every callback immediately, in subscription order (FIFO)
//! - remove() by handle at any time, including from inside a callback
//!
//! Callbacks are snapshotted before dispatch, so a listener added or removed
//! during emit() takes effect from the next emit().
//!
//! Single-threaded: shared via `Rc`, cloning the registry clones the handle.

use indexmap::IndexMap;
use log::trace;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Handle returned by `Listeners::add()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

type Callback<T> = Rc<dyn Fn(&T)>;

pub struct Listeners<T> {
    callbacks: Rc<RefCell<IndexMap<ListenerId, Callback<T>>>>,
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            callbacks: Rc::clone(&self.callbacks),
        }
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.callbacks.borrow().len())
            .finish()
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            callbacks: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Subscribe. The callback runs on every emit() until removed.
    pub fn add<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        self.callbacks.borrow_mut().insert(id, Rc::new(callback));
        id
    }

    /// Unsubscribe. Returns false if the handle was unknown (already removed).
    pub fn remove(&self, id: ListenerId) -> bool {
        self.callbacks.borrow_mut().shift_remove(&id).is_some()
    }

    /// Invoke all callbacks with `event`.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Callback<T>> = self.callbacks.borrow().values().cloned().collect();
        trace!("Listeners: emit to {} callbacks", snapshot.len());
        for cb in snapshot {
            cb(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.callbacks.borrow_mut().clear();
    }
}
