//! Observable value holder with change notification.
//!
//! **Why**: Frame index, viewport membership and container size are derived
//! from a continuous scroll signal. Every derived value lives in a cell that
//! only notifies when the value actually changes, so steady-state ticks cost
//! a comparison and nothing else.
//!
//! **Used by**: Player (frame, playback state, container rect)
//!
//! # Notification Model
//!
//! - `write()` computes the candidate value, compares with `PartialEq`, and on
//!   change stores it and calls the callback synchronously.
//! - No batching. A callback writing to its own cell runs a nested update
//!   immediately. Nesting is capped at `MAX_REENTRANT_DEPTH` and reported as
//!   `Error::ReentrancyLimit` instead of overflowing the stack.
//! - The internal borrow is not held while an `Update::With` closure or the
//!   callback runs, so both may freely `read()`/`write()` any cell, including
//!   this one.
//!
//! # Teardown
//!
//! After `unsubscribe()` every `read()`/`write()` returns `Error::CellReleased`
//! and logs at error level. Stale data is never handed out.

use log::error;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Nested writes from callbacks beyond this depth are treated as an update cycle.
pub const MAX_REENTRANT_DEPTH: usize = 32;

type OnChange<T> = Rc<dyn Fn(&T)>;

/// A literal next value or a pure `(current) -> next` updater.
pub enum Update<T> {
    Value(T),
    With(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    fn resolve(self, current: &T) -> T {
        match self {
            Update::Value(v) => v,
            Update::With(f) => f(current),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Value(value)
    }
}

struct Slot<T> {
    /// None after unsubscribe
    value: Option<T>,
    on_change: Option<OnChange<T>>,
}

/// Shared handle to a single observable value (single-threaded).
pub struct ReactiveCell<T> {
    slot: Rc<RefCell<Slot<T>>>,
    depth: Rc<Cell<usize>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            depth: Rc::clone(&self.depth),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("ReactiveCell")
            .field("value", &slot.value)
            .field("released", &slot.value.is_none())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveCell<T> {
    /// Create a cell holding `initial`. `on_change` fires after each effective write.
    pub fn new<F>(initial: T, on_change: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self::build(initial, Some(Rc::new(on_change)))
    }

    /// Create a cell from a zero-argument producer.
    pub fn from_fn<P, F>(produce: P, on_change: F) -> Self
    where
        P: FnOnce() -> T,
        F: Fn(&T) + 'static,
    {
        Self::new(produce(), on_change)
    }

    /// Create a cell without a change callback (plain holder with equality gating).
    pub fn silent(initial: T) -> Self {
        Self::build(initial, None)
    }

    fn build(initial: T, on_change: Option<OnChange<T>>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value: Some(initial),
                on_change,
            })),
            depth: Rc::new(Cell::new(0)),
        }
    }

    /// Current value.
    pub fn read(&self) -> Result<T> {
        match &self.slot.borrow().value {
            Some(v) => Ok(v.clone()),
            None => {
                error!("Trying to read value after unsubscribing from it");
                Err(Error::CellReleased)
            }
        }
    }

    /// Apply `update`. Returns `Ok(true)` if the value changed and the callback ran.
    pub fn write(&self, update: impl Into<Update<T>>) -> Result<bool> {
        let update = update.into();

        // updaters run outside the borrow so they may read this cell
        let current = self.read()?;
        let next = update.resolve(&current);
        if current == next {
            return Ok(false);
        }

        let callback = {
            let mut slot = self.slot.borrow_mut();
            if slot.value.is_none() {
                error!("Cell released while resolving an update");
                return Err(Error::CellReleased);
            }
            slot.value = Some(next.clone());
            slot.on_change.clone().map(|cb| (cb, next))
        };

        let Some((callback, next)) = callback else {
            return Ok(true);
        };

        let depth = self.depth.get();
        if depth >= MAX_REENTRANT_DEPTH {
            error!("Reactive cell re-entered {} levels deep, aborting update chain", depth);
            return Err(Error::ReentrancyLimit(depth));
        }
        self.depth.set(depth + 1);
        callback(&next);
        self.depth.set(depth);
        Ok(true)
    }

    /// Shorthand for `write(Update::Value(value))`.
    pub fn set(&self, value: T) -> Result<bool> {
        self.write(Update::Value(value))
    }

    /// Shorthand for `write(Update::With(f))`.
    pub fn update<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&T) -> T + 'static,
    {
        self.write(Update::With(Box::new(f)))
    }

    /// Release the value and callback. Later access is a usage error.
    pub fn unsubscribe(&self) {
        let mut slot = self.slot.borrow_mut();
        slot.value = None;
        slot.on_change = None;
    }

    pub fn is_released(&self) -> bool {
        self.slot.borrow().value.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_cell(initial: i32) -> (ReactiveCell<i32>, Rc<RefCell<Vec<i32>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let cell = ReactiveCell::new(initial, move |v: &i32| s.borrow_mut().push(*v));
        (cell, seen)
    }

    #[test]
    fn test_write_notifies_on_change() {
        let (cell, seen) = counting_cell(0);
        assert_eq!(cell.set(5), Ok(true));
        assert_eq!(cell.read(), Ok(5));
        assert_eq!(*seen.borrow(), vec![5]);
    }

    #[test]
    fn test_same_value_is_noop() {
        let (cell, seen) = counting_cell(3);
        assert_eq!(cell.set(3), Ok(false));
        assert_eq!(cell.update(|c| *c), Ok(false));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_updater_sees_current() {
        let (cell, seen) = counting_cell(10);
        cell.update(|c| c + 1).unwrap();
        cell.update(|c| c * 2).unwrap();
        assert_eq!(cell.read(), Ok(22));
        assert_eq!(*seen.borrow(), vec![11, 22]);
    }

    #[test]
    fn test_from_fn_producer() {
        let cell = ReactiveCell::from_fn(|| String::from("init"), |_| {});
        assert_eq!(cell.read().unwrap(), "init");
    }

    #[test]
    fn test_released_cell_reports_error() {
        let (cell, seen) = counting_cell(1);
        cell.unsubscribe();
        assert!(cell.is_released());
        assert_eq!(cell.read(), Err(Error::CellReleased));
        assert_eq!(cell.set(2), Err(Error::CellReleased));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_callback_can_write_own_cell() {
        // Clamp-to-even: odd writes get corrected by a nested update.
        let holder: Rc<RefCell<Option<ReactiveCell<i32>>>> = Rc::new(RefCell::new(None));
        let h = Rc::clone(&holder);
        let cell = ReactiveCell::new(0, move |v: &i32| {
            if v % 2 != 0 {
                if let Some(cell) = h.borrow().as_ref() {
                    cell.set(v + 1).unwrap();
                }
            }
        });
        *holder.borrow_mut() = Some(cell.clone());

        cell.set(3).unwrap();
        assert_eq!(cell.read(), Ok(4));
    }

    #[test]
    fn test_reentrancy_guard_trips() {
        let holder: Rc<RefCell<Option<ReactiveCell<u64>>>> = Rc::new(RefCell::new(None));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let h = Rc::clone(&holder);
        let e = Rc::clone(&errors);
        // Unconditional self-write: an update cycle.
        let cell = ReactiveCell::new(0u64, move |v: &u64| {
            if let Some(cell) = h.borrow().as_ref() {
                if let Err(err) = cell.set(v + 1) {
                    e.borrow_mut().push(err);
                }
            }
        });
        *holder.borrow_mut() = Some(cell.clone());

        cell.set(1).unwrap();
        assert_eq!(*errors.borrow(), vec![Error::ReentrancyLimit(MAX_REENTRANT_DEPTH)]);
        assert_eq!(cell.read(), Ok(MAX_REENTRANT_DEPTH as u64 + 1));
    }

    #[test]
    fn test_updater_may_read_same_cell() {
        let cell = ReactiveCell::silent(4i32);
        let other = cell.clone();
        assert_eq!(cell.update(move |c| c + other.read().unwrap_or(0)), Ok(true));
        assert_eq!(cell.read(), Ok(8));
    }

    #[test]
    fn test_updater_may_release_cell() {
        let cell = ReactiveCell::silent(1i32);
        let other = cell.clone();
        let result = cell.update(move |c| {
            other.unsubscribe();
            c + 1
        });
        assert_eq!(result, Err(Error::CellReleased));
    }

    #[test]
    fn test_silent_cell() {
        let cell = ReactiveCell::silent(1.5f64);
        assert_eq!(cell.set(1.5), Ok(false));
        assert_eq!(cell.set(2.5), Ok(true));
    }
}
