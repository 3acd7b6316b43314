//! Per-instance state cells and their setters.
//!
//! `use_state` is the composition-bound form: the cell lives in a slot of the
//! rendering composition and every effective write schedules a re-render.
//!
//! ```rust
//! use tether_core::*;
//!
//! let mut composition = Composition::new(|| {
//!     let (count, set_count) = use_state(|| 0);
//!     if count < 3 {
//!         set_count.update(|c| c + 1);
//!     }
//!     View::text(count.to_string())
//! });
//! composition.settle();
//! assert_eq!(composition.view().texts(), ["3"]);
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::{Invalidator, invalidator, remember};

type Modify<T> = Box<dyn FnOnce(&T) -> Option<T>>;

/// Write half of a state pair.
///
/// Every write is a modification of the *current* value: `Some(next)`
/// replaces it and schedules a re-render, `None` leaves the value (and its
/// allocation) untouched and schedules nothing.
pub struct StateSetter<T: 'static>(Rc<dyn Fn(Modify<T>)>);

impl<T: 'static> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: 'static> std::fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StateSetter(..)")
    }
}

/// What a setter call asks for.
pub enum SetAction<T> {
    Replace(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

impl<T> SetAction<T> {
    pub fn update(f: impl FnOnce(&T) -> T + 'static) -> Self {
        SetAction::Update(Box::new(f))
    }

    pub fn resolve(self, current: &T) -> T {
        match self {
            SetAction::Replace(v) => v,
            SetAction::Update(f) => f(current),
        }
    }
}

impl<T> From<T> for SetAction<T> {
    fn from(value: T) -> Self {
        SetAction::Replace(value)
    }
}

impl<T: 'static> StateSetter<T> {
    pub fn from_fn(f: impl Fn(Box<dyn FnOnce(&T) -> Option<T>>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// A setter that only reports misuse: it logs and mutates nothing.
    pub fn decoy(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::from_fn(move |_| log::error!("{name} shouldn't be called"))
    }

    pub fn modify(&self, f: impl FnOnce(&T) -> Option<T> + 'static) {
        (self.0)(Box::new(f))
    }

    pub fn set(&self, value: T) {
        self.modify(move |_| Some(value))
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.modify(move |prev| Some(f(prev)))
    }

    pub fn apply(&self, action: impl Into<SetAction<T>>) {
        let action = action.into();
        self.modify(move |prev| Some(action.resolve(prev)))
    }
}

/// Shared mutable cell with a setter that can notify a composition.
pub struct StateCell<T: 'static> {
    value: Rc<RefCell<T>>,
}

impl<T: 'static> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
        }
    }
}

impl<T: 'static> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.value.borrow()
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// A setter writing into this cell. Effective writes call
    /// `on_change.invalidate()`; writes after the cell is dropped are ignored.
    pub fn setter(&self, on_change: Option<Invalidator>) -> StateSetter<T> {
        let weak = Rc::downgrade(&self.value);
        StateSetter::from_fn(move |f| {
            let Some(cell) = weak.upgrade() else {
                log::debug!("state setter called after its cell was dropped; ignored");
                return;
            };
            let next = {
                let current = cell.borrow();
                f(&*current)
            };
            if let Some(next) = next {
                *cell.borrow_mut() = next;
                if let Some(on_change) = &on_change {
                    on_change.invalidate();
                }
            }
        })
    }
}

struct StateSlot<T: 'static> {
    cell: StateCell<T>,
    setter: StateSetter<T>,
}

/// Slot-bound state: `(current value, stable setter)`.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, StateSetter<T>) {
    let slot = remember(|| {
        let cell = StateCell::new(init());
        let setter = cell.setter(Some(invalidator()));
        StateSlot { cell, setter }
    });
    (slot.cell.get(), slot.setter.clone())
}
