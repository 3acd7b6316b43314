//! # Composition locals
//!
//! A composition local carries a value to every read made while a provider
//! closure runs, without threading it through parameters:
//!
//! ```rust
//! use tether_core::*;
//!
//! let user: CompositionLocal<String> = CompositionLocal::new("user");
//!
//! assert_eq!(user.current(), None);
//! user.provide("ada".to_string(), || {
//!     assert_eq!(user.current().as_deref(), Some("ada"));
//!     user.provide("grace".to_string(), || {
//!         // the innermost provider wins
//!         assert_eq!(user.current().as_deref(), Some("grace"));
//!     });
//! });
//! ```
//!
//! Every `CompositionLocal` gets its own id, so two locals of the same type
//! never shadow each other. A local may carry a default that is returned when
//! no provider is on the stack.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalId(u64);

impl LocalId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LocalId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<LocalId, Rc<dyn Any>>>> = RefCell::new(Vec::new());
}

fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    // Non-panicking frame guard (ensures pop on unwind)
    struct Guard;
    impl Drop for Guard {
        fn drop(&mut self) {
            LOCALS_STACK.with(|st| {
                st.borrow_mut().pop();
            });
        }
    }
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _guard = Guard;
    f()
}

fn set_local(id: LocalId, v: Rc<dyn Any>) {
    LOCALS_STACK.with(|st| {
        if let Some(top) = st.borrow_mut().last_mut() {
            top.insert(id, v);
        } else {
            log::warn!("set_local: no locals frame for {id:?}; value dropped.");
        }
    });
}

fn lookup(id: LocalId) -> Option<Rc<dyn Any>> {
    LOCALS_STACK.with(|st| {
        st.borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.get(&id).cloned())
    })
}

/// Number of provider frames currently open on this thread.
pub fn locals_depth() -> usize {
    LOCALS_STACK.with(|st| st.borrow().len())
}

/// Typed handle to a scoped value.
pub struct CompositionLocal<T: 'static> {
    id: LocalId,
    name: &'static str,
    default: Option<Rc<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Clone for CompositionLocal<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name,
            default: self.default.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> std::fmt::Debug for CompositionLocal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionLocal")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl<T: 'static> CompositionLocal<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            id: LocalId::next(),
            name,
            default: None,
            _marker: PhantomData,
        }
    }

    pub fn with_default(name: &'static str, default: T) -> Self {
        Self {
            default: Some(Rc::new(default)),
            ..Self::new(name)
        }
    }

    /// Sets the value returned when no provider is on the stack. The id is
    /// kept, so clones made earlier still refer to the same local.
    pub fn set_default(&mut self, default: T) {
        self.default = Some(Rc::new(default));
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs `f` with `value` visible to every read of this local inside it.
    pub fn provide<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        with_locals_frame(|| {
            set_local(self.id, Rc::new(value));
            f()
        })
    }

    /// The innermost provided value, or the default.
    pub fn current_rc(&self) -> Option<Rc<T>> {
        match lookup(self.id) {
            Some(v) => match v.downcast::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    log::warn!("composition local '{}' holds a foreign type", self.name);
                    None
                }
            },
            None => self.default.clone(),
        }
    }

    pub fn current(&self) -> Option<T>
    where
        T: Clone,
    {
        self.current_rc().map(|v| (*v).clone())
    }
}
