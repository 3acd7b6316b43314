//! Cleanup ownership.
//!
//! Every composition renders inside its own [`Scope`]. Cleanups registered
//! while it renders (through [`scoped_effect`]) run when the composition is
//! disposed, newest first.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::Dispose;

type Disposers = SmallVec<[Box<dyn FnOnce()>; 4]>;

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    disposers: RefCell<Disposers>,
    disposed: Cell<bool>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the previously current scope, also on unwind.
struct Enter(Option<Weak<ScopeInner>>);

impl Drop for Enter {
    fn drop(&mut self) {
        let prev = self.0.take();
        CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner::default()),
        }
    }

    /// Runs `f` with this scope as the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = CURRENT_SCOPE
            .with(|current| current.borrow_mut().replace(Rc::downgrade(&self.inner)));
        let _enter = Enter(prev);
        f()
    }

    /// Registers a cleanup. On a scope that is already disposed it runs
    /// immediately.
    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        if self.inner.disposed.get() {
            log::debug!("scope already disposed; running cleanup now.");
            disposer();
            return;
        }
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn disposer_count(&self) -> usize {
        self.inner.disposers.borrow().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Runs every registered cleanup, newest first. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.run_disposers();
    }
}

impl ScopeInner {
    fn run_disposers(&self) {
        // Cleanups may register more cleanups; drain until empty.
        loop {
            let batch = std::mem::take(&mut *self.disposers.borrow_mut());
            if batch.is_empty() {
                break;
            }
            for disposer in batch.into_iter().rev() {
                disposer();
            }
        }
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.run_disposers();
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    })
}

/// Runs `f` now and ties the returned cleanup to the current scope.
pub fn scoped_effect<F>(f: F)
where
    F: FnOnce() -> Dispose + 'static,
{
    let cleanup = f();
    match current_scope() {
        Some(scope) => scope.add_disposer(move || cleanup.run()),
        None => log::warn!("scoped_effect: no current scope; cleanup will never run."),
    }
}
