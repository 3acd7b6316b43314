use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

type Cleanup = Box<dyn FnOnce()>;

/// Cleanup returned by an effect. Clones share the callback, which runs at
/// most once whichever clone runs it.
#[derive(Clone, Default)]
pub struct Dispose(Rc<Cell<Option<Cleanup>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(Cell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self::default()
    }

    pub fn run(&self) {
        if let Some(cleanup) = self.0.take() {
            cleanup();
        }
    }

    /// False once the cleanup ran (or for `noop`).
    pub fn is_pending(&self) -> bool {
        let cleanup = self.0.take();
        let pending = cleanup.is_some();
        self.0.set(cleanup);
        pending
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispose").field(&self.is_pending()).finish()
    }
}

/// Wraps the cleanup an effect hands back.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}
