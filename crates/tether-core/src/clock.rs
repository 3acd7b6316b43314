use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::{Duration, Instant};

thread_local! {
    static CLOCK: RefCell<Rc<dyn Clock>> = RefCell::new(Rc::new(SystemClock));
}

/// Current time as seen by timers and effects on this thread.
pub fn now() -> Instant {
    CLOCK.with(|c| c.borrow().now())
}

// Runtime clock
pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Install the clock used by this thread. Platforms keep `SystemClock`; tests
/// install a `TestClock` and drive it by hand.
pub fn set_clock(clock: Rc<dyn Clock>) {
    CLOCK.with(|c| *c.borrow_mut() = clock);
}

/// A test clock you can drive deterministically.
///
/// Clones share the same instant, so a test can keep one handle and install
/// another with [`TestClock::install`].
#[derive(Clone)]
pub struct TestClock {
    t: Rc<Cell<Instant>>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            t: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Installs a clone of this clock as the thread clock and returns `self`.
    pub fn install(self) -> Self {
        set_clock(Rc::new(self.clone()));
        self
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}
