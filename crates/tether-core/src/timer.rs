//! Interval timers driven by the thread clock.
//!
//! Timers never fire on their own: the host calls [`run_due_timers`] (the
//! `Scheduler` does it on every tick) and every interval whose deadline has
//! passed runs once per elapsed period, in deadline order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use slotmap::SlotMap;
use web_time::{Duration, Instant};

use crate::clock;

/// Shortest period accepted by [`set_interval`].
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

slotmap::new_key_type! {
    pub struct TimerKey;
}

thread_local! {
    static TIMERS: RefCell<TimerQueue> = RefCell::new(TimerQueue::default());
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    instant: Instant,
    seq: u64,
}

struct Interval {
    period: Duration,
    deadline: Deadline,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
struct TimerQueue {
    entries: SlotMap<TimerKey, Interval>,
    queue: BTreeMap<Deadline, TimerKey>,
    next_seq: u64,
}

impl TimerQueue {
    fn deadline(&mut self, instant: Instant) -> Deadline {
        let seq = self.next_seq;
        self.next_seq += 1;
        Deadline { instant, seq }
    }

    fn insert(&mut self, period: Duration, callback: Rc<dyn Fn()>) -> TimerKey {
        let deadline = self.deadline(clock::now() + period);
        let key = self.entries.insert(Interval {
            period,
            deadline,
            callback,
        });
        self.queue.insert(deadline, key);
        key
    }

    fn remove(&mut self, key: TimerKey) -> bool {
        match self.entries.remove(key) {
            Some(interval) => {
                self.queue.remove(&interval.deadline);
                true
            }
            None => false,
        }
    }

    /// Pops the earliest due interval, reschedules it one period later and
    /// returns its callback.
    fn pop_due(&mut self, now: Instant) -> Option<Rc<dyn Fn()>> {
        let (&deadline, &key) = self.queue.first_key_value()?;
        if deadline.instant > now {
            return None;
        }
        self.queue.remove(&deadline);
        let period = self.entries[key].period;
        let next = self.deadline(deadline.instant + period);
        let interval = &mut self.entries[key];
        interval.deadline = next;
        let callback = interval.callback.clone();
        self.queue.insert(next, key);
        Some(callback)
    }
}

/// Cancels its interval when dropped.
#[must_use = "dropping the handle cancels the interval"]
pub struct IntervalHandle {
    key: TimerKey,
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        let key = self.key;
        // The queue may already be gone during thread teardown.
        let _ = TIMERS.try_with(|t| {
            if t.borrow_mut().remove(key) {
                log::trace!("interval {key:?} cancelled");
            }
        });
    }
}

/// Calls `f` every `period` of clock time until the handle is dropped.
pub fn set_interval(period: Duration, f: impl Fn() + 'static) -> IntervalHandle {
    let period = if period < MIN_INTERVAL {
        log::warn!("set_interval: period {period:?} is below {MIN_INTERVAL:?}; clamping.");
        MIN_INTERVAL
    } else {
        period
    };
    let key = TIMERS.with(|t| t.borrow_mut().insert(period, Rc::new(f)));
    log::trace!("interval {key:?} scheduled every {period:?}");
    IntervalHandle { key }
}

/// Runs every interval that is due at `clock::now()` and returns how many
/// callbacks ran. An interval that is several periods late fires once per
/// missed period.
pub fn run_due_timers() -> usize {
    let now = clock::now();
    let mut fired = 0;
    // The borrow is released before each callback so it can add or cancel timers.
    while let Some(callback) = TIMERS.with(|t| t.borrow_mut().pop_due(now)) {
        callback();
        fired += 1;
    }
    fired
}

/// Number of live intervals on this thread.
pub fn pending_timers() -> usize {
    TIMERS.with(|t| t.borrow().entries.len())
}
