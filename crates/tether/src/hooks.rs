use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_core::{Invalidator, invalidator, remember, side_effect};

/// Default bound for [`use_render_again`].
pub const DEFAULT_RENDER_AGAIN_MAX: u32 = 5;

/// `max` value that lifts the bound of [`use_render_again`].
pub const UNBOUNDED_RENDER_AGAIN: u32 = 0;

/// Returns the value passed on the previous committed render, `None` on the
/// first one. The stored value is replaced after the current render commits.
pub fn use_previous_value<T: Clone + 'static>(value: T) -> Option<T> {
    let stored = remember(|| RefCell::new(None::<T>));
    let previous = stored.borrow().clone();
    side_effect(move || *stored.borrow_mut() = Some(value));
    previous
}

/// True if `value` differs from the one passed on the previous render.
/// The first render has nothing to compare against and reports `false`.
pub fn use_value_changed<T: PartialEq + Clone + 'static>(value: T) -> bool {
    let previous = use_previous_value(value.clone());
    previous.is_some_and(|previous| previous != value)
}

#[derive(Default)]
pub(crate) struct RenderRequests {
    /// Requests accepted so far; this is what the bound applies to.
    pub(crate) accepted: Cell<u32>,
    /// Accepted requests whose render has not happened yet.
    pub(crate) queued: Cell<u32>,
}

/// Trigger returned by [`use_render_again`].
#[derive(Clone)]
pub struct RenderAgain {
    pub(crate) requests: Rc<RenderRequests>,
    max: u32,
    invalidator: Invalidator,
}

impl RenderAgain {
    /// Requests one more render unless the bound is reached. Returns whether
    /// the request was accepted.
    ///
    /// Requests made before the composition renders again are queued, so
    /// every accepted request gets its own render.
    pub fn trigger(&self) -> bool {
        let accepted = self.requests.accepted.get();
        if self.max != UNBOUNDED_RENDER_AGAIN && accepted >= self.max {
            log::trace!("render again ignored: {accepted}/{} used", self.max);
            return false;
        }
        if !self.invalidator.is_alive() {
            return false;
        }
        self.requests.accepted.set(accepted.saturating_add(1));
        let queued = self.requests.queued.get();
        self.requests.queued.set(queued.saturating_add(1));
        if queued == 0 {
            self.invalidator.invalidate();
        }
        true
    }

    /// Requests accepted so far.
    pub fn count(&self) -> u32 {
        self.requests.accepted.get()
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

/// Forces up to `max` extra renders of the calling component
/// ([`UNBOUNDED_RENDER_AGAIN`] for no bound).
pub fn use_render_again(max: u32) -> RenderAgain {
    let requests = remember(RenderRequests::default);
    let invalidator = invalidator();

    // This render serves one queued request; the rest get one render each.
    let queued = requests.queued.get();
    if queued > 0 {
        requests.queued.set(queued - 1);
        if queued > 1 {
            let invalidator = invalidator.clone();
            side_effect(move || {
                invalidator.invalidate();
            });
        }
    }

    RenderAgain {
        requests,
        max,
        invalidator,
    }
}
