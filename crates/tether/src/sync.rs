//! Contexts whose value is kept current by an async sync function.
//!
//! Each mounted provider runs a sync cycle after its first commit and again
//! whenever its props change. With a non-zero repeat period an interval
//! starts a new attempt every period until the provider unmounts.
//!
//! Status moves `Uninitialized -> Syncing -> Ready -> Syncing -> Ready ...`.
//! A failed attempt moves to `Failed` with the error attached and the last
//! good value kept; the next attempt moves back to `Syncing`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::future::{AbortHandle, Abortable, FutureExt, LocalBoxFuture};
use tether_core::{
    Dispose, Duration, IntervalHandle, StateSetter, View, disposable_effect, on_unmount,
    set_interval, spawn_local, use_state,
};

use crate::context::{Context, Provided, create_context};
use crate::error::ContextError;

/// Repeat period meaning "sync once per props".
pub const NEVER_REPEAT: Duration = Duration::ZERO;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Uninitialized,
    Syncing,
    Ready,
    Failed,
}

/// Value and status broadcast by a synchronized context.
#[derive(Clone)]
pub struct Synced<S> {
    pub value: S,
    pub status: SyncStatus,
    /// Error of the last applied attempt, if it failed.
    pub error: Option<Rc<anyhow::Error>>,
}

impl<S> Synced<S> {
    pub fn new(initial: S) -> Self {
        Self::with_status(initial, SyncStatus::Uninitialized)
    }

    pub fn ready(value: S) -> Self {
        Self::with_status(value, SyncStatus::Ready)
    }

    pub fn with_status(value: S, status: SyncStatus) -> Self {
        Self {
            value,
            status,
            error: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == SyncStatus::Ready
    }
}

impl<S: fmt::Debug> fmt::Debug for Synced<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synced")
            .field("value", &self.value)
            .field("status", &self.status)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

/// Cloneable async function producing a fresh `S`.
pub struct SyncFn<S: 'static>(Rc<dyn Fn() -> LocalBoxFuture<'static, anyhow::Result<S>>>);

impl<S: 'static> Clone for SyncFn<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: 'static> SyncFn<S> {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<S>> + 'static,
    {
        Self(Rc::new(move || f().boxed_local()))
    }

    pub fn call(&self) -> LocalBoxFuture<'static, anyhow::Result<S>> {
        (self.0)()
    }
}

/// One sync cycle of a mounted provider: owns its interval and the abort
/// handles of its in-flight attempts.
struct SyncDriver<S: 'static> {
    name: &'static str,
    sync_fn: SyncFn<S>,
    set_state: StateSetter<Synced<S>>,
    started: Cell<u64>,
    applied: Cell<u64>,
    in_flight: RefCell<Vec<(u64, AbortHandle)>>,
    interval: RefCell<Option<IntervalHandle>>,
    stopped: Cell<bool>,
}

impl<S: Clone + 'static> SyncDriver<S> {
    fn start(
        name: &'static str,
        sync_fn: SyncFn<S>,
        set_state: StateSetter<Synced<S>>,
        repeat: Duration,
    ) -> Rc<Self> {
        let driver = Rc::new(SyncDriver {
            name,
            sync_fn,
            set_state,
            started: Cell::new(0),
            applied: Cell::new(0),
            in_flight: RefCell::new(Vec::new()),
            interval: RefCell::new(None),
            stopped: Cell::new(false),
        });
        driver.begin();
        if repeat != NEVER_REPEAT {
            let weak = Rc::downgrade(&driver);
            let interval = set_interval(repeat, move || {
                if let Some(driver) = weak.upgrade() {
                    driver.begin();
                }
            });
            *driver.interval.borrow_mut() = Some(interval);
        }
        driver
    }

    fn begin(self: &Rc<Self>) {
        if self.stopped.get() {
            return;
        }
        let seq = self.started.get() + 1;
        self.started.set(seq);
        log::trace!("{}: sync attempt #{seq} started", self.name);
        self.set_state.update(|prev| Synced {
            status: SyncStatus::Syncing,
            ..prev.clone()
        });

        let (abort, registration) = AbortHandle::new_pair();
        self.in_flight.borrow_mut().push((seq, abort));
        let attempt = Abortable::new(self.sync_fn.call(), registration);
        let weak: Weak<Self> = Rc::downgrade(self);
        let spawned = spawn_local(async move {
            let Ok(result) = attempt.await else {
                return;
            };
            if let Some(driver) = weak.upgrade() {
                driver.finish(seq, result);
            }
        });
        if let Err(e) = spawned {
            self.finish(seq, Err(anyhow::Error::new(e)));
        }
    }

    fn finish(&self, seq: u64, result: anyhow::Result<S>) {
        self.in_flight.borrow_mut().retain(|(s, _)| *s != seq);
        if self.stopped.get() {
            return;
        }
        if seq <= self.applied.get() {
            log::debug!(
                "{}: discarding result of sync attempt #{seq}; #{} already applied",
                self.name,
                self.applied.get()
            );
            return;
        }
        self.applied.set(seq);

        // An older attempt resolving while a newer one runs keeps `Syncing`.
        let latest = seq == self.started.get();
        match result {
            Ok(value) => {
                let status = if latest {
                    SyncStatus::Ready
                } else {
                    SyncStatus::Syncing
                };
                self.set_state.set(Synced {
                    value,
                    status,
                    error: None,
                });
            }
            Err(e) => {
                log::error!("{}: sync attempt #{seq} failed: {e:#}", self.name);
                let status = if latest {
                    SyncStatus::Failed
                } else {
                    SyncStatus::Syncing
                };
                let error = Rc::new(e);
                self.set_state.update(move |prev| Synced {
                    value: prev.value.clone(),
                    status,
                    error: Some(error),
                });
            }
        }
    }

    fn stop(&self) {
        self.stopped.set(true);
        drop(self.interval.borrow_mut().take());
        let in_flight = std::mem::take(&mut *self.in_flight.borrow_mut());
        for (seq, handle) in in_flight {
            log::trace!("{}: aborting sync attempt #{seq}", self.name);
            handle.abort();
        }
    }
}

/// Hook behind a synchronized provider.
///
/// `make_sync_fn` runs on every render; the cycle restarts only when `props`
/// changes, which cancels the previous interval and in-flight attempts first.
pub fn use_synchronized_state<P, S>(
    name: &'static str,
    props: &P,
    initial: impl FnOnce() -> S,
    make_sync_fn: impl FnOnce(&P) -> SyncFn<S>,
    repeat: Duration,
) -> Synced<S>
where
    P: PartialEq + Clone + 'static,
    S: Clone + 'static,
{
    let (state, set_state) = use_state(|| Synced::new(initial()));
    let sync_fn = make_sync_fn(props);
    disposable_effect(props.clone(), move || -> Dispose {
        let driver = SyncDriver::start(name, sync_fn, set_state, repeat);
        on_unmount(move || driver.stop())
    });
    state
}

pub struct SynchronizedContext<P: 'static, S: 'static> {
    context: Context<P, Synced<S>>,
}

impl<P: 'static, S: 'static> Clone for SynchronizedContext<P, S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

/// Creates a context broadcasting a state updated by a sync function.
///
/// Read outside a provider it yields `initial` with status `Uninitialized`.
pub fn create_synchronized_state_context<P, S>(
    name: &'static str,
    initial: S,
    make_sync_fn: impl Fn(&P) -> SyncFn<S> + 'static,
    repeat: Duration,
) -> SynchronizedContext<P, S>
where
    P: PartialEq + Clone + 'static,
    S: Clone + 'static,
{
    let init = initial.clone();
    let context = create_context(name, move |props: &P| {
        Provided::Ready(use_synchronized_state(
            name,
            props,
            || init.clone(),
            &make_sync_fn,
            repeat,
        ))
    })
    .with_default(Synced::new(initial));
    SynchronizedContext { context }
}

impl<P: 'static, S: Clone + 'static> SynchronizedContext<P, S> {
    pub fn context(&self) -> &Context<P, Synced<S>> {
        &self.context
    }

    pub fn provider(&self, props: &P, children: impl FnOnce() -> View) -> View {
        self.context.provider(props, children)
    }

    pub fn mock_provider(&self, mock: Synced<S>, children: impl FnOnce() -> View) -> View {
        self.context.mock_provider(mock, children)
    }

    pub fn use_value(&self) -> Result<Synced<S>, ContextError> {
        self.context.use_value()
    }

    pub fn use_status(&self) -> SyncStatus {
        self.context
            .try_use_value()
            .map_or(SyncStatus::Uninitialized, |s| s.status)
    }

    /// [`StatusRouter`] over this context's current status.
    pub fn status_router(&self, routes: StatusRoutes, children: impl FnOnce() -> View) -> View {
        StatusRouter(self.use_status(), routes, children)
    }
}

type Route = Box<dyn FnOnce() -> View>;

/// Views shown by [`StatusRouter`] while the value is not ready.
#[derive(Default)]
pub struct StatusRoutes {
    uninitialized: Option<Route>,
    syncing: Option<Route>,
    failed: Option<Route>,
}

impl StatusRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shown before the first attempt; falls back to the syncing view.
    pub fn uninitialized(mut self, view: impl FnOnce() -> View + 'static) -> Self {
        self.uninitialized = Some(Box::new(view));
        self
    }

    pub fn syncing(mut self, view: impl FnOnce() -> View + 'static) -> Self {
        self.syncing = Some(Box::new(view));
        self
    }

    pub fn failed(mut self, view: impl FnOnce() -> View + 'static) -> Self {
        self.failed = Some(Box::new(view));
        self
    }
}

/// Renders `children` once ready, otherwise the route for `status` (or nothing).
pub fn StatusRouter(
    status: SyncStatus,
    routes: StatusRoutes,
    children: impl FnOnce() -> View,
) -> View {
    let route = match status {
        SyncStatus::Ready => return children(),
        SyncStatus::Uninitialized => routes.uninitialized.or(routes.syncing),
        SyncStatus::Syncing => routes.syncing,
        SyncStatus::Failed => routes.failed,
    };
    route.map_or_else(View::empty, |view| view())
}
