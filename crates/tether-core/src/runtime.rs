use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use crate::scope::Scope;
use crate::task::TaskPool;
use crate::timer;
use crate::view::View;

thread_local! {
    static CURRENT: RefCell<Option<Rc<CompositionInner>>> = const { RefCell::new(None) };
}

#[derive(Default)]
pub struct Composer {
    pub slots: Vec<Box<dyn Any>>,
    pub cursor: usize,
    pub keyed_slots: HashMap<String, Box<dyn Any>>,
}

#[derive(Clone, Copy, Debug)]
pub struct CompositionConfig {
    /// Upper bound on back-to-back renders in `settle` before giving up on a
    /// composition that keeps invalidating itself.
    pub max_settle_passes: usize,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            max_settle_passes: 32,
        }
    }
}

struct CompositionInner {
    composer: RefCell<Composer>,
    scope: Scope,
    dirty: Cell<bool>,
    disposed: Cell<bool>,
    renders: Cell<u64>,
    commit_queue: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Makes `inner` the current composition for the guard's lifetime.
struct RenderGuard {
    prev: Option<Rc<CompositionInner>>,
}

impl RenderGuard {
    fn enter(inner: &Rc<CompositionInner>) -> Self {
        let prev = CURRENT.with(|c| c.borrow_mut().replace(inner.clone()));
        RenderGuard { prev }
    }
}

impl Drop for RenderGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT.with(|c| *c.borrow_mut() = prev);
    }
}

fn with_current<R>(api: &str, f: impl FnOnce(&Rc<CompositionInner>) -> R) -> R {
    let inner = CURRENT.with(|c| c.borrow().clone());
    match inner {
        Some(inner) => f(&inner),
        None => panic!("`{api}` called outside of a composition render"),
    }
}

/// A mounted root component: its slots, its scope and its last output.
pub struct Composition {
    inner: Rc<CompositionInner>,
    root: Box<dyn FnMut() -> View>,
    config: CompositionConfig,
    last_view: View,
}

impl Composition {
    pub fn new(root: impl FnMut() -> View + 'static) -> Self {
        Self::with_config(root, CompositionConfig::default())
    }

    pub fn with_config(root: impl FnMut() -> View + 'static, config: CompositionConfig) -> Self {
        Self {
            inner: Rc::new(CompositionInner {
                composer: RefCell::new(Composer::default()),
                scope: Scope::new(),
                dirty: Cell::new(true),
                disposed: Cell::new(false),
                renders: Cell::new(0),
                commit_queue: RefCell::new(Vec::new()),
            }),
            root: Box::new(root),
            config,
            last_view: View::empty(),
        }
    }

    /// Runs one render pass followed by the commit phase.
    pub fn render(&mut self) -> &View {
        if self.inner.disposed.get() {
            log::warn!("render: composition is disposed; keeping last view.");
            return &self.last_view;
        }
        self.inner.dirty.set(false);
        self.inner.composer.borrow_mut().cursor = 0;

        let view = {
            let _guard = RenderGuard::enter(&self.inner);
            let root = &mut self.root;
            self.inner.scope.run(|| root())
        };
        self.inner.renders.set(self.inner.renders.get() + 1);
        self.last_view = view;
        self.commit();
        &self.last_view
    }

    fn commit(&self) {
        loop {
            let batch = std::mem::take(&mut *self.inner.commit_queue.borrow_mut());
            if batch.is_empty() {
                break;
            }
            for f in batch {
                f();
            }
        }
    }

    /// Renders until the composition stops invalidating itself; returns the
    /// number of passes run.
    pub fn settle(&mut self) -> usize {
        let mut passes = 0;
        while self.is_dirty() {
            if passes == self.config.max_settle_passes {
                log::warn!(
                    "settle: composition still dirty after {passes} passes; deferring to the next tick."
                );
                break;
            }
            self.render();
            passes += 1;
        }
        passes
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get() && !self.inner.disposed.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn render_count(&self) -> u64 {
        self.inner.renders.get()
    }

    pub fn view(&self) -> &View {
        &self.last_view
    }

    pub fn invalidator(&self) -> Invalidator {
        Invalidator(Rc::downgrade(&self.inner))
    }

    /// Runs every cleanup registered in the composition's scope and drops its
    /// slots. Idempotent.
    pub fn dispose(&mut self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.commit_queue.borrow_mut().clear();
        self.inner.scope.dispose();
        let composer = std::mem::take(&mut *self.inner.composer.borrow_mut());
        drop(composer);
        self.last_view = View::empty();
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Weak handle that schedules a re-render of its composition.
#[derive(Clone)]
pub struct Invalidator(Weak<CompositionInner>);

impl Invalidator {
    /// Marks the composition dirty. Returns false if it is gone.
    pub fn invalidate(&self) -> bool {
        match self.0.upgrade() {
            Some(inner) if !inner.disposed.get() => {
                if !inner.dirty.replace(true) {
                    log::trace!("composition invalidated");
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.0
            .upgrade()
            .is_some_and(|inner| !inner.disposed.get())
    }
}

/// Handle to the composition currently rendering.
pub fn invalidator() -> Invalidator {
    with_current("invalidator", |inner| Invalidator(Rc::downgrade(inner)))
}

/// Queues `f` to run after the current render commits.
pub fn after_commit(f: impl FnOnce() + 'static) {
    with_current("after_commit", |inner| {
        inner.commit_queue.borrow_mut().push(Box::new(f))
    })
}

/// Slot-based remember (sequential composition only)
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    with_current("remember", |inner| {
        let mut c = inner.composer.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;

        if cursor >= c.slots.len() {
            let rc: Rc<T> = Rc::new(init());
            c.slots.push(Box::new(rc.clone()));
            return rc;
        }

        if let Some(rc) = c.slots[cursor].downcast_ref::<Rc<T>>() {
            rc.clone()
        } else {
            // replace (else panics)
            log::warn!(
                "remember: slot {} type changed; replacing. \
                 If this is due to conditional composition, prefer remember_with_key.",
                cursor
            );
            let rc: Rc<T> = Rc::new(init());
            c.slots[cursor] = Box::new(rc.clone());
            rc
        }
    })
}

/// Key-based remember
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    with_current("remember_with_key", |inner| {
        let mut c = inner.composer.borrow_mut();
        let key = key.into();

        if let Some(existing) = c.keyed_slots.get(&key) {
            if let Some(rc) = existing.downcast_ref::<Rc<T>>() {
                return rc.clone();
            } else {
                log::warn!(
                    "remember_with_key: key '{}' reused with a different type; replacing.",
                    key
                );
            }
        }

        let rc: Rc<T> = Rc::new(init());
        c.keyed_slots.insert(key, Box::new(rc.clone()));
        rc
    })
}

slotmap::new_key_type! {
    pub struct CompositionId;
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Upper bound on timer/task/render rounds in a single `tick`.
    pub max_tick_rounds: usize,
    pub composition: CompositionConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_tick_rounds: 64,
            composition: CompositionConfig::default(),
        }
    }
}

/// Host loop: owns mounted compositions and the thread's task pool.
///
/// A tick fires due timers, polls spawned tasks until they stall and
/// re-renders dirty compositions, repeating until a round does nothing.
pub struct Scheduler {
    compositions: SlotMap<CompositionId, Composition>,
    tasks: TaskPool,
    config: SchedulerConfig,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            compositions: SlotMap::with_key(),
            tasks: TaskPool::new(),
            config,
        }
    }

    /// Mounts `root` and renders it until it settles.
    pub fn mount(&mut self, root: impl FnMut() -> View + 'static) -> CompositionId {
        let mut composition = Composition::with_config(root, self.config.composition);
        composition.settle();
        let id = self.compositions.insert(composition);
        log::debug!("mounted composition {id:?}");
        id
    }

    /// Disposes the composition, running its cleanups. Returns false if the
    /// id is unknown.
    pub fn unmount(&mut self, id: CompositionId) -> bool {
        match self.compositions.remove(id) {
            Some(mut composition) => {
                composition.dispose();
                log::debug!("unmounted composition {id:?}");
                true
            }
            None => false,
        }
    }

    pub fn composition(&self, id: CompositionId) -> Option<&Composition> {
        self.compositions.get(id)
    }

    pub fn view(&self, id: CompositionId) -> Option<&View> {
        self.compositions.get(id).map(Composition::view)
    }

    pub fn render_count(&self, id: CompositionId) -> u64 {
        self.compositions
            .get(id)
            .map_or(0, Composition::render_count)
    }

    /// Returns the number of rounds that did work.
    pub fn tick(&mut self) -> usize {
        let mut rounds = 0;
        while rounds < self.config.max_tick_rounds {
            let fired = timer::run_due_timers();
            self.tasks.run_until_stalled();
            let mut rendered = 0;
            for (_, composition) in self.compositions.iter_mut() {
                rendered += composition.settle();
            }
            if fired == 0 && rendered == 0 {
                return rounds;
            }
            rounds += 1;
        }
        log::warn!("tick: still busy after {rounds} rounds; yielding.");
        rounds
    }
}
