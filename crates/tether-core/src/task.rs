use std::cell::RefCell;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::error::CoreError;

thread_local! {
    static SPAWNER: RefCell<Option<LocalSpawner>> = const { RefCell::new(None) };
}

/// Single-threaded executor for futures spawned by effects.
///
/// While a pool is alive its spawner is installed for the current thread, so
/// [`spawn_local`] reaches it without threading a handle through every
/// component. Dropping the pool drops every unfinished task and restores the
/// previously installed spawner.
pub struct TaskPool {
    pool: LocalPool,
    previous: Option<LocalSpawner>,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskPool {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let previous = SPAWNER.with(|s| s.borrow_mut().replace(pool.spawner()));
        Self { pool, previous }
    }

    /// Polls every task until none can make progress.
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Polls at most one task; returns false if nothing was ready.
    pub fn try_run_one(&mut self) -> bool {
        self.pool.try_run_one()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let _ = SPAWNER.try_with(|s| *s.borrow_mut() = previous);
    }
}

/// Spawns `fut` on the thread's installed [`TaskPool`].
pub fn spawn_local(fut: impl Future<Output = ()> + 'static) -> Result<(), CoreError> {
    SPAWNER.with(|s| match s.borrow().as_ref() {
        Some(spawner) => spawner.spawn_local(fut).map_err(CoreError::from),
        None => Err(CoreError::NoTaskPool),
    })
}
