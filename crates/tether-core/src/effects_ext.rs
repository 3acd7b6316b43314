use std::cell::RefCell;
use std::rc::Rc;

use crate::{Dispose, after_commit, on_unmount, remember, scoped_effect};

/// Per-callsite bookkeeping of a `disposable_effect`.
struct KeyedEffect<K> {
    key: RefCell<Option<K>>,
    cleanup: RefCell<Option<Dispose>>,
}

impl<K> KeyedEffect<K> {
    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }
}

/// Runs `effect` after the commit of the first render and again after every
/// commit where `key` changed. The previous cleanup runs before each re-run,
/// and the last one runs when the composition is disposed.
///
/// Slots are positional: keep the call unconditional.
pub fn disposable_effect<K: PartialEq + Clone + 'static>(
    key: K,
    effect: impl FnOnce() -> Dispose + 'static,
) {
    let mut first = false;
    let state = remember(|| {
        first = true;
        KeyedEffect {
            key: RefCell::new(None::<K>),
            cleanup: RefCell::new(None),
        }
    });

    if first {
        let state = Rc::downgrade(&state);
        scoped_effect(move || {
            on_unmount(move || {
                if let Some(state) = state.upgrade() {
                    state.run_cleanup();
                }
            })
        });
    }

    if state.key.borrow().as_ref() == Some(&key) {
        return;
    }
    *state.key.borrow_mut() = Some(key);
    after_commit(move || {
        state.run_cleanup();
        let cleanup = effect();
        *state.cleanup.borrow_mut() = Some(cleanup);
    });
}

/// Runs `effect` after the current render commits.
pub fn side_effect(effect: impl FnOnce() + 'static) {
    after_commit(effect);
}
