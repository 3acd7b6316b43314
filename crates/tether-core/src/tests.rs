#[cfg(test)]
mod tests {
    use crate::clock::TestClock;
    use crate::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_locals_nested_and_default() {
        let plain: CompositionLocal<i32> = CompositionLocal::new("plain");
        let with_default = CompositionLocal::with_default("with_default", 7);

        assert_eq!(plain.current(), None);
        assert_eq!(with_default.current(), Some(7));

        plain.provide(1, || {
            assert_eq!(plain.current(), Some(1));
            // a local of the same type is not shadowed
            assert_eq!(with_default.current(), Some(7));
            plain.provide(2, || assert_eq!(plain.current(), Some(2)));
            assert_eq!(plain.current(), Some(1));
        });

        assert_eq!(plain.current(), None);
        assert_eq!(locals_depth(), 0);
    }

    #[test]
    fn test_locals_frame_popped_on_unwind() {
        let local: CompositionLocal<&'static str> = CompositionLocal::new("unwind");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            local.provide("inside", || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(local.current(), None);
        assert_eq!(locals_depth(), 0);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(Cell::new(false));

        let scope = Scope::new();
        let cleaned_up_clone = cleaned_up.clone();
        scope.add_disposer(move || cleaned_up_clone.set(true));

        assert!(!cleaned_up.get());
        scope.dispose();
        assert!(cleaned_up.get());
    }

    #[test]
    fn test_scope_runs_cleanups_newest_first_once() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scope = Scope::new();
        for i in 0..6 {
            let order = order.clone();
            scope.add_disposer(move || order.borrow_mut().push(i));
        }
        assert_eq!(scope.disposer_count(), 6);
        scope.dispose();
        scope.dispose();
        assert_eq!(*order.borrow(), [5, 4, 3, 2, 1, 0]);
        assert!(scope.is_disposed());

        // late registrations run right away
        let late = order.clone();
        scope.add_disposer(move || late.borrow_mut().push(9));
        assert_eq!(order.borrow().last(), Some(&9));
        assert_eq!(scope.disposer_count(), 0);
    }

    #[test]
    fn test_scope_restored_after_unwind() {
        let scope = Scope::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope.run(|| panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(current_scope().is_none());
    }

    #[test]
    fn test_dispose_runs_once() {
        let runs = Rc::new(Cell::new(0));
        let d = {
            let runs = runs.clone();
            on_unmount(move || runs.set(runs.get() + 1))
        };
        assert!(d.is_pending());
        d.run();
        d.clone().run();
        assert_eq!(runs.get(), 1);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_key_based_remember() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut composition = Composition::new({
            let seen = seen.clone();
            move || {
                let val1 = remember_with_key("test", || 42);
                let val2 = remember_with_key("test", || 100);
                seen.borrow_mut().push((*val1, *val2));
                View::empty()
            }
        });
        composition.render();
        composition.render();

        // Same instance: not 100, because the key exists
        assert_eq!(*seen.borrow(), [(42, 42), (42, 42)]);
    }

    #[test]
    fn test_positional_remember_is_stable_across_renders() {
        let mut composition = Composition::new(|| {
            let counter = remember(|| Cell::new(0));
            counter.set(counter.get() + 1);
            View::text(counter.get().to_string())
        });
        composition.render();
        composition.render();
        composition.render();
        assert_eq!(composition.view().texts(), ["3"]);
    }

    #[test]
    #[should_panic(expected = "called outside of a composition render")]
    fn test_remember_outside_render_panics() {
        let _ = remember(|| 1);
    }

    #[test]
    fn test_use_state_invalidates_and_settles() {
        init_logger();
        let setter_out = Rc::new(RefCell::new(None));
        let mut composition = Composition::new({
            let setter_out = setter_out.clone();
            move || {
                let (value, set_value) = use_state(|| 1);
                *setter_out.borrow_mut() = Some(set_value);
                View::text(value.to_string())
            }
        });
        assert_eq!(composition.settle(), 1);
        assert!(!composition.is_dirty());

        let set_value = setter_out.borrow().clone().unwrap();
        set_value.update(|v| v * 10);
        assert!(composition.is_dirty());
        composition.settle();
        assert_eq!(composition.view().texts(), ["10"]);
        assert_eq!(composition.render_count(), 2);

        set_value.apply(SetAction::Replace(5));
        composition.settle();
        assert_eq!(composition.view().texts(), ["5"]);
    }

    #[test]
    fn test_state_cell_setter_reads_current_value() {
        let cell = StateCell::new(vec![1]);
        let setter = cell.setter(None);
        setter.update(|v| {
            let mut v = v.clone();
            v.push(2);
            v
        });
        setter.modify(|v| (v.len() == 2).then(|| vec![v[0] + v[1]]));
        assert_eq!(cell.get(), [3]);
    }

    #[test]
    fn test_modify_none_keeps_value_and_does_not_invalidate() {
        let cell = StateCell::new(Rc::new(String::from("kept")));
        let before = cell.get();
        let mut composition = Composition::new(View::empty);
        composition.render();

        let setter = cell.setter(Some(composition.invalidator()));
        setter.modify(|_| None);

        assert!(Rc::ptr_eq(&before, &cell.get()));
        assert!(!composition.is_dirty());
    }

    #[test]
    fn test_decoy_setter_mutates_nothing() {
        init_logger();
        let setter: StateSetter<i32> = StateSetter::decoy("default test setter");
        setter.set(3);
        setter.update(|v| v + 1);
    }

    #[test]
    fn test_setter_after_cell_dropped_is_ignored() {
        let cell = StateCell::new(1);
        let setter = cell.setter(None);
        drop(cell);
        setter.set(2);
    }

    #[test]
    fn test_disposable_effect_runs_after_commit_and_cleans_up() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let key = Rc::new(Cell::new(1));
        let mut composition = Composition::new({
            let log = log.clone();
            let key = key.clone();
            move || {
                let k = key.get();
                let effect_log = log.clone();
                disposable_effect(k, move || {
                    effect_log.borrow_mut().push(format!("run {k}"));
                    let cleanup_log = effect_log.clone();
                    on_unmount(move || cleanup_log.borrow_mut().push(format!("cleanup {k}")))
                });
                log.borrow_mut().push(format!("render {k}"));
                View::empty()
            }
        });

        composition.render();
        composition.render();
        key.set(2);
        composition.render();
        composition.dispose();

        assert_eq!(
            *log.borrow(),
            [
                "render 1",
                "run 1",
                "render 1",
                "render 2",
                "cleanup 1",
                "run 2",
                "cleanup 2"
            ]
        );
    }

    #[test]
    fn test_side_effect_sees_committed_render() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut composition = Composition::new({
            let order = order.clone();
            move || {
                let after = order.clone();
                side_effect(move || after.borrow_mut().push("effect"));
                order.borrow_mut().push("render");
                View::empty()
            }
        });
        composition.render();
        composition.render();
        assert_eq!(*order.borrow(), ["render", "effect", "render", "effect"]);
    }

    #[test]
    fn test_settle_is_bounded() {
        init_logger();
        let mut composition = Composition::with_config(
            || {
                invalidator().invalidate();
                View::empty()
            },
            CompositionConfig {
                max_settle_passes: 4,
            },
        );
        assert_eq!(composition.settle(), 4);
        assert!(composition.is_dirty());
    }

    #[test]
    fn test_invalidator_dead_after_dispose() {
        let mut composition = Composition::new(View::empty);
        composition.render();
        let handle = composition.invalidator();
        assert!(handle.is_alive());
        composition.dispose();
        assert!(!handle.is_alive());
        assert!(!handle.invalidate());
        assert!(composition.view().is_empty());
    }

    #[test]
    fn test_interval_fires_once_per_period() {
        let clock = TestClock::new().install();
        let fired = Rc::new(Cell::new(0));
        let handle = {
            let fired = fired.clone();
            set_interval(Duration::from_millis(100), move || fired.set(fired.get() + 1))
        };

        assert_eq!(run_due_timers(), 0);
        clock.advance(Duration::from_millis(99));
        assert_eq!(run_due_timers(), 0);
        clock.advance(Duration::from_millis(1));
        assert_eq!(run_due_timers(), 1);
        clock.advance(Duration::from_millis(350));
        assert_eq!(run_due_timers(), 3);
        assert_eq!(fired.get(), 4);

        drop(handle);
        assert_eq!(pending_timers(), 0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(run_due_timers(), 0);
        assert_eq!(fired.get(), 4);
    }

    #[test]
    fn test_interval_can_cancel_itself() {
        let clock = TestClock::new().install();
        let slot: Rc<RefCell<Option<IntervalHandle>>> = Rc::new(RefCell::new(None));
        let fired = Rc::new(Cell::new(0));
        let handle = {
            let slot = slot.clone();
            let fired = fired.clone();
            set_interval(Duration::from_millis(10), move || {
                fired.set(fired.get() + 1);
                slot.borrow_mut().take();
            })
        };
        *slot.borrow_mut() = Some(handle);

        clock.advance(Duration::from_millis(50));
        assert_eq!(run_due_timers(), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(pending_timers(), 0);
    }

    #[test]
    fn test_spawn_local_without_pool_fails() {
        assert!(matches!(spawn_local(async {}), Err(CoreError::NoTaskPool)));
    }

    #[test]
    fn test_task_pool_runs_spawned_futures() {
        let mut pool = TaskPool::new();
        let done = Rc::new(Cell::new(false));
        let (tx, rx) = futures::channel::oneshot::channel::<u32>();
        {
            let done = done.clone();
            spawn_local(async move {
                if rx.await == Ok(9) {
                    done.set(true);
                }
            })
            .unwrap();
        }
        pool.run_until_stalled();
        assert!(!done.get());
        tx.send(9).unwrap();
        pool.run_until_stalled();
        assert!(done.get());

        drop(pool);
        assert!(spawn_local(async {}).is_err());
    }

    #[test]
    fn test_scheduler_drives_timers_tasks_and_renders() {
        init_logger();
        let clock = TestClock::new().install();
        let mut scheduler = Scheduler::new();
        let cleaned = Rc::new(Cell::new(false));

        let id = scheduler.mount({
            let cleaned = cleaned.clone();
            move || {
                let (ticks, set_ticks) = use_state(|| 0u32);
                let cleaned = cleaned.clone();
                disposable_effect((), move || {
                    let interval = set_interval(Duration::from_secs(1), move || {
                        let set_ticks = set_ticks.clone();
                        spawn_local(async move { set_ticks.update(|t| t + 1) }).unwrap();
                    });
                    on_unmount(move || {
                        drop(interval);
                        cleaned.set(true);
                    })
                });
                View::text(ticks.to_string())
            }
        });
        assert_eq!(scheduler.view(id).unwrap().texts(), ["0"]);

        clock.advance(Duration::from_secs(2));
        scheduler.tick();
        assert_eq!(scheduler.view(id).unwrap().texts(), ["2"]);
        assert_eq!(scheduler.render_count(id), 2);

        assert!(scheduler.unmount(id));
        assert!(cleaned.get());
        assert_eq!(pending_timers(), 0);
        assert!(!scheduler.unmount(id));
        assert!(scheduler.view(id).is_none());
    }

    #[test]
    fn test_view_helpers() {
        let v = View::group(vec![View::empty(), "a".into(), View::group(vec!["b".into()])]);
        assert!(!v.is_empty());
        assert_eq!(v.texts(), ["a", "b"]);
        assert!(View::group(vec![View::empty()]).is_empty());
    }
}
