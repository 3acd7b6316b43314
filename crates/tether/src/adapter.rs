//! Derived child state.
//!
//! A [`ValueAdapter`] describes how a child value lives inside a parent value.
//! Projecting a parent `(value, setter)` pair through it gives a child pair
//! whose setter writes back into the parent:
//!
//! ```rust
//! use tether::ValueAdapter;
//! use tether_core::StateCell;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Form { name: String, age: u32 }
//!
//! let age = ValueAdapter::new(
//!     |f: &Form| f.age,
//!     |f: &Form, age| Form { age, ..f.clone() },
//! );
//!
//! let parent = StateCell::new(Form { name: "ada".into(), age: 36 });
//! let (current, set_age) = age.project((parent.get(), parent.setter(None)));
//! assert_eq!(current, 36);
//!
//! set_age.update(|a| a + 1);
//! assert_eq!(parent.get().age, 37);
//! ```

use std::rc::Rc;

use tether_core::StateSetter;

/// `(extract, inject, equals)` for a child value `C` inside a parent `P`.
///
/// `inject` must build a new parent such that `extract(&inject(p, c)) == c`.
pub struct ValueAdapter<P: 'static, C: 'static> {
    extract: Rc<dyn Fn(&P) -> C>,
    inject: Rc<dyn Fn(&P, C) -> P>,
    equals: Rc<dyn Fn(&C, &C) -> bool>,
}

impl<P: 'static, C: 'static> Clone for ValueAdapter<P, C> {
    fn clone(&self) -> Self {
        Self {
            extract: self.extract.clone(),
            inject: self.inject.clone(),
            equals: self.equals.clone(),
        }
    }
}

impl<P: 'static, C: PartialEq + 'static> ValueAdapter<P, C> {
    pub fn new(
        extract: impl Fn(&P) -> C + 'static,
        inject: impl Fn(&P, C) -> P + 'static,
    ) -> Self {
        Self::with_equality(extract, inject, |a: &C, b: &C| a == b)
    }
}

impl<P: 'static, C: 'static> ValueAdapter<P, C> {
    pub fn with_equality(
        extract: impl Fn(&P) -> C + 'static,
        inject: impl Fn(&P, C) -> P + 'static,
        equals: impl Fn(&C, &C) -> bool + 'static,
    ) -> Self {
        Self {
            extract: Rc::new(extract),
            inject: Rc::new(inject),
            equals: Rc::new(equals),
        }
    }

    /// Replaces the equality predicate.
    pub fn equals_by(mut self, equals: impl Fn(&C, &C) -> bool + 'static) -> Self {
        self.equals = Rc::new(equals);
        self
    }

    pub fn extract(&self, parent: &P) -> C {
        (self.extract)(parent)
    }

    pub fn inject(&self, parent: &P, child: C) -> P {
        (self.inject)(parent, child)
    }

    pub fn equals(&self, a: &C, b: &C) -> bool {
        (self.equals)(a, b)
    }

    /// Child setter writing through `parent`.
    ///
    /// The next child value is resolved against the parent value current at
    /// write time. If it equals the current child value the parent is left
    /// untouched and no re-render is scheduled.
    pub fn child_setter(&self, parent: StateSetter<P>) -> StateSetter<C> {
        let adapter = self.clone();
        StateSetter::from_fn(move |f| {
            let adapter = adapter.clone();
            parent.modify(move |current_parent| {
                let current = adapter.extract(current_parent);
                let next = f(&current)?;
                if adapter.equals(&next, &current) {
                    None
                } else {
                    Some(adapter.inject(current_parent, next))
                }
            })
        })
    }

    pub fn project(&self, (parent, set_parent): (P, StateSetter<P>)) -> (C, StateSetter<C>) {
        (self.extract(&parent), self.child_setter(set_parent))
    }
}

/// Turns a parent-state hook into a child-state hook.
pub fn create_child_state<P, C>(
    use_parent: impl Fn() -> (P, StateSetter<P>) + 'static,
    adapter: ValueAdapter<P, C>,
) -> impl Fn() -> (C, StateSetter<C>)
where
    P: 'static,
    C: 'static,
{
    move || adapter.project(use_parent())
}
