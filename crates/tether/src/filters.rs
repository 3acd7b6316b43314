//! Components that render their children only when a value passes a check.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tether_core::View;

/// Whether a value counts as "there".
///
/// Absent: `None`, `false`, numeric zero, `NaN`, the empty string and `()`.
/// Everything else is present, including empty collections and structs.
/// `Option`, references and smart pointers delegate to their contents.
///
/// Your own types opt in with an impl; a plain struct is always present:
///
/// ```rust
/// use tether::Presence;
///
/// struct Session {
///     user: String,
/// }
///
/// impl Presence for Session {
///     fn is_present(&self) -> bool {
///         true
///     }
/// }
///
/// assert!(Session { user: String::new() }.is_present());
/// assert!(!None::<Session>.is_present());
/// ```
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for bool {
    fn is_present(&self) -> bool {
        *self
    }
}

impl Presence for () {
    fn is_present(&self) -> bool {
        false
    }
}

macro_rules! int_presence {
    ($($t:ty),*) => {
        $(impl Presence for $t {
            fn is_present(&self) -> bool {
                *self != 0
            }
        })*
    };
}

int_presence!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Presence for f32 {
    fn is_present(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Presence for f64 {
    fn is_present(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        true
    }
}

impl<K, V, H> Presence for HashMap<K, V, H> {
    fn is_present(&self) -> bool {
        true
    }
}

impl<K, V> Presence for BTreeMap<K, V> {
    fn is_present(&self) -> bool {
        true
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl<T: Presence + ?Sized> Presence for Box<T> {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

impl<T: Presence + ?Sized> Presence for Rc<T> {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

/// Renders children only while `predicate(read_value())` holds.
pub struct ValueFilter<V: 'static> {
    read_value: Rc<dyn Fn() -> V>,
    predicate: Rc<dyn Fn(&V) -> bool>,
}

impl<V: 'static> Clone for ValueFilter<V> {
    fn clone(&self) -> Self {
        Self {
            read_value: self.read_value.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<V: 'static> ValueFilter<V> {
    /// Reads the value and evaluates the predicate again on every call.
    pub fn passes(&self) -> bool {
        let value = (self.read_value)();
        (self.predicate)(&value)
    }

    /// `children` is only invoked when the filter passes.
    pub fn render(&self, children: impl FnOnce() -> View) -> View {
        if self.passes() {
            children()
        } else {
            View::empty()
        }
    }
}

pub fn create_value_filter<V: 'static>(
    read_value: impl Fn() -> V + 'static,
    predicate: impl Fn(&V) -> bool + 'static,
) -> ValueFilter<V> {
    ValueFilter {
        read_value: Rc::new(read_value),
        predicate: Rc::new(predicate),
    }
}

/// Renders children when the value is absent.
pub fn create_missing_value_filter<V: Presence + 'static>(
    read_value: impl Fn() -> V + 'static,
) -> ValueFilter<V> {
    create_value_filter(read_value, |v: &V| !v.is_present())
}

/// Renders children when the value is present.
pub fn create_existing_value_filter<V: Presence + 'static>(
    read_value: impl Fn() -> V + 'static,
) -> ValueFilter<V> {
    create_value_filter(read_value, |v: &V| v.is_present())
}
