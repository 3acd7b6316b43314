//! Context factories.
//!
//! A [`Context`] pairs a composition local with the function that computes
//! its value from provider props. Consumers read it with
//! [`Context::use_value`]; tests swap the computation out with
//! [`Context::mock_provider`].
//!
//! ```rust
//! use tether::*;
//! use tether_core::*;
//!
//! let greeting = create_context("greeting", |name: &String| {
//!     Provided::Ready(format!("hello {name}"))
//! });
//!
//! let view = greeting.provider(&"ada".to_string(), || {
//!     View::text(greeting.use_value().unwrap())
//! });
//! assert_eq!(view.texts(), ["hello ada"]);
//! assert!(greeting.use_value().is_err());
//! ```

use std::rc::Rc;

use tether_core::{CompositionLocal, StateSetter, View, use_state};

use crate::error::ContextError;

/// Result of a value provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provided<V> {
    Ready(V),
    /// The value cannot be produced yet; the provider renders nothing this
    /// pass and is asked again on the next one.
    Suspended,
}

impl<V> From<V> for Provided<V> {
    fn from(value: V) -> Self {
        Provided::Ready(value)
    }
}

pub struct Context<P: 'static, V: 'static> {
    local: CompositionLocal<V>,
    value_provider: Rc<dyn Fn(&P) -> Provided<V>>,
}

impl<P: 'static, V: 'static> Clone for Context<P, V> {
    fn clone(&self) -> Self {
        Self {
            local: self.local.clone(),
            value_provider: self.value_provider.clone(),
        }
    }
}

/// Creates a context whose provider computes its value from props `P`.
///
/// `value_provider` runs inside the provider's render, so it may call slot
/// APIs such as `use_state`.
pub fn create_context<P: 'static, V: 'static>(
    name: &'static str,
    value_provider: impl Fn(&P) -> Provided<V> + 'static,
) -> Context<P, V> {
    Context {
        local: CompositionLocal::new(name),
        value_provider: Rc::new(value_provider),
    }
}

/// Creates a context broadcasting its props as value.
pub fn create_broadcast_context<V: Clone + 'static>(name: &'static str) -> Context<V, V> {
    create_context(name, |value: &V| Provided::Ready(value.clone()))
}

/// `(value, setter)` broadcast by a state context.
pub type StateHandle<T> = (T, StateSetter<T>);

pub type StateContext<T> = Context<(), StateHandle<T>>;

/// Creates a context broadcasting a state pair owned by each provider.
///
/// Read outside a provider it yields `initial` with a setter that only logs.
pub fn create_state_context<T: Clone + 'static>(name: &'static str, initial: T) -> StateContext<T> {
    let init = initial.clone();
    create_context(name, move |_: &()| {
        let init = init.clone();
        Provided::Ready(use_state(move || init))
    })
    .with_default((initial, StateSetter::decoy(format!("default {name} setter"))))
}

impl<P: 'static, V: 'static> Context<P, V> {
    /// Value read when no provider is mounted above the reader.
    pub fn with_default(mut self, default: V) -> Self {
        self.local.set_default(default);
        self
    }

    pub fn name(&self) -> &'static str {
        self.local.name()
    }

    pub fn provider(&self, props: &P, children: impl FnOnce() -> View) -> View {
        match (self.value_provider)(props) {
            Provided::Ready(value) => self.local.provide(value, children),
            Provided::Suspended => {
                log::debug!("{} provider suspended; rendering nothing", self.name());
                View::empty()
            }
        }
    }

    /// Publishes `mock` without running the value provider.
    pub fn mock_provider(&self, mock: V, children: impl FnOnce() -> View) -> View {
        self.local.provide(mock, children)
    }

    pub fn try_use_value(&self) -> Option<V>
    where
        V: Clone,
    {
        self.local.current()
    }

    pub fn use_value(&self) -> Result<V, ContextError>
    where
        V: Clone,
    {
        self.try_use_value()
            .ok_or(ContextError::MissingProvider {
                context: self.name(),
            })
    }
}
