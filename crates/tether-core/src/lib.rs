//! # Compositions, State, and Effects
//!
//! Tether's host runtime is a small, single-threaded model of a component
//! tree. There are four main pieces:
//!
//! - `Composition`: a mounted root component with its own slots and scope.
//! - `remember*` / `use_state`: lifecycle-aware storage bound to a composition.
//! - `disposable_effect` / `side_effect`: commit-phase side-effects with cleanup.
//! - `CompositionLocal<T>`: values scoped to a provider closure.
//!
//! ## Rendering
//!
//! A component is a plain function returning a `View`. Rendering runs the
//! root function once, then runs every effect queued during that pass (the
//! commit phase):
//!
//! ```rust
//! use tether_core::*;
//!
//! let mut composition = Composition::new(|| {
//!     let (name, _set_name) = use_state(|| "tether".to_string());
//!     View::text(name)
//! });
//! composition.render();
//! assert_eq!(composition.view().texts(), ["tether"]);
//! ```
//!
//! - `remember` and `use_state` are order-based: the Nth call in a render
//!   always refers to the Nth stored value.
//! - `remember_with_key` is key-based and stable across conditional branches.
//! - Calling any of them outside a render is a programming error and panics.
//!
//! ## Effects and cleanup
//!
//! ```rust
//! use tether_core::*;
//!
//! let mut composition = Composition::new(|| {
//!     disposable_effect((), || {
//!         log::info!("mounted");
//!         on_unmount(|| log::info!("unmounted"))
//!     });
//!     View::empty()
//! });
//! composition.render();
//! composition.dispose();
//! ```
//!
//! ## Time and async work
//!
//! Timers (`set_interval`) read the thread clock (`clock::now`), which tests
//! replace with a `TestClock`. Futures are spawned with `spawn_local` onto the
//! thread's `TaskPool`. The `Scheduler` ties it together: each `tick` fires
//! due timers, polls tasks until they stall and re-renders dirty compositions.

pub mod clock;
pub mod effects;
pub mod effects_ext;
pub mod error;
pub mod locals;
pub mod runtime;
pub mod scope;
pub mod state;
pub mod task;
pub mod tests;
pub mod timer;
pub mod view;

pub use clock::{Clock, SystemClock, TestClock};
pub use effects::*;
pub use effects_ext::*;
pub use error::*;
pub use locals::*;
pub use runtime::*;
pub use scope::*;
pub use state::*;
pub use task::*;
pub use timer::*;
pub use view::*;

pub use web_time::{Duration, Instant};
