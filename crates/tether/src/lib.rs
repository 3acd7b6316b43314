#![allow(non_snake_case)]
//! Typed contexts, derived state, value filters and render hooks.
//!
//! Everything here is a thin layer over `tether-core`:
//!
//! - [`adapter`]: project a child `(value, setter)` pair out of a parent one.
//! - [`context`]: context factories with mock providers and a missing-provider
//!   guard; broadcast and state specializations.
//! - [`sync`]: contexts kept current by an async sync function, with an
//!   optional repeat period, and the [`StatusRouter`] component.
//! - [`filters`]: render children only when a value is present/absent.
//! - [`hooks`]: previous value, value changed, bounded render-again.
//!
//! ```rust
//! use tether::*;
//! use tether_core::*;
//!
//! let theme = create_state_context("theme", "dark".to_string());
//!
//! let mut composition = Composition::new(move || {
//!     let theme = theme.clone();
//!     theme.clone().provider(&(), move || {
//!         let (current, set_theme) = theme.use_value().unwrap();
//!         if current == "dark" {
//!             set_theme.set("light".to_string());
//!         }
//!         View::text(current)
//!     })
//! });
//! composition.settle();
//! assert_eq!(composition.view().texts(), ["light"]);
//! ```

pub mod adapter;
pub mod context;
pub mod error;
pub mod filters;
pub mod hooks;
pub mod sync;

pub use adapter::*;
pub use context::*;
pub use error::*;
pub use filters::*;
pub use hooks::*;
pub use sync::*;
