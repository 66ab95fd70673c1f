//! # lambars-optics
//!
//! A combinator runtime for composable, immutable optics.
//!
//! ## Overview
//!
//! Optics are first-class accessors that read and rebuild parts of immutable
//! data. This crate provides:
//!
//! - **Primitive optics**: lenses, getters, isos, prisms and traversals
//!   built from closures or the `lens!`, `iso!` and `prism!` macros
//! - **Derivation**: an optic supplies only the operations natural to it and
//!   the rest of the contract is derived from them
//! - **Composition**: capability-aware sequential composition with index
//!   selection
//! - **Combinators**: positional and predicate windows, ordering, reversal
//!   and error recovery
//! - **Diagnostics**: every optic carries an expression tree, and every error
//!   carries the path of nodes it crossed
//! - **Cancellation**: a [`Context`](optics::Context) observed throughout
//!   iteration and modification
//! - **Delegation**: a [`Handler`](optics::Handler) attached to a leaf
//!   receives whole actions as expression trees instead of native execution
//!
//! ## Feature Flags
//!
//! - `laws`: the [`laws`] verification harness (enabled by default)
//! - `serde`: `Serialize`/`Deserialize` for expression trees and kinds
//! - `full`: enable all features
//!
//! ## Example
//!
//! ```rust
//! use lambars_optics::prelude::*;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Order {
//!     lines: Vec<u32>,
//! }
//!
//! let context = Context::background();
//! let lines = lens!(Order, lines).compose(traverse_vec::<u32>());
//! let cheapest_first = ordered(lines, Comparator::natural());
//!
//! let order = Order { lines: vec![30, 10, 20] };
//! assert_eq!(cheapest_first.values(&context, &order).unwrap(), vec![10, 20, 30]);
//! assert_eq!(action::first(&context, &cheapest_first, &order).unwrap(), Some(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports the optic types, constructors, combinators and macros, plus
/// the [`action`] module.
///
/// # Usage
///
/// ```rust
/// use lambars_optics::prelude::*;
/// ```
pub mod prelude {
    pub use crate::action;
    pub use crate::optics::*;
    pub use crate::{iso, lens, prism};
}

pub mod action;
#[cfg(feature = "laws")]
pub mod laws;
pub mod optics;
