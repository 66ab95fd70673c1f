//! Composable, immutable optics.
//!
//! An [`Optic<I, S, A>`] focuses zero or more values of type `A` inside a
//! source of type `S`, each paired with an index of type `I`. Every optic
//! exposes the same eight-operation contract:
//!
//! | Operation      | Meaning                                            |
//! |----------------|----------------------------------------------------|
//! | `get`          | the single focus                                   |
//! | `set`          | replace every focus                                |
//! | `iterate`      | stream every focus with its index                  |
//! | `length`       | count the foci                                     |
//! | `modify`       | rebuild the source with a mapper                   |
//! | `indexed_get`  | stream the foci whose index matches                |
//! | `index_eq`     | compare two indices                                |
//! | `reverse_get`  | build a source from a focus                        |
//!
//! An optic is built from whichever primitives are natural for it (see
//! [`OpticBuilder`]); the remaining operations are derived. Which of them are
//! available depends on the optic's [`OpticKind`].
//!
//! # Kinds
//!
//! ```text
//! Iso <: Lens  <: Getter    <: Iteration
//! Iso <: Prism <: Traversal <: Iteration
//!        Lens  <: Traversal
//! ```
//!
//! # Examples
//!
//! ```
//! use lambars_optics::lens;
//! use lambars_optics::optics::{Context, Predicate, filtered, taking, traverse_vec};
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Basket {
//!     items: Vec<i32>,
//! }
//!
//! let large = Predicate::new("large", |x: &i32| *x > 2);
//! let optic = lens!(Basket, items).compose(taking(filtered(traverse_vec::<i32>(), large), 2));
//! let context = Context::background();
//!
//! let basket = Basket { items: vec![5, 3, 8, 1] };
//! assert_eq!(optic.values(&context, &basket).unwrap(), vec![5, 3]);
//! assert_eq!(
//!     optic.modify_all(&context, &basket, |x| x * 10).unwrap(),
//!     Basket { items: vec![50, 30, 8, 1] },
//! );
//! assert_eq!(
//!     optic.expr().to_string(),
//!     "Compose(Basket.items, Taking[2](Filtered(Vec, Predicate[large])))",
//! );
//! ```

mod builder;
mod compose;
mod context;
mod error;
mod expr;
mod getter;
mod handler;
mod iso;
mod kind;
mod lens;
mod optic;
mod ordered;
mod predicate;
mod prism;
mod recover;
mod traversal;
mod value;
mod window;

pub use builder::OpticBuilder;
pub use context::{CancelHandle, Context};
pub use error::{ERROR_PATH_HEADER, ErrorKind, ErrorPath, Operation, OpticError, ProtocolViolation};
pub use expr::{Expr, ExprKind};
pub use getter::{getter, try_getter};
pub use handler::{DynMapper, DynValue, Handler, merge_handlers};
pub use iso::{identity, iso};
pub use kind::{Arity, Capabilities, Direction, Mutability, OpticKind};
pub use lens::{lens, try_lens};
pub use optic::{Mapper, Optic, Yield};
pub use ordered::{ordered, reversed};
pub use predicate::{Comparator, ErrorFilter, Predicate};
pub use prism::{prism, some};
pub use recover::{catching, first, ignoring, stop_on};
pub use traversal::{iteration, traversal, traverse_vec};
pub use value::{Focus, Index, ValueIndexed, ValueIndexedResult};
pub use window::{
    Transition, Window, dropping, dropping_while, element_at, filtered, taking, taking_while,
    trimming_while, windowed,
};
