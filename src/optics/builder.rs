//! The assembler: builds a conforming optic from a minimal set of functions.
//!
//! An [`OpticBuilder`] accepts whichever primitives the author can supply
//! (commonly `iterate` + `modify`, or `get` + `set`) and produces an
//! [`Optic`] presenting all eight operations. Missing operations are derived
//! on demand:
//!
//! | Operation       | Derived from                                           |
//! |-----------------|--------------------------------------------------------|
//! | `get`           | first element of `iterate`, `EmptyResult` when none    |
//! | `iterate`       | `get`, an `EmptyResult` becoming zero elements          |
//! | `length`        | draining `iterate`, propagating the first error        |
//! | `set`           | `modify` with a constant mapper                        |
//! | `modify`        | `get` then `set`                                       |
//! | `indexed_get`   | `iterate` filtered by `index_equality`                 |
//! | `index_equality`| `PartialEq` on the index                               |
//!
//! Every optic produced by [`OpticBuilder::build`] is instrumented: it checks
//! the [`Context`] before doing work, merges cancellation into returned
//! errors, appends its own [`Expr`] to the error path, and guards the
//! iteration protocol.
//!
//! # Examples
//!
//! ```
//! use std::ops::ControlFlow;
//! use lambars_optics::optics::{Context, OpticBuilder, OpticKind, ValueIndexed};
//!
//! // A traversal over the even positions of a vector.
//! let evens = OpticBuilder::<usize, Vec<i32>, i32>::new("evens", OpticKind::Traversal)
//!     .iterate(|_, source: &Vec<i32>, yield_| {
//!         for (index, value) in source.iter().enumerate().step_by(2) {
//!             yield_(Ok(ValueIndexed::new(index, *value)))?;
//!         }
//!         ControlFlow::Continue(())
//!     })
//!     .modify(|_, source: &Vec<i32>, mapper| {
//!         source
//!             .iter()
//!             .enumerate()
//!             .map(|(index, value)| match index % 2 {
//!                 0 => mapper(&index, *value),
//!                 _ => Ok(*value),
//!             })
//!             .collect()
//!     })
//!     .build()
//!     .unwrap();
//!
//! let context = Context::background();
//! assert_eq!(evens.length(&context, &vec![1, 2, 3, 4, 5]).unwrap(), 3);
//! assert_eq!(
//!     evens.modify_all(&context, &vec![1, 2, 3], |value| value * 10).unwrap(),
//!     vec![10, 2, 30]
//! );
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use super::{
    Context, ErrorKind, Expr, Focus, Handler, Index, Mapper, Optic, OpticError, OpticKind,
    ValueIndexed, Yield,
};

pub(crate) type GetFn<I, S, A> =
    Box<dyn Fn(&Context, &S) -> Result<ValueIndexed<I, A>, OpticError> + Send + Sync>;
pub(crate) type SetFn<S, A> = Box<dyn Fn(&Context, A, &S) -> Result<S, OpticError> + Send + Sync>;
pub(crate) type IterateFn<I, S, A> =
    Box<dyn Fn(&Context, &S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync>;
pub(crate) type LengthFn<S> = Box<dyn Fn(&Context, &S) -> Result<usize, OpticError> + Send + Sync>;
pub(crate) type ModifyFn<I, S, A> =
    Box<dyn Fn(&Context, &S, &mut Mapper<'_, I, A>) -> Result<S, OpticError> + Send + Sync>;
pub(crate) type IndexedGetFn<I, S, A> =
    Box<dyn Fn(&Context, &I, &S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync>;
pub(crate) type IndexEqualityFn<I> = Box<dyn Fn(&I, &I) -> Result<bool, OpticError> + Send + Sync>;
pub(crate) type ReverseGetFn<S, A> =
    Box<dyn Fn(&Context, A) -> Result<S, OpticError> + Send + Sync>;
pub(crate) type DescribeFn = Box<dyn Fn() -> Expr + Send + Sync>;

/// The user supplied primitives of one optic. `None` means "derive it".
pub(crate) struct Primitives<I, S, A> {
    pub(crate) get: Option<GetFn<I, S, A>>,
    pub(crate) set: Option<SetFn<S, A>>,
    pub(crate) iterate: Option<IterateFn<I, S, A>>,
    pub(crate) length: Option<LengthFn<S>>,
    pub(crate) modify: Option<ModifyFn<I, S, A>>,
    pub(crate) indexed_get: Option<IndexedGetFn<I, S, A>>,
    pub(crate) index_equality: Option<IndexEqualityFn<I>>,
    pub(crate) reverse_get: Option<ReverseGetFn<S, A>>,
}

impl<I, S, A> Default for Primitives<I, S, A> {
    fn default() -> Self {
        Self {
            get: None,
            set: None,
            iterate: None,
            length: None,
            modify: None,
            indexed_get: None,
            index_equality: None,
            reverse_get: None,
        }
    }
}

/// Builds an [`Optic`] from a minimal set of primitive functions.
///
/// # Type Parameters
///
/// - `I`: The index type
/// - `S`: The source type
/// - `A`: The focus type
pub struct OpticBuilder<I, S, A> {
    kind: OpticKind,
    describe: DescribeFn,
    handler: Option<Arc<dyn Handler>>,
    primitives: Primitives<I, S, A>,
}

impl<I, S, A> OpticBuilder<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    /// Starts a leaf optic of the given kind, described by `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: OpticKind) -> Self {
        let leaf = Expr::leaf(name, kind);
        Self::described(kind, move || leaf.clone())
    }

    /// Starts an optic whose expression is computed lazily by `describe`.
    #[must_use]
    pub fn described<D>(kind: OpticKind, describe: D) -> Self
    where
        D: Fn() -> Expr + Send + Sync + 'static,
    {
        Self {
            kind,
            describe: Box::new(describe),
            handler: None,
            primitives: Primitives::default(),
        }
    }

    /// Supplies `Get`.
    #[must_use]
    pub fn get<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, &S) -> Result<ValueIndexed<I, A>, OpticError> + Send + Sync + 'static,
    {
        self.primitives.get = Some(Box::new(function));
        self
    }

    /// Supplies `Set`.
    #[must_use]
    pub fn set<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, A, &S) -> Result<S, OpticError> + Send + Sync + 'static,
    {
        self.primitives.set = Some(Box::new(function));
        self
    }

    /// Supplies `Iterate`.
    ///
    /// The function must stop producing elements as soon as the consumer
    /// returns [`ControlFlow::Break`], and return `Break` in that case.
    #[must_use]
    pub fn iterate<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, &S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync + 'static,
    {
        self.primitives.iterate = Some(Box::new(function));
        self
    }

    /// Supplies an optimized `Length`.
    #[must_use]
    pub fn length<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, &S) -> Result<usize, OpticError> + Send + Sync + 'static,
    {
        self.primitives.length = Some(Box::new(function));
        self
    }

    /// Supplies `Modify`.
    ///
    /// The mapper must be called on exactly the elements `iterate` yields, in
    /// the same order.
    #[must_use]
    pub fn modify<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, &S, &mut Mapper<'_, I, A>) -> Result<S, OpticError>
            + Send
            + Sync
            + 'static,
    {
        self.primitives.modify = Some(Box::new(function));
        self
    }

    /// Supplies an optimized `IndexedGet`.
    #[must_use]
    pub fn indexed_get<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, &I, &S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync + 'static,
    {
        self.primitives.indexed_get = Some(Box::new(function));
        self
    }

    /// Supplies `IndexEquality`. Must be reflexive.
    #[must_use]
    pub fn index_equality<F>(mut self, function: F) -> Self
    where
        F: Fn(&I, &I) -> Result<bool, OpticError> + Send + Sync + 'static,
    {
        self.primitives.index_equality = Some(Box::new(function));
        self
    }

    /// Supplies `ReverseGet`.
    #[must_use]
    pub fn reverse_get<F>(mut self, function: F) -> Self
    where
        F: Fn(&Context, A) -> Result<S, OpticError> + Send + Sync + 'static,
    {
        self.primitives.reverse_get = Some(Box::new(function));
        self
    }

    /// Attaches an external interpreter to this optic.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub(crate) fn handler_ref(mut self, handler: Option<&Arc<dyn Handler>>) -> Self {
        self.handler = handler.cloned();
        self
    }

    /// Validates the primitive set against the kind and assembles an
    /// instrumented optic.
    ///
    /// # Errors
    ///
    /// [`Configuration`](ErrorKind::Configuration) when the supplied
    /// primitives cannot provide an operation the kind requires.
    pub fn build(self) -> Result<Optic<I, S, A>, OpticError> {
        self.validate()?;
        Ok(self.assemble())
    }

    fn validate(&self) -> Result<(), OpticError> {
        let primitives = &self.primitives;
        let missing = if primitives.get.is_none() && primitives.iterate.is_none() {
            Some("either `get` or `iterate` is required")
        } else if self.kind.is_writable() && self.kind.is_single() {
            (primitives.set.is_none() && primitives.modify.is_none())
                .then_some("a writable single-focus optic needs `set` or `modify`")
        } else if self.kind.is_writable() && primitives.modify.is_none() {
            Some("a writable multi-focus optic needs `modify`")
        } else {
            None
        };
        let missing = missing.or_else(|| {
            (self.kind.is_reversible() && primitives.reverse_get.is_none())
                .then_some("a bidirectional optic needs `reverse_get`")
        });
        match missing {
            Some(message) => Err(OpticError::new(ErrorKind::Configuration(format!(
                "{} `{}`: {message}",
                self.kind,
                (self.describe)()
            )))),
            None => Ok(()),
        }
    }

    /// Assembles an instrumented optic without validation. Used by the
    /// crate's own constructors, which always supply a valid primitive set.
    pub(crate) fn assemble(self) -> Optic<I, S, A> {
        Optic::from_parts(
            self.kind,
            self.describe,
            self.handler,
            self.primitives,
            true,
        )
    }

    /// Assembles a trusted optic: no cancellation checks, no error path
    /// annotation and no protocol guard. Only for combinators that already
    /// establish those invariants around it.
    pub(crate) fn assemble_trusted(self) -> Optic<I, S, A> {
        Optic::from_parts(
            self.kind,
            self.describe,
            self.handler,
            self.primitives,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_traversal() -> OpticBuilder<usize, Vec<i32>, i32> {
        OpticBuilder::new("items", OpticKind::Traversal).iterate(|_, source: &Vec<i32>, yield_| {
            for (index, value) in source.iter().enumerate() {
                yield_(Ok(ValueIndexed::new(index, *value)))?;
            }
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn writable_traversal_without_modify_is_rejected() {
        let error = vector_traversal().build().unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Configuration(_)));
        assert!(error.to_string().contains("needs `modify`"));
    }

    #[test]
    fn read_only_iteration_needs_only_iterate() {
        let builder = OpticBuilder::<usize, Vec<i32>, i32>::new("items", OpticKind::Iteration)
            .iterate(|_, source: &Vec<i32>, yield_| {
                for (index, value) in source.iter().enumerate() {
                    yield_(Ok(ValueIndexed::new(index, *value)))?;
                }
                ControlFlow::Continue(())
            });
        assert!(builder.build().is_ok());
    }

    #[test]
    fn optic_without_read_primitive_is_rejected() {
        let error = OpticBuilder::<(), i32, i32>::new("nothing", OpticKind::Getter)
            .build()
            .unwrap_err();
        assert!(error.to_string().contains("either `get` or `iterate`"));
    }

    #[test]
    fn iso_without_reverse_is_rejected() {
        let error = OpticBuilder::<(), i32, i64>::new("widen", OpticKind::Iso)
            .get(|_, source: &i32| Ok(ValueIndexed::new((), i64::from(*source))))
            .set(|_, focus: i64, source: &i32| Ok(i32::try_from(focus).unwrap_or(*source)))
            .build()
            .unwrap_err();
        assert!(error.to_string().contains("reverse_get"));
    }
}
