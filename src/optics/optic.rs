//! The core optic contract.
//!
//! An [`Optic<I, S, A>`] views and updates values of type `A`, indexed by
//! `I`, inside a source of type `S`. However it was constructed, it presents
//! the same eight operations:
//!
//! | Operation        | Legal when           | Meaning                                  |
//! |------------------|----------------------|------------------------------------------|
//! | [`get`]          | single focus         | the one focus with its index             |
//! | [`set`]          | read-write           | replace every focus                      |
//! | [`iterate`]      | always               | push every focus to a consumer           |
//! | [`length`]       | always               | number of elements `iterate` produces    |
//! | [`modify`]       | read-write           | transform every focus in one pass        |
//! | [`indexed_get`]  | always               | the foci whose index matches             |
//! | [`index_eq`]     | always               | index equality used by `indexed_get`     |
//! | [`reverse_get`]  | bidirectional        | rebuild a source from a focus            |
//!
//! Calling an operation outside the optic's capabilities returns
//! [`UnsupportedOperation`](super::ErrorKind::UnsupportedOperation).
//!
//! Iteration is push-style: the optic calls the consumer once per element and
//! the consumer's [`ControlFlow`] decides whether it continues. `iterate`
//! returns [`ControlFlow::Break`] exactly when the consumer asked to stop.
//!
//! [`get`]: Optic::get
//! [`set`]: Optic::set
//! [`iterate`]: Optic::iterate
//! [`length`]: Optic::length
//! [`modify`]: Optic::modify
//! [`indexed_get`]: Optic::indexed_get
//! [`index_eq`]: Optic::index_eq
//! [`reverse_get`]: Optic::reverse_get

use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, OnceLock};

use super::builder::{DescribeFn, Primitives};
use super::{
    Context, Expr, Focus, Handler, Index, OpticError, OpticKind, Operation, ProtocolViolation,
    ValueIndexed, ValueIndexedResult,
};

/// Consumer callback of [`Optic::iterate`].
pub type Yield<'y, I, A> = dyn FnMut(ValueIndexedResult<I, A>) -> ControlFlow<()> + 'y;

/// Per-element transformer of [`Optic::modify`].
pub type Mapper<'m, I, A> = dyn FnMut(&I, A) -> Result<A, OpticError> + 'm;

struct OpticInner<I, S, A> {
    kind: OpticKind,
    expr: OnceLock<Expr>,
    describe: DescribeFn,
    handler: Option<Arc<dyn Handler>>,
    primitives: Primitives<I, S, A>,
    instrumented: bool,
}

/// An immutable, shareable, composable accessor.
///
/// Cloning is cheap: clones share the same definition.
///
/// # Type Parameters
///
/// - `I`: The index of each focus
/// - `S`: The source type
/// - `A`: The focus type
pub struct Optic<I, S, A> {
    inner: Arc<OpticInner<I, S, A>>,
}

impl<I, S, A> Clone for Optic<I, S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, S, A> fmt::Debug for Optic<I, S, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Optic")
            .field("kind", &self.inner.kind)
            .field("expr", &self.expr().to_string())
            .field(
                "handler",
                &self.inner.handler.as_ref().map(|handler| handler.token()),
            )
            .finish_non_exhaustive()
    }
}

impl<I, S, A> Optic<I, S, A> {
    pub(crate) fn from_parts(
        kind: OpticKind,
        describe: DescribeFn,
        handler: Option<Arc<dyn Handler>>,
        primitives: Primitives<I, S, A>,
        instrumented: bool,
    ) -> Self {
        Self {
            inner: Arc::new(OpticInner {
                kind,
                expr: OnceLock::new(),
                describe,
                handler,
                primitives,
                instrumented,
            }),
        }
    }

    /// The capability kind of this optic.
    #[must_use]
    pub fn kind(&self) -> OpticKind {
        self.inner.kind
    }

    /// The expression tree describing how this optic was built.
    ///
    /// Computed on first use and cached.
    #[must_use]
    pub fn expr(&self) -> &Expr {
        self.inner.expr.get_or_init(|| (self.inner.describe)())
    }

    /// The external interpreter found in this optic's tree, if any.
    #[must_use]
    pub fn handler(&self) -> Option<&Arc<dyn Handler>> {
        self.inner.handler.as_ref()
    }

    /// `false` for optics assembled in trusted mode.
    #[must_use]
    pub fn is_instrumented(&self) -> bool {
        self.inner.instrumented
    }
}

impl<I, S, A> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    // -------------------------------------------------------------------------
    // Instrumentation
    // -------------------------------------------------------------------------

    fn annotate(&self, context: &Context, error: OpticError) -> OpticError {
        if !self.inner.instrumented {
            return error;
        }
        let node = self.expr().clone();
        tracing::trace!(optic = %node, error = %error.kind(), "annotating error path");
        context.join(error).with_node(node)
    }

    fn precheck(&self, context: &Context) -> Result<(), OpticError> {
        if self.inner.instrumented {
            context
                .check()
                .map_err(|error| error.with_node(self.expr().clone()))
        } else {
            Ok(())
        }
    }

    fn require(
        &self,
        context: &Context,
        allowed: bool,
        operation: Operation,
    ) -> Result<(), OpticError> {
        if allowed {
            Ok(())
        } else {
            Err(self.annotate(context, OpticError::unsupported(operation, self.inner.kind)))
        }
    }

    fn raise_protocol_violation(&self) -> ! {
        let violation = ProtocolViolation {
            optic: self.expr().to_string(),
        };
        tracing::error!(optic = %violation.optic, "element produced after the consumer stopped");
        std::panic::panic_any(violation)
    }

    /// Runs `produce` with a consumer that annotates errors and panics when
    /// an element arrives after `yield_` returned `Break`.
    fn guarded<P>(
        &self,
        context: &Context,
        yield_: &mut Yield<'_, I, A>,
        produce: P,
    ) -> ControlFlow<()>
    where
        P: FnOnce(&mut Yield<'_, I, A>) -> ControlFlow<()>,
    {
        let mut stopped = false;
        let _ = produce(&mut |item: ValueIndexedResult<I, A>| {
            if stopped {
                self.raise_protocol_violation();
            }
            let flow = yield_(item.map_err(|error| self.annotate(context, error)));
            if flow.is_break() {
                stopped = true;
            }
            flow
        });
        if stopped {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    // -------------------------------------------------------------------------
    // Contract
    // -------------------------------------------------------------------------

    /// Returns the single focus and its index.
    ///
    /// # Errors
    ///
    /// `EmptyResult` when nothing was focused, `UnsupportedOperation` on a
    /// multi-focus optic, or any error raised underneath.
    pub fn get(&self, context: &Context, source: &S) -> Result<ValueIndexed<I, A>, OpticError> {
        self.require(context, self.inner.kind.is_single(), Operation::Get)?;
        self.precheck(context)?;
        self.raw_get(context, source)
            .map_err(|error| self.annotate(context, error))
    }

    /// Replaces every focus with `focus`, returning a new source.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on a read-only optic, or any error raised underneath.
    pub fn set(&self, context: &Context, focus: A, source: &S) -> Result<S, OpticError> {
        self.require(context, self.inner.kind.is_writable(), Operation::Set)?;
        self.precheck(context)?;
        self.raw_set(context, focus, source)
            .map_err(|error| self.annotate(context, error))
    }

    /// Pushes every focus to `yield_` until it returns `Break`.
    ///
    /// Returns `Break` exactly when the consumer stopped the iteration.
    ///
    /// # Panics
    ///
    /// Raises a [`ProtocolViolation`] when an element is produced after the
    /// consumer returned `Break`.
    pub fn iterate(
        &self,
        context: &Context,
        source: &S,
        yield_: &mut Yield<'_, I, A>,
    ) -> ControlFlow<()> {
        if !self.inner.instrumented {
            return self.raw_iterate(context, source, yield_);
        }
        if let Err(error) = self.precheck(context) {
            return yield_(Err(error));
        }
        self.guarded(context, yield_, |guarded| self.raw_iterate(context, source, guarded))
    }

    /// Counts the elements `iterate` would produce.
    ///
    /// # Errors
    ///
    /// The first error `iterate` produces.
    pub fn length(&self, context: &Context, source: &S) -> Result<usize, OpticError> {
        self.precheck(context)?;
        self.raw_length(context, source)
            .map_err(|error| self.annotate(context, error))
    }

    /// Applies `mapper` to every focus while rebuilding the source in one pass.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on a read-only optic, or the first error raised
    /// by the mapper or underneath.
    pub fn modify(
        &self,
        context: &Context,
        source: &S,
        mapper: &mut Mapper<'_, I, A>,
    ) -> Result<S, OpticError> {
        self.require(context, self.inner.kind.is_writable(), Operation::Modify)?;
        self.precheck(context)?;
        self.raw_modify(context, source, mapper)
            .map_err(|error| self.annotate(context, error))
    }

    /// Pushes the foci whose index equals `index`.
    ///
    /// # Panics
    ///
    /// Raises a [`ProtocolViolation`] when an element is produced after the
    /// consumer returned `Break`.
    pub fn indexed_get(
        &self,
        context: &Context,
        index: &I,
        source: &S,
        yield_: &mut Yield<'_, I, A>,
    ) -> ControlFlow<()> {
        if !self.inner.instrumented {
            return self.raw_indexed_get(context, index, source, yield_);
        }
        if let Err(error) = self.precheck(context) {
            return yield_(Err(error));
        }
        self.guarded(context, yield_, |guarded| {
            self.raw_indexed_get(context, index, source, guarded)
        })
    }

    /// Index equality used by [`indexed_get`](Self::indexed_get).
    ///
    /// # Errors
    ///
    /// Any error the supplied equality raises.
    pub fn index_eq(&self, left: &I, right: &I) -> Result<bool, OpticError> {
        self.raw_index_eq(left, right)
    }

    /// Rebuilds a source from a focus.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` on a unidirectional optic, or any error raised underneath.
    pub fn reverse_get(&self, context: &Context, focus: A) -> Result<S, OpticError> {
        self.require(context, self.inner.kind.is_reversible(), Operation::ReverseGet)?;
        self.precheck(context)?;
        self.raw_reverse_get(context, focus)
            .map_err(|error| self.annotate(context, error))
    }

    // -------------------------------------------------------------------------
    // Conveniences over the contract
    // -------------------------------------------------------------------------

    /// [`modify`](Self::modify) with an infallible, index-blind function.
    ///
    /// # Errors
    ///
    /// See [`modify`](Self::modify).
    pub fn modify_all<F>(
        &self,
        context: &Context,
        source: &S,
        mut function: F,
    ) -> Result<S, OpticError>
    where
        F: FnMut(A) -> A,
    {
        self.modify(context, source, &mut |_: &I, value: A| Ok(function(value)))
    }

    /// Collects every element, failing on the first error.
    ///
    /// # Errors
    ///
    /// The first error `iterate` produces.
    pub fn collect(
        &self,
        context: &Context,
        source: &S,
    ) -> Result<Vec<ValueIndexed<I, A>>, OpticError> {
        let mut elements = Vec::new();
        let mut failure = None;
        let _ = self.iterate(context, source, &mut |item| match item {
            Ok(element) => {
                elements.push(element);
                ControlFlow::Continue(())
            }
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        });
        failure.map_or(Ok(elements), Err)
    }

    /// Collects every focus value, failing on the first error.
    ///
    /// # Errors
    ///
    /// The first error `iterate` produces.
    pub fn values(&self, context: &Context, source: &S) -> Result<Vec<A>, OpticError> {
        self.collect(context, source)
            .map(|elements| elements.into_iter().map(|element| element.value).collect())
    }

    /// Collects the elements whose index equals `index`.
    ///
    /// # Errors
    ///
    /// The first error `indexed_get` produces.
    pub fn collect_indexed(
        &self,
        context: &Context,
        index: &I,
        source: &S,
    ) -> Result<Vec<ValueIndexed<I, A>>, OpticError> {
        let mut elements = Vec::new();
        let mut failure = None;
        let _ = self.indexed_get(context, index, source, &mut |item| match item {
            Ok(element) => {
                elements.push(element);
                ControlFlow::Continue(())
            }
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        });
        failure.map_or(Ok(elements), Err)
    }

    // -------------------------------------------------------------------------
    // Derivations
    // -------------------------------------------------------------------------

    fn raw_get(&self, context: &Context, source: &S) -> Result<ValueIndexed<I, A>, OpticError> {
        let primitives = &self.inner.primitives;
        match (&primitives.get, &primitives.iterate) {
            (Some(get), _) => get(context, source),
            (None, Some(iterate)) => {
                let mut first = None;
                let _ = iterate(context, source, &mut |item| {
                    first = Some(item);
                    ControlFlow::Break(())
                });
                first.unwrap_or_else(|| Err(OpticError::empty_result()))
            }
            (None, None) => Err(OpticError::unsupported(Operation::Get, self.inner.kind)),
        }
    }

    fn raw_iterate(
        &self,
        context: &Context,
        source: &S,
        yield_: &mut Yield<'_, I, A>,
    ) -> ControlFlow<()> {
        let primitives = &self.inner.primitives;
        match (&primitives.iterate, &primitives.get) {
            (Some(iterate), _) => iterate(context, source, yield_),
            (None, Some(get)) => match get(context, source) {
                Err(error) if error.is_empty_result() => ControlFlow::Continue(()),
                item => yield_(item),
            },
            (None, None) => yield_(Err(OpticError::unsupported(
                Operation::Iterate,
                self.inner.kind,
            ))),
        }
    }

    fn raw_length(&self, context: &Context, source: &S) -> Result<usize, OpticError> {
        if let Some(length) = &self.inner.primitives.length {
            return length(context, source);
        }
        let mut count = 0_usize;
        let mut failure = None;
        let _ = self.raw_iterate(context, source, &mut |item| match item {
            Ok(_) => {
                count += 1;
                ControlFlow::Continue(())
            }
            Err(error) => {
                failure = Some(error);
                ControlFlow::Break(())
            }
        });
        failure.map_or(Ok(count), Err)
    }

    fn raw_set(&self, context: &Context, focus: A, source: &S) -> Result<S, OpticError> {
        let primitives = &self.inner.primitives;
        match (&primitives.set, &primitives.modify) {
            (Some(set), _) => set(context, focus, source),
            (None, Some(modify)) => modify(context, source, &mut |_: &I, _: A| Ok(focus.clone())),
            (None, None) => Err(OpticError::unsupported(Operation::Set, self.inner.kind)),
        }
    }

    fn raw_modify(
        &self,
        context: &Context,
        source: &S,
        mapper: &mut Mapper<'_, I, A>,
    ) -> Result<S, OpticError> {
        let primitives = &self.inner.primitives;
        match (&primitives.modify, &primitives.set) {
            (Some(modify), _) => modify(context, source, mapper),
            (None, Some(set)) => match self.raw_get(context, source) {
                Ok(ValueIndexed { index, value }) => set(context, mapper(&index, value)?, source),
                Err(error) if error.is_empty_result() => Ok(source.clone()),
                Err(error) => Err(error),
            },
            (None, None) => Err(OpticError::unsupported(Operation::Modify, self.inner.kind)),
        }
    }

    fn raw_indexed_get(
        &self,
        context: &Context,
        index: &I,
        source: &S,
        yield_: &mut Yield<'_, I, A>,
    ) -> ControlFlow<()> {
        if let Some(indexed_get) = &self.inner.primitives.indexed_get {
            return indexed_get(context, index, source, yield_);
        }
        self.raw_iterate(context, source, &mut |item| match item {
            Ok(element) => match self.raw_index_eq(index, &element.index) {
                Ok(true) => yield_(Ok(element)),
                Ok(false) => ControlFlow::Continue(()),
                Err(error) => yield_(Err(error)),
            },
            Err(error) => yield_(Err(error)),
        })
    }

    fn raw_index_eq(&self, left: &I, right: &I) -> Result<bool, OpticError> {
        match &self.inner.primitives.index_equality {
            Some(equality) => equality(left, right),
            None => Ok(left == right),
        }
    }

    fn raw_reverse_get(&self, context: &Context, focus: A) -> Result<S, OpticError> {
        match &self.inner.primitives.reverse_get {
            Some(reverse_get) => reverse_get(context, focus),
            None => Err(OpticError::unsupported(Operation::ReverseGet, self.inner.kind)),
        }
    }
}

static_assertions::assert_impl_all!(Optic<usize, Vec<i32>, i32>: Send, Sync, Clone);
