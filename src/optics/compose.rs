//! Composition of optics.
//!
//! Composing an outer optic `S -> T` with an inner optic `T -> A` yields an
//! optic `S -> A` whose kind is the meet of both kinds: the result is
//! single-focus only when both parts are, writable only when both are, and
//! so on.
//!
//! The composed optic reports the inner index by default.
//! [`Optic::compose_left`] keeps the outer index instead.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::lens;
//! use lambars_optics::optics::{Context, OpticKind, traverse_vec};
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Team {
//!     scores: Vec<u32>,
//! }
//!
//! let scores = lens!(Team, scores).compose(traverse_vec::<u32>());
//! assert_eq!(scores.kind(), OpticKind::Traversal);
//!
//! let context = Context::background();
//! let team = Team { scores: vec![1, 2, 3] };
//! let bumped = scores.modify_all(&context, &team, |score| score + 1).unwrap();
//! assert_eq!(bumped.scores, vec![2, 3, 4]);
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use super::{
    Context, Expr, ExprKind, Focus, Index, Optic, OpticBuilder, OpticError, ValueIndexed,
    merge_handlers,
};

impl<I, S, T> Optic<I, S, T>
where
    I: Index,
    S: Focus,
    T: Focus,
{
    /// Composes with `inner`, reporting the inner index.
    ///
    /// # Panics
    ///
    /// Panics when both optics carry handlers with different tokens. Use
    /// [`try_compose`](Self::try_compose) to handle that case.
    #[must_use]
    pub fn compose<J, A>(self, inner: Optic<J, T, A>) -> Optic<J, S, A>
    where
        J: Index,
        A: Focus,
    {
        match self.try_compose(inner) {
            Ok(composed) => composed,
            Err(error) => panic!("{error}"),
        }
    }

    /// Composes with `inner`, reporting the inner index.
    ///
    /// # Errors
    ///
    /// [`MixedHandlers`](super::ErrorKind::MixedHandlers) when both optics
    /// carry handlers with different tokens.
    pub fn try_compose<J, A>(self, inner: Optic<J, T, A>) -> Result<Optic<J, S, A>, OpticError>
    where
        J: Index,
        A: Focus,
    {
        let equality = inner.clone();
        composed(
            self,
            inner,
            |_: &I, index: &J| index.clone(),
            move |left: &J, right: &J| equality.index_eq(left, right),
        )
    }

    /// Composes with `inner`, reporting the outer index.
    ///
    /// # Errors
    ///
    /// [`MixedHandlers`](super::ErrorKind::MixedHandlers) when both optics
    /// carry handlers with different tokens.
    pub fn compose_left<J, A>(self, inner: Optic<J, T, A>) -> Result<Optic<I, S, A>, OpticError>
    where
        J: Index,
        A: Focus,
    {
        let equality = self.clone();
        composed(
            self,
            inner,
            |index: &I, _: &J| index.clone(),
            move |left: &I, right: &I| equality.index_eq(left, right),
        )
    }
}

fn composed<I, J, K, S, T, A, P, E>(
    outer: Optic<I, S, T>,
    inner: Optic<J, T, A>,
    pick: P,
    equality: E,
) -> Result<Optic<K, S, A>, OpticError>
where
    I: Index,
    J: Index,
    K: Index,
    S: Focus,
    T: Focus,
    A: Focus,
    P: Fn(&I, &J) -> K + Send + Sync + 'static,
    E: Fn(&K, &K) -> Result<bool, OpticError> + Send + Sync + 'static,
{
    let handler = merge_handlers(outer.handler(), inner.handler())?;
    let kind = outer.kind().compose(inner.kind());
    let pick = Arc::new(pick);

    let (describe_outer, describe_inner) = (outer.clone(), inner.clone());
    let mut builder = OpticBuilder::<K, S, A>::described(kind, move || {
        Expr::new(
            ExprKind::Compose,
            vec![describe_outer.expr().clone(), describe_inner.expr().clone()],
        )
    })
    .handler_ref(handler.as_ref());

    if kind.is_single() {
        let (outer, inner, pick) = (outer.clone(), inner.clone(), Arc::clone(&pick));
        builder = builder.get(move |context: &Context, source: &S| {
            let middle = outer.get(context, source)?;
            let focus = inner.get(context, &middle.value)?;
            Ok(ValueIndexed::new(pick(&middle.index, &focus.index), focus.value))
        });
    }

    {
        let (outer, inner, pick) = (outer.clone(), inner.clone(), Arc::clone(&pick));
        builder = builder.iterate(move |context: &Context, source: &S, yield_| {
            outer.iterate(context, source, &mut |middle| match middle {
                Ok(middle) => inner.iterate(context, &middle.value, &mut |focus| {
                    yield_(focus.map(|focus| {
                        ValueIndexed::new(pick(&middle.index, &focus.index), focus.value)
                    }))
                }),
                Err(error) => yield_(Err(error)),
            })
        });
    }

    {
        let (outer, inner) = (outer.clone(), inner.clone());
        builder = builder.length(move |context: &Context, source: &S| {
            let mut total = 0_usize;
            let mut failure = None;
            let _ = outer.iterate(context, source, &mut |middle| {
                match middle.and_then(|middle| inner.length(context, &middle.value)) {
                    Ok(count) => {
                        total += count;
                        ControlFlow::Continue(())
                    }
                    Err(error) => {
                        failure = Some(error);
                        ControlFlow::Break(())
                    }
                }
            });
            failure.map_or(Ok(total), Err)
        });
    }

    if kind.is_writable() {
        let (outer, inner, pick) = (outer.clone(), inner.clone(), Arc::clone(&pick));
        builder = builder.modify(move |context: &Context, source: &S, mapper| {
            outer.modify(context, source, &mut |outer_index: &I, middle: T| {
                inner.modify(context, &middle, &mut |inner_index: &J, focus: A| {
                    mapper(&pick(outer_index, inner_index), focus)
                })
            })
        });
    }

    if kind.is_reversible() {
        let (outer, inner) = (outer.clone(), inner.clone());
        builder = builder.reverse_get(move |context: &Context, focus: A| {
            let middle = inner.reverse_get(context, focus)?;
            outer.reverse_get(context, middle)
        });
    }

    builder = builder.index_equality(equality);

    tracing::debug!(kind = %kind, outer = %outer.expr(), inner = %inner.expr(), "composed optics");
    Ok(builder.assemble())
}
