//! Error recovery over iteration, and the `first` projection.
//!
//! The recovery combinators decide what happens to errors an optic yields
//! while iterating. Which errors they act on is given by an [`ErrorFilter`];
//! cancellation never matches a filter, so it always propagates.
//!
//! | Combinator | On a matching error                          |
//! |------------|----------------------------------------------|
//! | `ignoring` | skip it and keep iterating                   |
//! | `catching` | replace it with a substitute element         |
//! | `stop_on`  | end the sequence quietly                     |
//!
//! A recovered optic is always a read-only iteration. An error raised by the
//! wrapped optic's own `modify` pass aborts that pass before a filter could
//! act on it, so a writable result would not visit what its `iterate` yields.

use std::ops::ControlFlow;

use super::{
    Context, ErrorFilter, Expr, ExprKind, Focus, Index, Optic, OpticBuilder, OpticError,
    OpticKind, ValueIndexed,
};

/// A read-only view of the first element of `optic`.
///
/// `get` fails with `EmptyResult` when `optic` focuses nothing.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, first, traverse_vec};
///
/// let head = first(traverse_vec::<i32>());
/// let context = Context::background();
/// assert_eq!(head.get(&context, &vec![4, 5]).unwrap().value, 4);
/// assert!(head.get(&context, &vec![]).unwrap_err().is_empty_result());
/// ```
#[must_use]
pub fn first<I, S, A>(optic: Optic<I, S, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let described = optic.clone();
    OpticBuilder::<I, S, A>::described(OpticKind::Getter, move || {
        Expr::new(ExprKind::First, vec![described.expr().clone()])
    })
    .handler_ref(optic.handler())
    .iterate(move |context: &Context, source: &S, yield_| {
        let mut flow = ControlFlow::Continue(());
        let _ = optic.iterate(context, source, &mut |item| {
            flow = yield_(item);
            ControlFlow::Break(())
        });
        flow
    })
    .assemble()
}

/// What a recovery did with an error.
enum Recovery {
    /// Keep iterating.
    Continue,
    /// The consumer stopped while receiving a substitute.
    Stopped,
    /// End the sequence without telling the consumer.
    End,
}

type Substitute<'y, I, A> = dyn FnMut(ValueIndexed<I, A>) -> ControlFlow<()> + 'y;

fn recovered<I, S, A, R>(
    optic: Optic<I, S, A>,
    node: ExprKind,
    filter: ErrorFilter,
    recover: R,
) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
    R: Fn(OpticError, &mut Substitute<'_, I, A>) -> Result<Recovery, OpticError>
        + Send
        + Sync
        + 'static,
{
    let described = optic.clone();
    let filter_node = filter.expr();
    OpticBuilder::<I, S, A>::described(OpticKind::Iteration, move || {
        Expr::new(node.clone(), vec![described.expr().clone(), filter_node.clone()])
    })
    .handler_ref(optic.handler())
    .iterate(move |context: &Context, source: &S, yield_| {
        let mut consumer_stopped = false;
        let _ = optic.iterate(context, source, &mut |item| {
            let item = match item {
                Err(error) if filter.matches(&error) => {
                    tracing::trace!(error = %error.kind(), "recovering from iteration error");
                    let outcome = recover(error, &mut |element| yield_(Ok(element)));
                    match outcome {
                        Ok(Recovery::Continue) => return ControlFlow::Continue(()),
                        Ok(Recovery::End) => return ControlFlow::Break(()),
                        Ok(Recovery::Stopped) => {
                            consumer_stopped = true;
                            return ControlFlow::Break(());
                        }
                        Err(error) => Err(error),
                    }
                }
                item => item,
            };
            let flow = yield_(item);
            if flow.is_break() {
                consumer_stopped = true;
            }
            flow
        });
        if consumer_stopped {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .assemble()
}

/// Skips the errors matching `filter` while iterating.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, ErrorFilter, ignoring, traverse_vec, try_getter};
///
/// let parsed = traverse_vec::<String>().compose(try_getter("parse", |text: &String| {
///     text.parse::<i32>().map_err(lambars_optics::optics::OpticError::domain)
/// }));
/// let lenient = ignoring(parsed, ErrorFilter::domain::<std::num::ParseIntError>());
/// let context = Context::background();
/// let rows = vec!["1".to_string(), "x".to_string(), "3".to_string()];
/// assert_eq!(lenient.values(&context, &rows).unwrap(), vec![1, 3]);
/// ```
#[must_use]
pub fn ignoring<I, S, A>(optic: Optic<I, S, A>, filter: ErrorFilter) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    recovered(optic, ExprKind::Ignoring, filter, |_, _| Ok(Recovery::Continue))
}

/// Replaces the errors matching `filter` with the element `substitute`
/// builds from them. Errors for which `substitute` returns `None` propagate.
#[must_use]
pub fn catching<I, S, A, F>(
    optic: Optic<I, S, A>,
    filter: ErrorFilter,
    substitute: F,
) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
    F: Fn(&OpticError) -> Option<ValueIndexed<I, A>> + Send + Sync + 'static,
{
    recovered(optic, ExprKind::Catching, filter, move |error, yield_| {
        match substitute(&error) {
            Some(element) => match yield_(element) {
                ControlFlow::Continue(()) => Ok(Recovery::Continue),
                ControlFlow::Break(()) => Ok(Recovery::Stopped),
            },
            None => Err(error),
        }
    })
}

/// Ends the sequence quietly at the first error matching `filter`.
#[must_use]
pub fn stop_on<I, S, A>(optic: Optic<I, S, A>, filter: ErrorFilter) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    recovered(optic, ExprKind::StopOn, filter, |_, _| Ok(Recovery::End))
}
