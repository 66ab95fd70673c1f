//! Entry points that run one whole action against a source.
//!
//! These are thin consumers of the optic contract. Their only extra duty is
//! delegation: when the optic's tree carries a [`Handler`], [`get`], [`set`],
//! [`modify`], [`reverse_get`] and [`first`] hand the complete root
//! expression to that handler in a single call and never run the native
//! sub-optics. [`collect`] and [`length`] have no handler counterpart and
//! always run natively.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::action;
//! use lambars_optics::optics::{Context, traverse_vec};
//!
//! let context = Context::background();
//! let items = traverse_vec::<i32>();
//! assert_eq!(action::first(&context, &items, &vec![4, 5]).unwrap(), Some(4));
//! assert_eq!(action::modify(&context, &items, &vec![4, 5], |x| x * 2).unwrap(), vec![8, 10]);
//! ```

use std::ops::ControlFlow;

use crate::optics::{
    Context, DynValue, Focus, Handler, Index, Operation, Optic, OpticError, ValueIndexed,
};

fn supported<I, S, A>(
    optic: &Optic<I, S, A>,
    allowed: bool,
    operation: Operation,
) -> Result<(), OpticError> {
    if allowed {
        Ok(())
    } else {
        Err(OpticError::unsupported(operation, optic.kind()).with_node(optic.expr().clone()))
    }
}

fn delegated<'h, I, S, A>(
    context: &Context,
    optic: &'h Optic<I, S, A>,
    operation: Operation,
) -> Result<Option<&'h dyn Handler>, OpticError> {
    let Some(handler) = optic.handler() else {
        return Ok(None);
    };
    context.check()?;
    tracing::debug!(
        handler = handler.token(),
        %operation,
        expr = %optic.expr(),
        "delegating action to handler"
    );
    Ok(Some(handler.as_ref()))
}

/// The single focus of `source`.
///
/// # Errors
///
/// `UnsupportedOperation` on a multi-focus optic, `EmptyResult` when nothing
/// was focused, `CastMismatch` when a handler answered with another type, or
/// any error raised underneath.
pub fn get<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<A, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    supported(optic, optic.kind().is_single(), Operation::Get)?;
    match delegated(context, optic, Operation::Get)? {
        Some(handler) => handler
            .get(context, optic.expr(), DynValue::new(source.clone()))
            .map_err(|error| context.join(error))?
            .downcast::<A>(),
        None => optic.get(context, source).map(|element| element.value),
    }
}

/// The first focus of `source`, or `None` when nothing was focused.
///
/// A handler receives this as a `get` request and answers `EmptyResult` when
/// nothing matched.
///
/// # Errors
///
/// `CastMismatch` when a handler answered with another type, or any error
/// raised underneath other than `EmptyResult`.
pub fn first<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<Option<A>, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    if let Some(handler) = delegated(context, optic, Operation::Get)? {
        return match handler.get(context, optic.expr(), DynValue::new(source.clone())) {
            Ok(value) => value.downcast::<A>().map(Some),
            Err(error) if error.is_empty_result() && !error.is_cancelled() => Ok(None),
            Err(error) => Err(context.join(error)),
        };
    }
    let mut found: Option<Result<ValueIndexed<I, A>, OpticError>> = None;
    let _ = optic.iterate(context, source, &mut |item| {
        found = Some(item);
        ControlFlow::Break(())
    });
    match found {
        None => Ok(None),
        Some(Ok(element)) => Ok(Some(element.value)),
        Some(Err(error)) if error.is_empty_result() && !error.is_cancelled() => Ok(None),
        Some(Err(error)) => Err(error),
    }
}

/// Every focus of `source`, in iteration order.
///
/// # Errors
///
/// The first error iteration produces.
pub fn collect<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<Vec<A>, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    optic.values(context, source)
}

/// The number of foci in `source`.
///
/// # Errors
///
/// The first error iteration produces.
pub fn length<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<usize, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    optic.length(context, source)
}

/// Replaces every focus of `source` with `focus`.
///
/// # Errors
///
/// `UnsupportedOperation` on a read-only optic, `CastMismatch` when a handler
/// answered with another type, or any error raised underneath.
pub fn set<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    focus: A,
    source: &S,
) -> Result<S, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    supported(optic, optic.kind().is_writable(), Operation::Set)?;
    match delegated(context, optic, Operation::Set)? {
        Some(handler) => handler
            .set(
                context,
                optic.expr(),
                DynValue::new(focus),
                DynValue::new(source.clone()),
            )
            .map_err(|error| context.join(error))?
            .downcast::<S>(),
        None => optic.set(context, focus, source),
    }
}

/// Transforms every focus of `source` with `function`.
///
/// # Errors
///
/// `UnsupportedOperation` on a read-only optic, `CastMismatch` when a handler
/// answered with another type, or any error raised underneath.
pub fn modify<I, S, A, F>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    mut function: F,
) -> Result<S, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
    F: FnMut(A) -> A,
{
    supported(optic, optic.kind().is_writable(), Operation::Modify)?;
    match delegated(context, optic, Operation::Modify)? {
        Some(handler) => handler
            .modify(
                context,
                optic.expr(),
                DynValue::new(source.clone()),
                &mut |value: DynValue| {
                    value
                        .downcast::<A>()
                        .map(|value| DynValue::new(function(value)))
                },
            )
            .map_err(|error| context.join(error))?
            .downcast::<S>(),
        None => optic.modify_all(context, source, function),
    }
}

/// Builds a source from `focus`.
///
/// # Errors
///
/// `UnsupportedOperation` on a unidirectional optic, `CastMismatch` when a
/// handler answered with another type, or any error raised underneath.
pub fn reverse_get<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    focus: A,
) -> Result<S, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    supported(optic, optic.kind().is_reversible(), Operation::ReverseGet)?;
    match delegated(context, optic, Operation::ReverseGet)? {
        Some(handler) => handler
            .reverse_get(context, optic.expr(), DynValue::new(focus))
            .map_err(|error| context.join(error))?
            .downcast::<S>(),
        None => optic.reverse_get(context, focus),
    }
}
