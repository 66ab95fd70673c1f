//! Positional and predicate windows over the elements of an optic.
//!
//! Every combinator here is an instance of one engine. A [`Window`] pairs a
//! position test (on the running count of elements seen so far) with a
//! predicate on the element, and says what happens on a match and on a miss:
//!
//! | Combinator       | Position test | Predicate | On match   | On miss    |
//! |------------------|---------------|-----------|------------|------------|
//! | `taking(n)`      | `p < n`       | always    | `Continue` | `Stop`     |
//! | `dropping(n)`    | `p >= n`      | always    | `YieldAll` | `Continue` |
//! | `taking_while`   | always        | `pred`    | `Continue` | `Stop`     |
//! | `dropping_while` | always        | `!pred`   | `YieldAll` | `Continue` |
//! | `filtered`       | always        | `pred`    | `Continue` | `Continue` |
//! | `element_at(n)`  | `p == n`      | always    | `Stop`     | `Continue` |
//!
//! A matching element is emitted (and, under `modify`, transformed); a
//! missing one is skipped and left untouched. After `Stop` no further
//! element is emitted or transformed. After `YieldAll` every remaining
//! element is, without consulting either test again. A window whose next
//! position can only miss into `Stop` ends before pulling that element, so
//! `taking(n)` never reads (or reports errors from) the element at `n`.
//!
//! A failing predicate ends the sequence with its error. Cancellation is
//! observed while skipping elements, so a window over a long run of misses
//! still stops promptly.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::optics::{Context, Predicate, filtered, taking, traverse_vec};
//!
//! let big = Predicate::new("> 3", |value: &i32| *value > 3);
//! let first_two_big = taking(filtered(traverse_vec::<i32>(), big), 2);
//!
//! let context = Context::background();
//! assert_eq!(first_two_big.values(&context, &vec![5, 3, 8, 1]).unwrap(), vec![5, 8]);
//! assert_eq!(
//!     first_two_big.modify_all(&context, &vec![5, 3, 8, 1], |value| -value).unwrap(),
//!     vec![-5, 3, -8, 1]
//! );
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use super::ordered::reversed_trusted;
use super::{
    Context, Expr, ExprKind, Focus, Index, Optic, OpticBuilder, OpticError, Predicate,
    ValueIndexedResult, Yield,
};

/// What a window does after testing an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep testing the following elements.
    Continue,
    /// Emit nothing after this element.
    Stop,
    /// Emit every following element without further tests.
    YieldAll,
}

/// A windowing rule: a position test, an element predicate and the
/// transitions taken on a match and on a miss.
pub struct Window<I, A> {
    position: Arc<dyn Fn(usize) -> bool + Send + Sync>,
    predicate: Predicate<I, A>,
    on_match: Transition,
    on_miss: Transition,
}

impl<I, A> Clone for Window<I, A> {
    fn clone(&self) -> Self {
        Self {
            position: Arc::clone(&self.position),
            predicate: self.predicate.clone(),
            on_match: self.on_match,
            on_miss: self.on_miss,
        }
    }
}

#[derive(Default)]
struct WindowState {
    position: usize,
    yield_all: bool,
    stopped: bool,
}

impl<I: Index, A: Focus> Window<I, A> {
    /// Creates a window rule.
    ///
    /// An element matches when `position` accepts its running position and
    /// `predicate` accepts the element.
    pub fn new<P>(
        position: P,
        predicate: Predicate<I, A>,
        on_match: Transition,
        on_miss: Transition,
    ) -> Self
    where
        P: Fn(usize) -> bool + Send + Sync + 'static,
    {
        Self {
            position: Arc::new(position),
            predicate,
            on_match,
            on_miss,
        }
    }

    /// `true` once no further element can be emitted: the window stopped, or
    /// the next position fails the position test and a miss stops it.
    fn exhausted(&self, state: &WindowState) -> bool {
        state.stopped
            || (!state.yield_all
                && self.on_miss == Transition::Stop
                && !(self.position)(state.position))
    }

    /// Tests one element, advancing the state. Returns whether it is emitted.
    fn step(&self, state: &mut WindowState, index: &I, value: &A) -> Result<bool, OpticError> {
        if state.yield_all {
            return Ok(true);
        }
        let active = (self.position)(state.position);
        state.position += 1;
        let matched = active
            && self
                .predicate
                .test(index, value)
                .map_err(|error| error.with_node(self.predicate.expr()))?;
        let transition = if matched {
            self.on_match
        } else {
            self.on_miss
        };
        match transition {
            Transition::Continue => {}
            Transition::Stop => state.stopped = true,
            Transition::YieldAll => state.yield_all = true,
        }
        Ok(matched)
    }
}

fn forward<I, A>(
    yield_: &mut Yield<'_, I, A>,
    item: ValueIndexedResult<I, A>,
    consumer_stopped: &mut bool,
) -> ControlFlow<()> {
    let flow = yield_(item);
    if flow.is_break() {
        *consumer_stopped = true;
    }
    flow
}

fn build<I, S, A>(
    optic: Optic<I, S, A>,
    window: Window<I, A>,
    node: ExprKind,
    predicate: Option<Expr>,
    instrumented: bool,
) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let kind = optic.kind().widened();
    let described = optic.clone();
    let mut builder = OpticBuilder::<I, S, A>::described(kind, move || {
        let mut children = vec![described.expr().clone()];
        children.extend(predicate.clone());
        Expr::new(node.clone(), children)
    })
    .handler_ref(optic.handler());

    {
        let (optic, window) = (optic.clone(), window.clone());
        builder = builder.iterate(move |context: &Context, source: &S, yield_| {
            let mut state = WindowState::default();
            if window.exhausted(&state) {
                return ControlFlow::Continue(());
            }
            let mut consumer_stopped = false;
            let _ = optic.iterate(context, source, &mut |item| {
                let element = match item {
                    Ok(element) => element,
                    Err(error) => return forward(yield_, Err(error), &mut consumer_stopped),
                };
                match window.step(&mut state, &element.index, &element.value) {
                    Ok(true) => forward(yield_, Ok(element), &mut consumer_stopped)?,
                    Ok(false) if window.exhausted(&state) => {}
                    Ok(false) => {
                        if let Err(error) = context.check() {
                            let _ = forward(yield_, Err(error), &mut consumer_stopped);
                            return ControlFlow::Break(());
                        }
                    }
                    Err(error) => {
                        let _ = forward(yield_, Err(error), &mut consumer_stopped);
                        return ControlFlow::Break(());
                    }
                }
                if window.exhausted(&state) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            if consumer_stopped {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
    }

    if kind.is_writable() {
        builder = builder.modify(move |context: &Context, source: &S, mapper| {
            let mut state = WindowState::default();
            optic.modify(context, source, &mut |index: &I, value: A| {
                if window.exhausted(&state) {
                    return Ok(value);
                }
                if window.step(&mut state, index, &value)? {
                    mapper(index, value)
                } else {
                    if !window.exhausted(&state) {
                        context.check()?;
                    }
                    Ok(value)
                }
            })
        });
    }

    if instrumented {
        builder.assemble()
    } else {
        builder.assemble_trusted()
    }
}

/// Applies a custom [`Window`] rule, recorded in the expression tree as
/// `name`.
#[must_use]
pub fn windowed<I, S, A>(
    optic: Optic<I, S, A>,
    name: impl Into<String>,
    window: Window<I, A>,
) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let predicate = window.predicate.expr();
    build(
        optic,
        window,
        ExprKind::Custom { name: name.into() },
        Some(predicate),
        true,
    )
}

/// The first `count` elements.
#[must_use]
pub fn taking<I, S, A>(optic: Optic<I, S, A>, count: usize) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let window = Window::new(
        move |position| position < count,
        Predicate::always(),
        Transition::Continue,
        Transition::Stop,
    );
    build(optic, window, ExprKind::Taking { count }, None, true)
}

/// Every element after the first `count`.
#[must_use]
pub fn dropping<I, S, A>(optic: Optic<I, S, A>, count: usize) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let window = Window::new(
        move |position| position >= count,
        Predicate::always(),
        Transition::YieldAll,
        Transition::Continue,
    );
    build(optic, window, ExprKind::Dropping { count }, None, true)
}

/// The longest prefix whose elements satisfy `predicate`.
#[must_use]
pub fn taking_while<I, S, A>(optic: Optic<I, S, A>, predicate: Predicate<I, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let node = predicate.expr();
    let window = Window::new(|_| true, predicate, Transition::Continue, Transition::Stop);
    build(optic, window, ExprKind::TakingWhile, Some(node), true)
}

fn skip_prefix<I: Index, A: Focus>(predicate: &Predicate<I, A>) -> Window<I, A> {
    Window::new(
        |_| true,
        predicate.negate(),
        Transition::YieldAll,
        Transition::Continue,
    )
}

/// Every element from the first one that fails `predicate`.
#[must_use]
pub fn dropping_while<I, S, A>(optic: Optic<I, S, A>, predicate: Predicate<I, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let node = predicate.expr();
    build(optic, skip_prefix(&predicate), ExprKind::DroppingWhile, Some(node), true)
}

/// The elements that satisfy `predicate`.
#[must_use]
pub fn filtered<I, S, A>(optic: Optic<I, S, A>, predicate: Predicate<I, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let node = predicate.expr();
    let window = Window::new(|_| true, predicate, Transition::Continue, Transition::Continue);
    build(optic, window, ExprKind::Filtered, Some(node), true)
}

/// The element at `position` in iteration order, if there is one.
#[must_use]
pub fn element_at<I, S, A>(optic: Optic<I, S, A>, position: usize) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let window = Window::new(
        move |current| current == position,
        Predicate::always(),
        Transition::Stop,
        Transition::Continue,
    );
    build(optic, window, ExprKind::ElementAt { position }, None, true)
}

/// Drops the elements satisfying `predicate` from both ends.
///
/// Needs the whole sequence before it can emit anything, so it does not
/// terminate on unbounded sources.
#[must_use]
pub fn trimming_while<I, S, A>(optic: Optic<I, S, A>, predicate: Predicate<I, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let node = predicate.expr();
    let front = build(
        optic.clone(),
        skip_prefix(&predicate),
        ExprKind::DroppingWhile,
        Some(node.clone()),
        false,
    );
    let back = build(
        reversed_trusted(front),
        skip_prefix(&predicate),
        ExprKind::DroppingWhile,
        Some(node.clone()),
        false,
    );
    let trimmed = reversed_trusted(back);

    let kind = trimmed.kind();
    let described = optic.clone();
    let mut builder = OpticBuilder::<I, S, A>::described(kind, move || {
        Expr::new(
            ExprKind::TrimmingWhile,
            vec![described.expr().clone(), node.clone()],
        )
    })
    .handler_ref(optic.handler());
    {
        let trimmed = trimmed.clone();
        builder = builder.iterate(move |context: &Context, source: &S, yield_| {
            trimmed.iterate(context, source, yield_)
        });
    }
    if kind.is_writable() {
        builder = builder.modify(move |context: &Context, source: &S, mapper| {
            trimmed.modify(context, source, mapper)
        });
    }
    builder.assemble()
}
