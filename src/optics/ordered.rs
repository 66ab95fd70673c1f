//! Reordering of an optic's elements.
//!
//! [`ordered`] presents the elements sorted by a [`Comparator`];
//! [`reversed`] presents them back to front. Both must see every element
//! before emitting the first one, so they do not terminate on unbounded
//! sources.
//!
//! `modify` calls the mapper in the new order and writes each result back
//! to the position the element came from. The underlying optic is modified
//! in a second pass that hands out the precomputed results one by one; if
//! that pass visits a different number of elements than iteration produced,
//! the operation fails with [`Inconsistent`](super::ErrorKind::Inconsistent).
//!
//! Sorting is a heap sort driven by a fallible comparator. Elements the
//! comparator considers equal, or cannot compare, keep their original
//! relative order.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::optics::{Comparator, Context, ordered, traverse_vec};
//!
//! let sorted = ordered(traverse_vec::<i32>(), Comparator::natural());
//! let context = Context::background();
//! assert_eq!(sorted.values(&context, &vec![3, 1, 2]).unwrap(), vec![1, 2, 3]);
//!
//! let mut calls = Vec::new();
//! let updated = sorted
//!     .modify(&context, &vec![3, 1, 2], &mut |_, value| {
//!         calls.push(value);
//!         Ok(value + 10)
//!     })
//!     .unwrap();
//! assert_eq!(calls, vec![1, 2, 3]);
//! assert_eq!(updated, vec![13, 11, 12]);
//! ```

use std::ops::ControlFlow;

use super::{
    Comparator, Context, ErrorKind, Expr, ExprKind, Focus, Index, Optic, OpticBuilder, OpticError,
    ValueIndexed,
};

enum Order<I, A> {
    By(Comparator<I, A>),
    Reverse,
}

struct Slot<I, A> {
    position: usize,
    element: ValueIndexed<I, A>,
}

/// Sorts `items` ascending under `less`, which must describe a strict order.
fn heap_sort<T, F>(items: &mut [T], mut less: F) -> Result<(), OpticError>
where
    F: FnMut(&T, &T) -> Result<bool, OpticError>,
{
    let length = items.len();
    for root in (0..length / 2).rev() {
        sift_down(items, root, length, &mut less)?;
    }
    for end in (1..length).rev() {
        items.swap(0, end);
        sift_down(items, 0, end, &mut less)?;
    }
    Ok(())
}

fn sift_down<T, F>(
    items: &mut [T],
    mut root: usize,
    end: usize,
    less: &mut F,
) -> Result<(), OpticError>
where
    F: FnMut(&T, &T) -> Result<bool, OpticError>,
{
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return Ok(());
        }
        if child + 1 < end && less(&items[child], &items[child + 1])? {
            child += 1;
        }
        if !less(&items[root], &items[child])? {
            return Ok(());
        }
        items.swap(root, child);
        root = child;
    }
}

impl<I: Index, A: Focus> Order<I, A> {
    fn arrange(&self, context: &Context, slots: &mut [Slot<I, A>]) -> Result<(), OpticError> {
        match self {
            Self::Reverse => {
                slots.reverse();
                Ok(())
            }
            Self::By(comparator) => heap_sort(slots, |left, right| {
                context.check()?;
                Ok(
                    match comparator
                        .compare(&left.element, &right.element)
                        .map_err(|error| error.with_node(comparator.expr()))?
                    {
                        Some(std::cmp::Ordering::Less) => true,
                        Some(std::cmp::Ordering::Greater) => false,
                        Some(std::cmp::Ordering::Equal) | None => left.position < right.position,
                    },
                )
            }),
        }
    }
}

fn drain<I, S, A>(
    optic: &Optic<I, S, A>,
    context: &Context,
    source: &S,
) -> Result<Vec<Slot<I, A>>, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let mut slots = Vec::new();
    let mut failure = None;
    let _ = optic.iterate(context, source, &mut |item| match item {
        Ok(element) => {
            let position = slots.len();
            slots.push(Slot { position, element });
            ControlFlow::Continue(())
        }
        Err(error) => {
            failure = Some(error);
            ControlFlow::Break(())
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(slots),
    }
}

fn arranged<I, S, A>(
    optic: &Optic<I, S, A>,
    order: &Order<I, A>,
    context: &Context,
    source: &S,
) -> Result<Vec<Slot<I, A>>, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let mut slots = drain(optic, context, source)?;
    context.check()?;
    order.arrange(context, &mut slots)?;
    Ok(slots)
}

fn inconsistent(detail: &str) -> OpticError {
    OpticError::new(ErrorKind::Inconsistent(format!(
        "modify and iterate disagree: {detail}"
    )))
}

fn build<I, S, A>(
    optic: Optic<I, S, A>,
    order: Order<I, A>,
    node: ExprKind,
    instrumented: bool,
) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let kind = optic.kind().widened();
    let order = std::sync::Arc::new(order);
    let (described, describing) = (optic.clone(), std::sync::Arc::clone(&order));
    let mut builder = OpticBuilder::<I, S, A>::described(kind, move || {
        let mut children = vec![described.expr().clone()];
        if let Order::By(comparator) = describing.as_ref() {
            children.push(comparator.expr());
        }
        Expr::new(node.clone(), children)
    })
    .handler_ref(optic.handler());

    {
        let (optic, order) = (optic.clone(), std::sync::Arc::clone(&order));
        builder = builder.iterate(move |context: &Context, source: &S, yield_| {
            match arranged(&optic, &order, context, source) {
                Ok(slots) => {
                    for slot in slots {
                        yield_(Ok(slot.element))?;
                    }
                    ControlFlow::Continue(())
                }
                Err(error) => yield_(Err(error)),
            }
        });
    }

    {
        let optic = optic.clone();
        builder =
            builder.length(move |context: &Context, source: &S| optic.length(context, source));
    }

    if kind.is_writable() {
        builder = builder.modify(move |context: &Context, source: &S, mapper| {
            let slots = arranged(&optic, &order, context, source)?;
            let mut results: Vec<Option<A>> = vec![None; slots.len()];
            for Slot { position, element } in slots {
                let ValueIndexed { index, value } = element;
                results[position] = Some(mapper(&index, value)?);
            }
            let mut visited = 0_usize;
            let rebuilt = optic.modify(context, source, &mut |_: &I, _: A| {
                let replacement = results
                    .get_mut(visited)
                    .and_then(Option::take)
                    .ok_or_else(|| inconsistent("modify visited more elements"))?;
                visited += 1;
                Ok(replacement)
            })?;
            if visited == results.len() {
                Ok(rebuilt)
            } else {
                Err(inconsistent("modify visited fewer elements"))
            }
        });
    }

    if instrumented {
        builder.assemble()
    } else {
        builder.assemble_trusted()
    }
}

/// The elements of `optic` sorted by `comparator`.
#[must_use]
pub fn ordered<I, S, A>(optic: Optic<I, S, A>, comparator: Comparator<I, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    build(optic, Order::By(comparator), ExprKind::Ordered, true)
}

/// The elements of `optic` in reverse order.
#[must_use]
pub fn reversed<I, S, A>(optic: Optic<I, S, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    build(optic, Order::Reverse, ExprKind::Reversed, true)
}

/// [`reversed`] without instrumentation, for combinators that wrap it in an
/// instrumented optic of their own.
pub(crate) fn reversed_trusted<I, S, A>(optic: Optic<I, S, A>) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    build(optic, Order::Reverse, ExprKind::Reversed, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::{OpticKind, traversal, traverse_vec};
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        group: u8,
        label: char,
    }

    #[test]
    fn equal_keys_keep_their_original_order() {
        let rows = vec![
            Row { group: 2, label: 'a' },
            Row { group: 1, label: 'b' },
            Row { group: 2, label: 'c' },
            Row { group: 1, label: 'd' },
        ];
        let by_group = ordered(
            traverse_vec::<Row>(),
            Comparator::by_key("group", |row: &Row| row.group),
        );
        let context = Context::background();
        let labels: Vec<char> = by_group
            .values(&context, &rows)
            .unwrap()
            .into_iter()
            .map(|row| row.label)
            .collect();
        assert_eq!(labels, vec!['b', 'd', 'a', 'c']);
    }

    #[test]
    fn reversed_modifies_back_to_front() {
        let context = Context::background();
        let mut order = Vec::new();
        let updated = reversed(traverse_vec::<i32>())
            .modify(&context, &vec![1, 2, 3], &mut |index, value| {
                order.push(*index);
                Ok(value * 2)
            })
            .unwrap();
        assert_eq!(order, vec![2, 1, 0]);
        assert_eq!(updated, vec![2, 4, 6]);
    }

    #[test]
    fn comparator_errors_abort_with_the_comparator_in_the_path() {
        let refusing = Comparator::<usize, i32>::fallible("refusing", |_, _| {
            Err(OpticError::new(ErrorKind::Inconsistent("no".to_string())))
        });
        let context = Context::background();
        let error = ordered(traverse_vec::<i32>(), refusing)
            .values(&context, &vec![2, 1])
            .unwrap_err();
        assert_eq!(error.path()[0].to_string(), "Comparator[refusing]");
        assert_eq!(
            error.path()[1].to_string(),
            "Ordered(Vec, Comparator[refusing])"
        );
    }

    #[test]
    fn disagreeing_modify_is_reported() {
        // Iterates every element but modifies only the first.
        let lopsided = traversal(
            "lopsided",
            |source: &Vec<i32>, yield_| {
                for (index, value) in source.iter().enumerate() {
                    yield_(Ok(ValueIndexed::new(index, *value)))?;
                }
                ControlFlow::Continue(())
            },
            |source: &Vec<i32>, mapper| {
                let mut updated = source.clone();
                if let Some(first) = updated.first_mut() {
                    *first = mapper(&0, *first)?;
                }
                Ok(updated)
            },
        );
        let context = Context::background();
        let error = reversed(lopsided)
            .modify_all(&context, &vec![1, 2], |value| value)
            .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Inconsistent(_)));
    }

    #[test]
    fn reordering_widens_the_kind() {
        let single = crate::optics::identity::<i32>();
        assert_eq!(reversed(single).kind(), OpticKind::Traversal);
    }

    proptest! {
        #[test]
        fn ordered_values_are_sorted(values in prop::collection::vec(any::<i16>(), 0..40)) {
            let context = Context::background();
            let mut expected = values.clone();
            expected.sort_unstable();
            let sorted = ordered(traverse_vec::<i16>(), Comparator::natural());
            prop_assert_eq!(sorted.values(&context, &values).unwrap(), expected);
        }

        #[test]
        fn descending_identity_is_a_no_op(values in prop::collection::vec(any::<i16>(), 0..40)) {
            let context = Context::background();
            let sorted = ordered(traverse_vec::<i16>(), Comparator::natural().desc());
            let updated = sorted.modify_all(&context, &values, |value| value).unwrap();
            prop_assert_eq!(updated, values);
        }

        #[test]
        fn no_opinion_keeps_order(values in prop::collection::vec(any::<i16>(), 0..40)) {
            let context = Context::background();
            let indifferent = Comparator::fallible("indifferent", |_: &i16, _: &i16| Ok(None));
            let kept = ordered(traverse_vec::<i16>(), indifferent);
            prop_assert_eq!(kept.values(&context, &values).unwrap(), values);
        }
    }
}
