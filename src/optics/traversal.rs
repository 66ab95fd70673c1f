//! Traversals and iterations: any number of foci.
//!
//! A traversal focuses on zero or more elements and can update all of them
//! in one pass. An iteration is its read-only counterpart. Both obey the
//! traversal laws:
//!
//! 1. **Identity**: modifying with the identity changes nothing.
//!    `modify(s, id) == s`
//!
//! 2. **Coherence**: `modify` calls its mapper on exactly the elements
//!    `iterate` yields, in the same order.

use std::ops::ControlFlow;

use super::{
    Context, Focus, Index, Mapper, Optic, OpticBuilder, OpticError, OpticKind, ValueIndexed, Yield,
};

/// Creates a read-only multi-focus optic from an iteration function.
///
/// # Examples
///
/// ```
/// use std::ops::ControlFlow;
/// use lambars_optics::optics::{Context, ValueIndexed, iteration};
///
/// let words = iteration("words", |text: &String, yield_| {
///     for (position, word) in text.split_whitespace().enumerate() {
///         yield_(Ok(ValueIndexed::new(position, word.to_string())))?;
///     }
///     ControlFlow::Continue(())
/// });
/// let context = Context::background();
/// assert_eq!(words.length(&context, &"a b c".to_string()).unwrap(), 3);
/// ```
#[must_use]
pub fn iteration<I, S, A, F>(name: impl Into<String>, iterate: F) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
    F: Fn(&S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Iteration)
        .iterate(move |_, source: &S, yield_| iterate(source, yield_))
        .assemble()
}

/// Creates a read-write multi-focus optic from an iteration function and a
/// one-pass modification function.
///
/// `modify` must call the mapper on exactly the elements `iterate` yields, in
/// the same order.
#[must_use]
pub fn traversal<I, S, A, F, M>(name: impl Into<String>, iterate: F, modify: M) -> Optic<I, S, A>
where
    I: Index,
    S: Focus,
    A: Focus,
    F: Fn(&S, &mut Yield<'_, I, A>) -> ControlFlow<()> + Send + Sync + 'static,
    M: Fn(&S, &mut Mapper<'_, I, A>) -> Result<S, OpticError> + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Traversal)
        .iterate(move |_, source: &S, yield_| iterate(source, yield_))
        .modify(move |_, source: &S, mapper| modify(source, mapper))
        .assemble()
}

/// A traversal over every element of a `Vec`, indexed by position.
///
/// `length` and `indexed_get` are answered directly instead of by iteration.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, traverse_vec};
///
/// let context = Context::background();
/// let doubled = traverse_vec::<i32>()
///     .modify_all(&context, &vec![1, 2, 3], |value| value * 2)
///     .unwrap();
/// assert_eq!(doubled, vec![2, 4, 6]);
/// ```
#[must_use]
pub fn traverse_vec<T: Focus>() -> Optic<usize, Vec<T>, T> {
    OpticBuilder::new("Vec", OpticKind::Traversal)
        .iterate(|context: &Context, source: &Vec<T>, yield_| {
            for (index, value) in source.iter().enumerate() {
                if let Err(error) = context.check() {
                    return yield_(Err(error));
                }
                yield_(Ok(ValueIndexed::new(index, value.clone())))?;
            }
            ControlFlow::Continue(())
        })
        .modify(|context: &Context, source: &Vec<T>, mapper| {
            let mut updated = Vec::with_capacity(source.len());
            for (index, value) in source.iter().enumerate() {
                context.check()?;
                updated.push(mapper(&index, value.clone())?);
            }
            Ok(updated)
        })
        .length(|_, source: &Vec<T>| Ok(source.len()))
        .indexed_get(|_, index: &usize, source: &Vec<T>, yield_| match source.get(*index) {
            Some(value) => yield_(Ok(ValueIndexed::new(*index, value.clone()))),
            None => ControlFlow::Continue(()),
        })
        .assemble()
}
