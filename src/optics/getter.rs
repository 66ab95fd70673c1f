//! Getters: exactly one read-only focus.

use super::{Focus, Optic, OpticBuilder, OpticError, OpticKind, ValueIndexed};

/// Creates a read-only view computed from the source.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, getter};
///
/// let length = getter("length", |text: &String| text.len());
/// let context = Context::background();
/// assert_eq!(length.get(&context, &"four".to_string()).unwrap().value, 4);
/// assert!(length.set(&context, 1, &"four".to_string()).is_err());
/// ```
#[must_use]
pub fn getter<S, A, G>(name: impl Into<String>, view: G) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    G: Fn(&S) -> A + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Getter)
        .get(move |_, source: &S| Ok(ValueIndexed::new((), view(source))))
        .assemble()
}

/// Creates a read-only view that may fail.
#[must_use]
pub fn try_getter<S, A, G>(name: impl Into<String>, view: G) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    G: Fn(&S) -> Result<A, OpticError> + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Getter)
        .get(move |_, source: &S| view(source).map(|value| ValueIndexed::new((), value)))
        .assemble()
}
