//! Lenses: exactly one read-write focus.
//!
//! A lens focuses on a part that is always present, such as a struct field.
//! It obeys three laws:
//!
//! 1. **`GetSet`**: setting what you got changes nothing.
//!    `set(get(s), s) == s`
//!
//! 2. **`SetGet`**: you get what you set.
//!    `get(set(a, s)) == a`
//!
//! 3. **`SetSet`**: a second set overwrites the first.
//!    `set(b, set(a, s)) == set(b, s)`
//!
//! # Examples
//!
//! ```
//! use lambars_optics::lens;
//! use lambars_optics::optics::Context;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let age = lens!(Person, age);
//! let context = Context::background();
//! let person = Person { name: "Alice".to_string(), age: 30 };
//!
//! assert_eq!(age.get(&context, &person).unwrap().value, 30);
//! let older = age.set(&context, 31, &person).unwrap();
//! assert_eq!(older.age, 31);
//! assert_eq!(person.age, 30);
//! ```

use super::{Focus, Optic, OpticBuilder, OpticError, OpticKind, ValueIndexed};

/// Creates a lens from a getter and a setter.
///
/// The setter receives the original source and the new focus and returns the
/// updated source.
#[must_use]
pub fn lens<S, A, G, St>(name: impl Into<String>, getter: G, setter: St) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    G: Fn(&S) -> A + Send + Sync + 'static,
    St: Fn(&S, A) -> S + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Lens)
        .get(move |_, source: &S| Ok(ValueIndexed::new((), getter(source))))
        .set(move |_, focus: A, source: &S| Ok(setter(source, focus)))
        .assemble()
}

/// Creates a lens whose getter and setter may fail.
///
/// Useful for views that parse or validate, where a malformed source should
/// surface as an error rather than a panic.
#[must_use]
pub fn try_lens<S, A, G, St>(name: impl Into<String>, getter: G, setter: St) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    G: Fn(&S) -> Result<A, OpticError> + Send + Sync + 'static,
    St: Fn(&S, A) -> Result<S, OpticError> + Send + Sync + 'static,
{
    OpticBuilder::new(name, OpticKind::Lens)
        .get(move |_, source: &S| getter(source).map(|value| ValueIndexed::new((), value)))
        .set(move |_, focus: A, source: &S| setter(source, focus))
        .assemble()
}

/// Creates a lens for a struct field.
///
/// The expression leaf is named `Struct.field`.
///
/// # Examples
///
/// ```
/// use lambars_optics::lens;
/// use lambars_optics::optics::Context;
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let x = lens!(Point, x);
/// let context = Context::background();
/// let moved = x.modify_all(&context, &Point { x: 1, y: 2 }, |value| value + 10).unwrap();
/// assert_eq!(moved, Point { x: 11, y: 2 });
/// assert_eq!(x.expr().to_string(), "Point.x");
/// ```
#[macro_export]
macro_rules! lens {
    ($struct_type:ident, $field:ident) => {
        $crate::optics::lens(
            concat!(stringify!($struct_type), ".", stringify!($field)),
            |source: &$struct_type| ::core::clone::Clone::clone(&source.$field),
            |source: &$struct_type, value| {
                let mut updated = ::core::clone::Clone::clone(source);
                updated.$field = value;
                updated
            },
        )
    };
    ($struct_type:ident < $($generic:tt),+ >, $field:ident) => {
        $crate::optics::lens(
            concat!(stringify!($struct_type), ".", stringify!($field)),
            |source: &$struct_type<$($generic),+>| ::core::clone::Clone::clone(&source.$field),
            |source: &$struct_type<$($generic),+>, value| {
                let mut updated = ::core::clone::Clone::clone(source);
                updated.$field = value;
                updated
            },
        )
    };
    ($struct_type:path, $field:ident) => {
        $crate::optics::lens(
            concat!(stringify!($struct_type), ".", stringify!($field)),
            |source: &$struct_type| ::core::clone::Clone::clone(&source.$field),
            |source: &$struct_type, value| {
                let mut updated = ::core::clone::Clone::clone(source);
                updated.$field = value;
                updated
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::{Context, ErrorKind};
    use rstest::rstest;

    #[derive(Clone, PartialEq, Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Clone, PartialEq, Debug)]
    struct Wrapper<T> {
        inner: T,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("not a number: {0}")]
    struct NotANumber(String);

    fn parsed() -> Optic<(), String, i64> {
        try_lens(
            "parsed",
            |source: &String| {
                source
                    .parse::<i64>()
                    .map_err(|_| OpticError::domain(NotANumber(source.clone())))
            },
            |_, value: i64| Ok(value.to_string()),
        )
    }

    #[rstest]
    #[case(Point { x: 1, y: 2 }, 5, Point { x: 5, y: 2 })]
    #[case(Point { x: -3, y: 0 }, 0, Point { x: 0, y: 0 })]
    fn macro_lens_sets_the_field(#[case] source: Point, #[case] x: i32, #[case] expected: Point) {
        let context = Context::background();
        assert_eq!(lens!(Point, x).set(&context, x, &source).unwrap(), expected);
    }

    #[test]
    fn macro_lens_supports_generic_structs() {
        let inner = lens!(Wrapper<i32>, inner);
        let context = Context::background();
        let wrapped = Wrapper { inner: 4 };
        assert_eq!(inner.modify_all(&context, &wrapped, |value| value * 2).unwrap().inner, 8);
    }

    #[test]
    fn lens_kind_and_expression() {
        let y = lens!(Point, y);
        assert_eq!(y.kind(), OpticKind::Lens);
        assert_eq!(y.expr().to_string(), "Point.y");
    }

    #[test]
    fn lens_length_is_one() {
        let context = Context::background();
        assert_eq!(lens!(Point, x).length(&context, &Point { x: 0, y: 0 }).unwrap(), 1);
    }

    #[test]
    fn failing_getter_reports_domain_error_with_path() {
        let context = Context::background();
        let error = parsed().get(&context, &"abc".to_string()).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Domain(_)));
        assert_eq!(error.downcast_ref::<NotANumber>().unwrap().0, "abc");
        assert_eq!(error.path().len(), 1);
        assert_eq!(error.path()[0].to_string(), "parsed");
    }

    #[test]
    fn fallible_lens_modifies_valid_sources() {
        let context = Context::background();
        let doubled = parsed()
            .modify_all(&context, &"21".to_string(), |value| value * 2)
            .unwrap();
        assert_eq!(doubled, "42");
    }
}
