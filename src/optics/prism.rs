//! Prisms: an optional focus that can also build a source.
//!
//! A prism focuses on one case of a sum type. Matching may fail, in which
//! case the prism focuses on nothing and updates leave the source unchanged.
//! It obeys two laws:
//!
//! 1. **`MatchEmbed`**: matching an embedded value yields that value.
//!    `first(reverse_get(a)) == Some(a)`
//!
//! 2. **`EmbedMatch`**: embedding a matched value rebuilds the source.
//!    `first(s) == Some(a)` implies `reverse_get(a) == s`

use std::ops::ControlFlow;
use std::sync::Arc;

use super::{Focus, Optic, OpticBuilder, OpticKind, ValueIndexed};

/// Creates a prism from a matcher and an embedding.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, prism};
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Shape {
///     Circle(f64),
///     Square(f64),
/// }
///
/// let circle = prism(
///     "Shape::Circle",
///     |shape: &Shape| match shape {
///         Shape::Circle(radius) => Some(*radius),
///         Shape::Square(_) => None,
///     },
///     Shape::Circle,
/// );
/// let context = Context::background();
/// assert_eq!(circle.values(&context, &Shape::Circle(2.0)).unwrap(), vec![2.0]);
/// assert_eq!(circle.length(&context, &Shape::Square(1.0)).unwrap(), 0);
/// assert_eq!(circle.reverse_get(&context, 3.0).unwrap(), Shape::Circle(3.0));
/// ```
#[must_use]
pub fn prism<S, A, M, E>(name: impl Into<String>, matcher: M, embed: E) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    M: Fn(&S) -> Option<A> + Send + Sync + 'static,
    E: Fn(A) -> S + Send + Sync + 'static,
{
    let matcher = Arc::new(matcher);
    let embed = Arc::new(embed);
    let modify_matcher = Arc::clone(&matcher);
    let modify_embed = Arc::clone(&embed);
    OpticBuilder::new(name, OpticKind::Prism)
        .iterate(move |_, source: &S, yield_| match matcher(source) {
            Some(value) => yield_(Ok(ValueIndexed::new((), value))),
            None => ControlFlow::Continue(()),
        })
        .modify(move |_, source: &S, mapper| match modify_matcher(source) {
            Some(value) => mapper(&(), value).map(|updated| modify_embed(updated)),
            None => Ok(source.clone()),
        })
        .reverse_get(move |_, focus: A| Ok(embed(focus)))
        .assemble()
}

/// The prism focusing on the contents of a `Some`.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, some};
///
/// let context = Context::background();
/// assert_eq!(some::<i32>().modify_all(&context, &Some(1), |x| x + 1).unwrap(), Some(2));
/// assert_eq!(some::<i32>().modify_all(&context, &None, |x| x + 1).unwrap(), None);
/// ```
#[must_use]
pub fn some<A: Focus>() -> Optic<(), Option<A>, A> {
    prism("Some", Option::clone, Some)
}

/// Creates a prism for a single-field enum variant.
///
/// The expression leaf is named `Enum::Variant`.
///
/// # Examples
///
/// ```
/// use lambars_optics::prism;
/// use lambars_optics::optics::Context;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Message {
///     Text(String),
///     Ping,
/// }
///
/// let text = prism!(Message, Text);
/// let context = Context::background();
/// let loud = text
///     .modify_all(&context, &Message::Text("hi".into()), |text| text.to_uppercase())
///     .unwrap();
/// assert_eq!(loud, Message::Text("HI".into()));
/// assert_eq!(text.length(&context, &Message::Ping).unwrap(), 0);
/// ```
#[macro_export]
macro_rules! prism {
    ($enum_type:ident, $variant:ident) => {
        $crate::optics::prism(
            concat!(stringify!($enum_type), "::", stringify!($variant)),
            |source: &$enum_type| match source {
                $enum_type::$variant(value) => Some(::core::clone::Clone::clone(value)),
                #[allow(unreachable_patterns)]
                _ => None,
            },
            |value| $enum_type::$variant(value),
        )
    };
    ($enum_type:ident < $($generic:tt),+ >, $variant:ident) => {
        $crate::optics::prism(
            concat!(stringify!($enum_type), "::", stringify!($variant)),
            |source: &$enum_type<$($generic),+>| match source {
                $enum_type::$variant(value) => Some(::core::clone::Clone::clone(value)),
                #[allow(unreachable_patterns)]
                _ => None,
            },
            |value| $enum_type::$variant(value),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optics::{Context, ErrorKind, Operation};
    use rstest::rstest;

    #[derive(Clone, PartialEq, Debug)]
    enum Json {
        Number(f64),
        Text(String),
        Null,
    }

    #[rstest]
    #[case(Json::Text("a".into()), 1)]
    #[case(Json::Number(1.0), 0)]
    #[case(Json::Null, 0)]
    fn macro_prism_matches_only_its_variant(#[case] source: Json, #[case] expected: usize) {
        let context = Context::background();
        assert_eq!(prism!(Json, Text).length(&context, &source).unwrap(), expected);
    }

    #[test]
    fn set_on_a_mismatch_keeps_the_source() {
        let context = Context::background();
        let number = prism!(Json, Number);
        assert_eq!(number.set(&context, 2.0, &Json::Null).unwrap(), Json::Null);
        assert_eq!(number.set(&context, 2.0, &Json::Number(1.0)).unwrap(), Json::Number(2.0));
    }

    #[test]
    fn get_is_unsupported_on_a_prism() {
        let context = Context::background();
        let error = some::<i32>().get(&context, &Some(1)).unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::UnsupportedOperation {
                operation: Operation::Get,
                ..
            }
        ));
    }

    #[test]
    fn macro_prism_supports_generic_enums() {
        let context = Context::background();
        let ok = prism!(Result<i32, String>, Ok);
        assert_eq!(ok.values(&context, &Ok(3)).unwrap(), vec![3]);
        assert_eq!(ok.expr().to_string(), "Result::Ok");
    }
}
