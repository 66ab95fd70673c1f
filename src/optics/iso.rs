//! Isomorphisms: lossless two-way conversions.
//!
//! An iso between `S` and `A` obeys two laws:
//!
//! 1. **`ReverseGet` after `Get`**: `reverse_get(get(s)) == s`
//! 2. **`Get` after `ReverseGet`**: `get(reverse_get(a)) == a`
//!
//! # Examples
//!
//! ```
//! use lambars_optics::iso;
//! use lambars_optics::optics::Context;
//!
//! let chars = iso!(|text: &String| text.chars().collect::<Vec<char>>(), |chars: Vec<char>| {
//!     chars.into_iter().collect::<String>()
//! });
//! let context = Context::background();
//! let reversed = chars
//!     .modify_all(&context, &"abc".to_string(), |mut chars| {
//!         chars.reverse();
//!         chars
//!     })
//!     .unwrap();
//! assert_eq!(reversed, "cba");
//! ```

use super::{Focus, Optic, OpticBuilder, OpticKind, ValueIndexed};

/// Creates an iso from a forward and a backward conversion.
#[must_use]
pub fn iso<S, A, F, B>(name: impl Into<String>, forward: F, backward: B) -> Optic<(), S, A>
where
    S: Focus,
    A: Focus,
    F: Fn(&S) -> A + Send + Sync + 'static,
    B: Fn(A) -> S + Send + Sync + 'static,
{
    let backward = std::sync::Arc::new(backward);
    let setter = std::sync::Arc::clone(&backward);
    OpticBuilder::new(name, OpticKind::Iso)
        .get(move |_, source: &S| Ok(ValueIndexed::new((), forward(source))))
        .set(move |_, focus: A, _: &S| Ok(setter(focus)))
        .reverse_get(move |_, focus: A| Ok(backward(focus)))
        .assemble()
}

/// The identity iso, focusing on the whole source.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Context, identity};
///
/// let context = Context::background();
/// assert_eq!(identity::<i32>().get(&context, &7).unwrap().value, 7);
/// ```
#[must_use]
pub fn identity<S: Focus>() -> Optic<(), S, S> {
    iso("identity", S::clone, |focus: S| focus)
}

/// Creates an iso from two conversion closures, named `iso`.
#[macro_export]
macro_rules! iso {
    ($forward:expr, $backward:expr) => {
        $crate::optics::iso("iso", $forward, $backward)
    };
    ($name:expr, $forward:expr, $backward:expr) => {
        $crate::optics::iso($name, $forward, $backward)
    };
}
