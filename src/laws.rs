//! Law and consistency verification for optics.
//!
//! Each check runs an optic against sample values and reports the first
//! disagreement as a [`LawViolation`]. The checks are meant for tests and
//! property-based suites:
//!
//! ```
//! use lambars_optics::lens;
//! use lambars_optics::laws;
//! use lambars_optics::optics::Context;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let context = Context::background();
//! let violations = laws::check_all(&context, &lens!(Point, x), &Point { x: 1, y: 2 }, 5, 9);
//! assert!(violations.is_empty());
//! ```
//!
//! [`check_all`] picks the checks that apply to the optic's kind:
//!
//! | Kind                  | Checks                                      |
//! |-----------------------|---------------------------------------------|
//! | every kind            | universal                                   |
//! | `Lens`                | lens                                        |
//! | `Iso`                 | lens, iso                                   |
//! | `Prism`               | prism, traversal                            |
//! | `Traversal`           | traversal                                   |

use std::fmt;
use std::ops::ControlFlow;

use crate::optics::{Context, Focus, Index, Optic, OpticError, OpticKind, ValueIndexed};

/// The laws and consistency properties the harness verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Law {
    /// `set(get(s), s) == s`
    GetSet,
    /// `get(set(a, s)) == a`
    SetGet,
    /// `set(b, set(a, s)) == set(b, s)`
    SetSet,
    /// `reverse_get(get(s)) == s`
    IsoForward,
    /// `get(reverse_get(a)) == a`
    IsoBackward,
    /// A matched focus embeds back into the source it came from.
    PrismRoundTrip,
    /// An embedded focus matches again.
    PrismRematch,
    /// `modify(s, id) == s`
    ModifyIdentity,
    /// Two iterations of one source agree.
    IterateDeterministic,
    /// `length` counts what `iterate` yields.
    LengthMatchesIterate,
    /// `get` returns the first element `iterate` yields.
    GetMatchesIterate,
    /// `indexed_get` returns the elements of `iterate` with a matching index.
    IndexedGetMatchesIterate,
    /// `modify` with a constant agrees with `set`.
    ModifyConstMatchesSet,
    /// `modify` visits exactly what `iterate` yields, in order.
    ModifyVisitsIterate,
    /// An operation the kind supports failed outright.
    OperationFailed,
}

impl fmt::Display for Law {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GetSet => "get-set",
            Self::SetGet => "set-get",
            Self::SetSet => "set-set",
            Self::IsoForward => "iso forward",
            Self::IsoBackward => "iso backward",
            Self::PrismRoundTrip => "prism round trip",
            Self::PrismRematch => "prism rematch",
            Self::ModifyIdentity => "modify identity",
            Self::IterateDeterministic => "iterate deterministic",
            Self::LengthMatchesIterate => "length matches iterate",
            Self::GetMatchesIterate => "get matches iterate",
            Self::IndexedGetMatchesIterate => "indexed get matches iterate",
            Self::ModifyConstMatchesSet => "modify const matches set",
            Self::ModifyVisitsIterate => "modify visits iterate",
            Self::OperationFailed => "operation failed",
        };
        formatter.write_str(name)
    }
}

/// A law that did not hold, with the observed disagreement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("law `{law}` violated by `{optic}`: {detail}")]
pub struct LawViolation {
    /// The law that failed.
    pub law: Law,
    /// Expression of the optic under test.
    pub optic: String,
    /// What was observed.
    pub detail: String,
}

impl LawViolation {
    fn new<I, S, A>(optic: &Optic<I, S, A>, law: Law, detail: String) -> Self {
        Self {
            law,
            optic: optic.expr().to_string(),
            detail,
        }
    }
}

fn attempt<I, S, A, T>(
    optic: &Optic<I, S, A>,
    law: Law,
    outcome: Result<T, OpticError>,
) -> Result<T, LawViolation> {
    outcome.map_err(|error| {
        LawViolation::new(optic, Law::OperationFailed, format!("while checking {law}: {error}"))
    })
}

fn expect_equal<I, S, A, T>(
    optic: &Optic<I, S, A>,
    law: Law,
    left: &T,
    right: &T,
) -> Result<(), LawViolation>
where
    T: PartialEq + fmt::Debug,
{
    if left == right {
        Ok(())
    } else {
        Err(LawViolation::new(
            optic,
            law,
            format!("{left:?} != {right:?}"),
        ))
    }
}

/// Verifies the three lens laws with the foci `first` and `second`.
///
/// # Errors
///
/// The first law that does not hold.
pub fn check_lens<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    first: A,
    second: A,
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus + PartialEq + fmt::Debug,
{
    let current = attempt(optic, Law::GetSet, optic.get(context, source))?.value;
    let restored = attempt(optic, Law::GetSet, optic.set(context, current, source))?;
    expect_equal(optic, Law::GetSet, &restored, source)?;

    let updated = attempt(optic, Law::SetGet, optic.set(context, first.clone(), source))?;
    let observed = attempt(optic, Law::SetGet, optic.get(context, &updated))?.value;
    expect_equal(optic, Law::SetGet, &observed, &first)?;

    let twice = attempt(optic, Law::SetSet, optic.set(context, second.clone(), &updated))?;
    let once = attempt(optic, Law::SetSet, optic.set(context, second, source))?;
    expect_equal(optic, Law::SetSet, &twice, &once)
}

/// Verifies both iso round trips, starting from `source` and from `focus`.
///
/// # Errors
///
/// The first law that does not hold.
pub fn check_iso<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    focus: A,
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus + PartialEq + fmt::Debug,
{
    let forward = attempt(optic, Law::IsoForward, optic.get(context, source))?.value;
    let back = attempt(optic, Law::IsoForward, optic.reverse_get(context, forward))?;
    expect_equal(optic, Law::IsoForward, &back, source)?;

    let built = attempt(optic, Law::IsoBackward, optic.reverse_get(context, focus.clone()))?;
    let again = attempt(optic, Law::IsoBackward, optic.get(context, &built))?.value;
    expect_equal(optic, Law::IsoBackward, &again, &focus)
}

fn first_value<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<Option<A>, OpticError>
where
    I: Index,
    S: Focus,
    A: Focus,
{
    let mut found = None;
    let _ = optic.iterate(context, source, &mut |item| {
        found = Some(item);
        ControlFlow::Break(())
    });
    found.transpose().map(|element| element.map(|element| element.value))
}

/// Verifies the prism laws: a match embeds back into `source`, and `focus`
/// matches again once embedded.
///
/// # Errors
///
/// The first law that does not hold.
pub fn check_prism<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    focus: A,
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus + PartialEq + fmt::Debug,
{
    if let Some(matched) = attempt(
        optic,
        Law::PrismRoundTrip,
        first_value(context, optic, source),
    )? {
        let embedded = attempt(
            optic,
            Law::PrismRoundTrip,
            optic.reverse_get(context, matched),
        )?;
        expect_equal(optic, Law::PrismRoundTrip, &embedded, source)?;
    }

    let embedded = attempt(
        optic,
        Law::PrismRematch,
        optic.reverse_get(context, focus.clone()),
    )?;
    let rematched = attempt(
        optic,
        Law::PrismRematch,
        first_value(context, optic, &embedded),
    )?;
    expect_equal(optic, Law::PrismRematch, &rematched, &Some(focus))
}

/// Verifies that modifying with the identity leaves `source` unchanged.
///
/// # Errors
///
/// The law, when it does not hold.
pub fn check_traversal<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus,
{
    let unchanged = attempt(
        optic,
        Law::ModifyIdentity,
        optic.modify(context, source, &mut |_, value| Ok(value)),
    )?;
    expect_equal(optic, Law::ModifyIdentity, &unchanged, source)
}

/// Verifies the consistency properties every optic must satisfy, using
/// `replacement` as the constant focus for write checks.
///
/// Read checks always run. `get` is compared against iteration for
/// single-focus kinds, and the write checks run for writable kinds.
///
/// # Errors
///
/// The first property that does not hold.
pub fn check_universal<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    replacement: A,
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus + PartialEq + fmt::Debug,
{
    let elements = attempt(optic, Law::IterateDeterministic, optic.collect(context, source))?;
    let again = attempt(optic, Law::IterateDeterministic, optic.collect(context, source))?;
    expect_equal(optic, Law::IterateDeterministic, &again, &elements)?;

    let length = attempt(optic, Law::LengthMatchesIterate, optic.length(context, source))?;
    expect_equal(optic, Law::LengthMatchesIterate, &length, &elements.len())?;

    if optic.kind().is_single() {
        let got = optic.get(context, source);
        match (got, elements.first()) {
            (Ok(element), Some(first)) => {
                expect_equal(optic, Law::GetMatchesIterate, &element, first)?;
            }
            (Err(error), None) if error.is_empty_result() => {}
            (got, first) => {
                return Err(LawViolation::new(
                    optic,
                    Law::GetMatchesIterate,
                    format!("get gave {got:?}, iterate started with {first:?}"),
                ));
            }
        }
    }

    check_indexed_get(context, optic, source, &elements)?;

    if optic.kind().is_writable() {
        check_traversal(context, optic, source)?;

        let constant = attempt(
            optic,
            Law::ModifyConstMatchesSet,
            optic.modify(context, source, &mut |_, _| Ok(replacement.clone())),
        )?;
        let set = attempt(
            optic,
            Law::ModifyConstMatchesSet,
            optic.set(context, replacement, source),
        )?;
        expect_equal(optic, Law::ModifyConstMatchesSet, &constant, &set)?;

        let mut visited = Vec::new();
        attempt(
            optic,
            Law::ModifyVisitsIterate,
            optic.modify(context, source, &mut |index, value: A| {
                visited.push(ValueIndexed::new(index.clone(), value.clone()));
                Ok(value)
            }),
        )?;
        expect_equal(optic, Law::ModifyVisitsIterate, &visited, &elements)?;
    }
    Ok(())
}

/// Every distinct index of `elements` must select exactly the elements of
/// iteration that carry an equal index.
fn check_indexed_get<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    elements: &[ValueIndexed<I, A>],
) -> Result<(), LawViolation>
where
    I: Index,
    S: Focus,
    A: Focus + PartialEq + fmt::Debug,
{
    let mut distinct: Vec<&I> = Vec::new();
    for element in elements {
        if !distinct.iter().any(|seen| **seen == element.index) {
            distinct.push(&element.index);
        }
    }
    for index in distinct {
        let mut expected = Vec::new();
        for element in elements {
            if attempt(
                optic,
                Law::IndexedGetMatchesIterate,
                optic.index_eq(index, &element.index),
            )? {
                expected.push(element.clone());
            }
        }
        let found = attempt(
            optic,
            Law::IndexedGetMatchesIterate,
            optic.collect_indexed(context, index, source),
        )?;
        expect_equal(optic, Law::IndexedGetMatchesIterate, &found, &expected)?;
    }
    Ok(())
}

/// Runs every check that applies to the optic's kind and collects the
/// violations.
///
/// `first` and `second` serve as sample foci for the write checks.
pub fn check_all<I, S, A>(
    context: &Context,
    optic: &Optic<I, S, A>,
    source: &S,
    first: A,
    second: A,
) -> Vec<LawViolation>
where
    I: Index,
    S: Focus + PartialEq + fmt::Debug,
    A: Focus + PartialEq + fmt::Debug,
{
    let mut outcomes = vec![check_universal(context, optic, source, first.clone())];
    match optic.kind() {
        OpticKind::Lens => {
            outcomes.push(check_lens(context, optic, source, first, second));
        }
        OpticKind::Iso => {
            outcomes.push(check_lens(context, optic, source, first.clone(), second));
            outcomes.push(check_iso(context, optic, source, first));
        }
        OpticKind::Prism => {
            outcomes.push(check_prism(context, optic, source, first));
            outcomes.push(check_traversal(context, optic, source));
        }
        OpticKind::Traversal => {
            outcomes.push(check_traversal(context, optic, source));
        }
        OpticKind::Getter | OpticKind::Iteration => {}
    }
    outcomes.into_iter().filter_map(Result::err).collect()
}
