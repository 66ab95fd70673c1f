//! Property-based tests running the law harness over every kind of optic.
//!
//! - **Lens laws**: get-set, set-get and set-set
//! - **Iso laws**: both round trips
//! - **Prism laws**: round trip and rematch
//! - **Universal consistency**: iterate, length, get, indexed get and modify
//!   agree with each other for any optic
//!
//! Lawful optics must pass for arbitrary inputs; deliberately broken optics
//! must be caught.

use std::ops::ControlFlow;

use lambars_optics::laws::{self, Law};
use lambars_optics::optics::{
    Comparator, Context, ErrorFilter, ErrorKind, Optic, OpticBuilder, OpticError, OpticKind,
    Predicate, ValueIndexed, catching, dropping, filtered, identity, ignoring, ordered, reversed,
    some, stop_on, taking, traverse_vec, trimming_while, try_lens,
};
use lambars_optics::{iso, lens, prism};
use proptest::prelude::*;

// =============================================================================
// Test Structures
// =============================================================================

#[derive(Clone, PartialEq, Debug)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Clone, PartialEq, Debug)]
struct Polygon {
    label: String,
    corners: Vec<Point>,
}

#[derive(Clone, PartialEq, Debug)]
enum Shape {
    Circle(u32),
    Square(u32),
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (any::<i32>(), any::<i32>()).prop_map(|(x, y)| Point { x, y })
}

fn polygon_strategy() -> impl Strategy<Value = Polygon> {
    ("[a-z]{0,6}", prop::collection::vec(point_strategy(), 0..8))
        .prop_map(|(label, corners)| Polygon { label, corners })
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    prop_oneof![
        any::<u32>().prop_map(Shape::Circle),
        any::<u32>().prop_map(Shape::Square),
    ]
}

fn corner_xs() -> Optic<usize, Polygon, i32> {
    lens!(Polygon, corners)
        .compose(traverse_vec::<Point>())
        .compose_left(lens!(Point, x))
        .unwrap_or_else(|error| panic!("{error}"))
}

/// A writable view of each row as an integer; non-numeric rows fail.
fn parsed_rows() -> Optic<(), Vec<String>, i32> {
    traverse_vec::<String>().compose(try_lens(
        "parse",
        |row: &String| row.parse::<i32>().map_err(OpticError::domain),
        |_: &String, value: i32| Ok(value.to_string()),
    ))
}

fn rows(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

// =============================================================================
// Lawful optics
// =============================================================================

proptest! {
    #[test]
    fn field_lenses_are_lawful(
        point in point_strategy(),
        first in any::<i32>(),
        second in any::<i32>(),
    ) {
        let context = Context::background();
        let violations = laws::check_all(&context, &lens!(Point, x), &point, first, second);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn composed_lenses_are_lawful(
        polygon in polygon_strategy(),
        first in "[a-z]{0,4}",
        second in "[a-z]{0,4}",
    ) {
        let context = Context::background();
        let label = identity::<Polygon>().compose(lens!(Polygon, label));
        prop_assert_eq!(label.kind(), OpticKind::Lens);
        let violations = laws::check_all(&context, &label, &polygon, first, second);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn isos_are_lawful(value in any::<i64>(), first in any::<i64>(), second in any::<i64>()) {
        let context = Context::background();
        let negate = iso!(
            "negate",
            |value: &i64| value.wrapping_neg(),
            |value: i64| value.wrapping_neg()
        );
        let violations = laws::check_all(&context, &negate, &value, first, second);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn prisms_are_lawful(
        shape in shape_strategy(),
        first in any::<u32>(),
        second in any::<u32>(),
    ) {
        let context = Context::background();
        let circle = prism!(Shape, Circle);
        let violations = laws::check_all(&context, &circle, &shape, first, second);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn option_prism_is_lawful(value in any::<Option<i16>>(), first in any::<i16>()) {
        let context = Context::background();
        let violations = laws::check_all(&context, &some::<i16>(), &value, first, first);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn nested_traversals_are_consistent(polygon in polygon_strategy(), first in any::<i32>()) {
        let context = Context::background();
        let violations = laws::check_all(&context, &corner_xs(), &polygon, first, first);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn windows_are_consistent(
        values in prop::collection::vec(-10_i32..10, 0..20),
        count in 0_usize..25,
        first in any::<i32>(),
    ) {
        let context = Context::background();
        let positive = Predicate::new("positive", |value: &i32| *value > 0);
        let candidates = vec![
            taking(traverse_vec::<i32>(), count),
            dropping(traverse_vec::<i32>(), count),
            filtered(traverse_vec::<i32>(), positive.clone()),
            trimming_while(traverse_vec::<i32>(), positive),
        ];
        for optic in &candidates {
            let violations = laws::check_all(&context, optic, &values, first, first);
            prop_assert!(violations.is_empty(), "{}: {:?}", optic.expr(), violations);
        }
    }

    #[test]
    fn reorderings_are_consistent(
        values in prop::collection::vec(-10_i32..10, 0..20),
        first in any::<i32>(),
    ) {
        let context = Context::background();
        let candidates = vec![
            ordered(traverse_vec::<i32>(), Comparator::natural()),
            ordered(traverse_vec::<i32>(), Comparator::natural().desc()),
            reversed(traverse_vec::<i32>()),
        ];
        for optic in &candidates {
            let violations = laws::check_all(&context, optic, &values, first, first);
            prop_assert!(violations.is_empty(), "{}: {:?}", optic.expr(), violations);
        }
    }
}

#[test]
fn recovered_writable_optics_stay_consistent() {
    let context = Context::background();
    let source = rows(&["1", "x", "3"]);
    let parse_error = || ErrorFilter::domain::<std::num::ParseIntError>();
    let candidates = vec![
        ignoring(parsed_rows(), parse_error()),
        stop_on(parsed_rows(), parse_error()),
        catching(parsed_rows(), parse_error(), |_| Some(ValueIndexed::new((), 0))),
    ];
    for optic in &candidates {
        assert_eq!(optic.kind(), OpticKind::Iteration);
        let violations = laws::check_all(&context, optic, &source, 7, 8);
        assert!(violations.is_empty(), "{}: {:?}", optic.expr(), violations);
        let error = optic.modify_all(&context, &source, |value| value + 1).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::UnsupportedOperation { .. }));
    }
}

#[test]
fn windows_past_a_failing_element_stay_consistent() {
    let context = Context::background();
    let optic = taking(parsed_rows(), 2);
    assert_eq!(optic.values(&context, &rows(&["1", "2", "x"])).unwrap(), vec![1, 2]);
    let violations = laws::check_universal(&context, &optic, &rows(&["1", "2"]), 9);
    assert!(violations.is_ok(), "{violations:?}");
}

// =============================================================================
// Broken optics
// =============================================================================

#[test]
fn lens_clamping_writes_breaks_set_get() {
    let clamped = lambars_optics::optics::lens(
        "clamped",
        |point: &Point| point.x,
        |point: &Point, value: i32| Point {
            x: value.min(5),
            y: point.y,
        },
    );
    let context = Context::background();
    let violation = laws::check_lens(&context, &clamped, &Point { x: 1, y: 2 }, 7, 8).unwrap_err();
    assert_eq!(violation.law, Law::SetGet);
    assert_eq!(violation.optic, "clamped");
    assert_eq!(violation.detail, "5 != 7");
}

#[test]
fn lossy_iso_breaks_a_round_trip() {
    let halve = iso!("halve", |value: &i32| value / 2, |value: i32| value * 2);
    let context = Context::background();
    let violation = laws::check_iso(&context, &halve, &3, 4).unwrap_err();
    assert_eq!(violation.law, Law::IsoForward);
}

#[test]
fn prism_embedding_elsewhere_breaks_rematch() {
    let misplaced = lambars_optics::optics::prism(
        "misplaced",
        |shape: &Shape| match shape {
            Shape::Circle(radius) => Some(*radius),
            Shape::Square(_) => None,
        },
        Shape::Square,
    );
    let context = Context::background();
    let violation = laws::check_prism(&context, &misplaced, &Shape::Square(1), 5).unwrap_err();
    assert_eq!(violation.law, Law::PrismRematch);
}

#[test]
fn length_disagreeing_with_iterate_is_reported() {
    let miscounted = OpticBuilder::<usize, Vec<i32>, i32>::new("miscounted", OpticKind::Iteration);
    let miscounted = miscounted
        .iterate(|_, source: &Vec<i32>, yield_| {
            for (index, value) in source.iter().enumerate() {
                yield_(Ok(ValueIndexed::new(index, *value)))?;
            }
            ControlFlow::Continue(())
        })
        .length(|_, source: &Vec<i32>| Ok(source.len() + 1))
        .build()
        .unwrap();
    let context = Context::background();
    let violations = laws::check_all(&context, &miscounted, &vec![1, 2], 0, 0);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].law, Law::LengthMatchesIterate);
    assert!(violations[0].to_string().contains("miscounted"));
}

#[test]
fn nondeterministic_iteration_is_reported() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let runs = AtomicUsize::new(0);
    let flaky = OpticBuilder::<usize, (), usize>::new("flaky", OpticKind::Iteration)
        .iterate(move |_, _: &(), yield_| {
            let run = runs.fetch_add(1, Ordering::SeqCst);
            yield_(Ok(ValueIndexed::new(0, run)))
        })
        .build()
        .unwrap();
    let context = Context::background();
    let violation = laws::check_universal(&context, &flaky, &(), 0).unwrap_err();
    assert_eq!(violation.law, Law::IterateDeterministic);
}
