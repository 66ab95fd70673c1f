//! Integration tests for the window combinators.
//!
//! Covers the positional and predicate windows through the public API:
//!
//! - [`taking`], [`dropping`]: positional prefix and suffix
//! - [`taking_while`], [`dropping_while`], [`trimming_while`]: predicate runs
//! - [`filtered`], [`element_at`]: selection
//! - [`windowed`]: custom rules built from a [`Window`]

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lambars_optics::lens;
use lambars_optics::optics::{
    Context, ErrorKind, Optic, OpticError, OpticKind, Predicate, Transition, ValueIndexed, Window,
    dropping, dropping_while, element_at, filtered, first, iteration, taking, taking_while,
    traverse_vec, trimming_while, try_getter, windowed,
};
use proptest::prelude::*;
use rstest::rstest;

// =============================================================================
// Test Structures
// =============================================================================

#[derive(Clone, PartialEq, Debug)]
struct Inventory {
    counts: Vec<i32>,
}

#[derive(Debug, thiserror::Error)]
#[error("cannot judge {0}")]
struct Unjudgeable(i32);

fn numbers() -> Optic<usize, Vec<i32>, i32> {
    traverse_vec::<i32>()
}

fn greater_than(limit: i32) -> Predicate<usize, i32> {
    Predicate::new(format!("> {limit}"), move |value: &i32| *value > limit)
}

/// Parses every row, failing on rows that are not integers.
fn parsed_rows() -> Optic<(), Vec<String>, i32> {
    traverse_vec::<String>().compose(try_getter("parse", |row: &String| {
        row.parse::<i32>().map_err(OpticError::domain)
    }))
}

fn rows(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Counts up from zero forever.
fn naturals() -> Optic<usize, (), u64> {
    iteration("naturals", |_: &(), yield_| {
        let mut next = 0_u64;
        loop {
            let position = usize::try_from(next).unwrap_or(usize::MAX);
            yield_(Ok(ValueIndexed::new(position, next)))?;
            next += 1;
        }
    })
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn taking_of_filtered_yields_the_first_matches() {
    let context = Context::background();
    let optic = taking(filtered(numbers(), greater_than(3)), 2);
    assert_eq!(optic.values(&context, &vec![5, 3, 8, 1]).unwrap(), vec![5, 8]);

    let inclusive = taking(filtered(numbers(), greater_than(2)), 2);
    assert_eq!(inclusive.values(&context, &vec![5, 3, 8, 1]).unwrap(), vec![5, 3]);
}

#[test]
fn modify_touches_only_the_window() {
    let context = Context::background();
    let optic = taking(filtered(numbers(), greater_than(3)), 2);
    let updated = optic
        .modify_all(&context, &vec![5, 3, 8, 1, 9], |value| value * 100)
        .unwrap();
    assert_eq!(updated, vec![500, 3, 800, 1, 9]);
}

#[test]
fn windows_compose_under_a_lens() {
    let context = Context::background();
    let optic = lens!(Inventory, counts).compose(dropping(numbers(), 1));
    let inventory = Inventory {
        counts: vec![1, 2, 3],
    };
    assert_eq!(
        optic.modify_all(&context, &inventory, |value| -value).unwrap(),
        Inventory {
            counts: vec![1, -2, -3]
        }
    );
    assert_eq!(
        optic.expr().to_string(),
        "Compose(Inventory.counts, Dropping[1](Vec))"
    );
}

#[test]
fn taking_terminates_on_unbounded_sources() {
    let context = Context::background();
    let first_three = taking(naturals(), 3);
    assert_eq!(first_three.values(&context, &()).unwrap(), vec![0, 1, 2]);
    assert_eq!(first_three.length(&context, &()).unwrap(), 3);
    assert_eq!(first_three.kind(), OpticKind::Iteration);
}

#[test]
fn element_at_focuses_one_position() {
    let context = Context::background();
    let third = element_at(numbers(), 2);
    assert_eq!(third.values(&context, &vec![7, 8, 9, 10]).unwrap(), vec![9]);
    assert_eq!(
        third.modify_all(&context, &vec![7, 8, 9, 10], |_| 0).unwrap(),
        vec![7, 8, 0, 10]
    );
    assert!(third.values(&context, &vec![7]).unwrap().is_empty());
}

#[test]
fn get_on_an_empty_window_is_empty_result() {
    let context = Context::background();
    let head = first(taking(filtered(numbers(), greater_than(100)), 1));
    assert!(head.get(&context, &vec![1, 2]).unwrap_err().is_empty_result());
    assert_eq!(head.get(&context, &vec![1, 200]).unwrap().value, 200);
}

#[rstest]
#[case(vec![], vec![])]
#[case(vec![0, 0], vec![])]
#[case(vec![0, 1, 0, 2, 0], vec![1, 0, 2])]
#[case(vec![1, 2], vec![1, 2])]
fn trimming_while_strips_both_ends(#[case] source: Vec<i32>, #[case] expected: Vec<i32>) {
    let context = Context::background();
    let zero = Predicate::new("zero", |value: &i32| *value == 0);
    let trimmed = trimming_while(numbers(), zero);
    assert_eq!(trimmed.values(&context, &source).unwrap(), expected);
}

#[test]
fn trimming_while_is_described_once() {
    let zero = Predicate::<usize, i32>::new("zero", |value: &i32| *value == 0);
    let trimmed = trimming_while(numbers(), zero);
    assert_eq!(trimmed.expr().to_string(), "TrimmingWhile(Vec, Predicate[zero])");
    assert!(trimmed.is_instrumented());
}

// =============================================================================
// Custom windows
// =============================================================================

#[test]
fn windowed_runs_a_custom_rule() {
    let context = Context::background();
    // Skip until the first negative value, then take everything after it.
    let from_negative = Window::new(
        |_| true,
        Predicate::new("negative", |value: &i32| *value < 0),
        Transition::YieldAll,
        Transition::Continue,
    );
    let optic = windowed(numbers(), "FromNegative", from_negative);
    assert_eq!(
        optic.values(&context, &vec![3, 1, -2, 5, 6]).unwrap(),
        vec![-2, 5, 6]
    );
    assert_eq!(
        optic.expr().to_string(),
        "FromNegative(Vec, Predicate[negative])"
    );
}

#[test]
fn every_other_element_by_position() {
    let context = Context::background();
    let even_positions = Window::new(
        |position| position % 2 == 0,
        Predicate::always(),
        Transition::Continue,
        Transition::Continue,
    );
    let optic = windowed(numbers(), "EvenPositions", even_positions);
    assert_eq!(
        optic.modify_all(&context, &vec![1, 1, 1, 1, 1], |value| value + 1).unwrap(),
        vec![2, 1, 2, 1, 2]
    );
}

// =============================================================================
// Errors and cancellation
// =============================================================================

#[test]
fn predicate_errors_end_the_sequence_with_a_path() {
    let context = Context::background();
    let judging = Predicate::fallible("judging", |_: &usize, value: &i32| {
        if *value < 0 {
            Err(OpticError::domain(Unjudgeable(*value)))
        } else {
            Ok(*value > 1)
        }
    });
    let optic = filtered(numbers(), judging);
    let error = optic.values(&context, &vec![2, -1, 3]).unwrap_err();
    assert!(error.downcast_ref::<Unjudgeable>().is_some());
    let path: Vec<String> = error.path().iter().map(ToString::to_string).collect();
    assert_eq!(
        path,
        vec!["Predicate[judging]", "Filtered(Vec, Predicate[judging])"]
    );
}

#[rstest]
#[case(&["1", "2", "x"], 2, vec![1, 2])]
#[case(&["1", "2", "x", "y"], 2, vec![1, 2])]
#[case(&["x"], 0, vec![])]
#[case(&["7"], 3, vec![7])]
fn taking_never_reads_past_its_window(
    #[case] source: &[&str],
    #[case] count: usize,
    #[case] expected: Vec<i32>,
) {
    let context = Context::background();
    let optic = taking(parsed_rows(), count);
    assert_eq!(optic.values(&context, &rows(source)).unwrap(), expected);
    assert_eq!(optic.length(&context, &rows(source)).unwrap(), expected.len());
}

#[test]
fn errors_inside_the_window_still_surface() {
    let context = Context::background();
    let optic = taking(parsed_rows(), 2);
    let error = optic.values(&context, &rows(&["1", "x", "3"])).unwrap_err();
    assert!(error.downcast_ref::<std::num::ParseIntError>().is_some());
    assert_eq!(
        error.path().last().map(ToString::to_string),
        Some("Taking[2](Compose(Vec, parse))".to_string())
    );
}

#[test]
fn positional_stop_ends_before_the_next_element() {
    let context = Context::background();
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let counted = iteration("counted", move |source: &Vec<i32>, yield_| {
        for (index, value) in source.iter().enumerate() {
            counter.fetch_add(1, Ordering::SeqCst);
            yield_(Ok(ValueIndexed::new(index, *value)))?;
        }
        ControlFlow::Continue(())
    });
    let optic = taking(counted, 2);
    assert_eq!(optic.values(&context, &vec![4, 5, 6, 7]).unwrap(), vec![4, 5]);
    assert_eq!(pulled.load(Ordering::SeqCst), 2);
}

#[test]
fn cancellation_stops_a_long_run_of_misses() {
    let (context, handle) = Context::cancellable();
    let inspected = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inspected);
    let cancelling = Predicate::new("never", move |_: &u64| {
        if counter.fetch_add(1, Ordering::SeqCst) == 10 {
            handle.cancel("enough");
        }
        false
    });
    let optic = filtered(naturals(), cancelling);
    let error = optic.values(&context, &()).unwrap_err();
    assert!(error.is_cancelled());
    assert!(matches!(error.kind(), ErrorKind::Cancelled(_)));
    assert!(inspected.load(Ordering::SeqCst) <= 12);
}

#[test]
fn consumer_stop_is_respected() {
    let context = Context::background();
    let optic = dropping_while(numbers(), greater_than(0));
    let mut seen = Vec::new();
    let flow = optic.iterate(&context, &vec![1, 0, 4, 5, 6], &mut |item| {
        seen.push(item.map(|element| element.value).unwrap_or_default());
        if seen.len() == 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert!(flow.is_break());
    assert_eq!(seen, vec![0, 4]);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn taking_and_dropping_partition_the_source(
        values in prop::collection::vec(any::<i32>(), 0..30),
        count in 0_usize..40,
    ) {
        let context = Context::background();
        let mut joined = taking(numbers(), count).values(&context, &values).unwrap();
        prop_assert_eq!(joined.len(), count.min(values.len()));
        joined.extend(dropping(numbers(), count).values(&context, &values).unwrap());
        prop_assert_eq!(joined, values);
    }

    #[test]
    fn while_windows_partition_the_source(values in prop::collection::vec(-5_i32..5, 0..30)) {
        let context = Context::background();
        let positive = greater_than(0);
        let mut joined = taking_while(numbers(), positive.clone())
            .values(&context, &values)
            .unwrap();
        joined.extend(dropping_while(numbers(), positive).values(&context, &values).unwrap());
        prop_assert_eq!(joined, values);
    }

    #[test]
    fn filtered_agrees_with_iterator_filter(values in prop::collection::vec(any::<i32>(), 0..30)) {
        let context = Context::background();
        let expected: Vec<i32> = values.iter().copied().filter(|value| *value > 3).collect();
        let optic = filtered(numbers(), greater_than(3));
        prop_assert_eq!(optic.length(&context, &values).unwrap(), expected.len());
        prop_assert_eq!(optic.values(&context, &values).unwrap(), expected);
    }
}
