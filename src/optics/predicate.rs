//! Predicates and comparators used by the derived combinators.
//!
//! Both carry a name that becomes a node in the expression tree, so an
//! external interpreter can translate them and an error path can point at
//! them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{Expr, OpticError, ValueIndexed};

type TestFn<I, A> = dyn Fn(&I, &A) -> Result<bool, OpticError> + Send + Sync;
type CompareFn<I, A> =
    dyn Fn(&ValueIndexed<I, A>, &ValueIndexed<I, A>) -> Result<Option<Ordering>, OpticError>
        + Send
        + Sync;

/// A named, possibly fallible test over an element and its index.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::Predicate;
///
/// let positive = Predicate::<usize, i32>::new("positive", |value| *value > 0);
/// assert!(positive.test(&0, &5).unwrap());
/// assert!(!positive.negate().test(&0, &5).unwrap());
/// ```
pub struct Predicate<I, A> {
    name: Arc<str>,
    test: Arc<TestFn<I, A>>,
}

impl<I, A> Clone for Predicate<I, A> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            test: Arc::clone(&self.test),
        }
    }
}

impl<I, A> fmt::Debug for Predicate<I, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Predicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<I: 'static, A: 'static> Predicate<I, A> {
    /// A test over the value only.
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        Self::fallible(name, move |_, value| Ok(test(value)))
    }

    /// A test over the index and the value.
    pub fn indexed<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&I, &A) -> bool + Send + Sync + 'static,
    {
        Self::fallible(name, move |index, value| Ok(test(index, value)))
    }

    /// A test that may fail.
    pub fn fallible<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&I, &A) -> Result<bool, OpticError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            test: Arc::new(test),
        }
    }

    /// A predicate accepting every element.
    #[must_use]
    pub fn always() -> Self {
        Self::fallible("always", |_, _| Ok(true))
    }

    /// Runs the test.
    ///
    /// # Errors
    ///
    /// Whatever the underlying test raises.
    pub fn test(&self, index: &I, value: &A) -> Result<bool, OpticError> {
        (self.test)(index, value)
    }

    /// The logical negation of this predicate.
    #[must_use]
    pub fn negate(&self) -> Self {
        let test = Arc::clone(&self.test);
        Self::fallible(format!("not {}", self.name), move |index, value| {
            test(index, value).map(|outcome| !outcome)
        })
    }

    /// The name given at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The expression node describing this predicate.
    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::predicate(self.name.as_ref())
    }
}

/// A named, possibly fallible, possibly partial ordering of elements.
///
/// `Ok(None)` means "no opinion" and is treated as "not less than" in both
/// directions, which keeps the original relative order of such elements.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{Comparator, ValueIndexed};
///
/// let descending = Comparator::<usize, i32>::natural().desc();
/// let (low, high) = (ValueIndexed::new(0, 1), ValueIndexed::new(1, 2));
/// assert!(descending.less(&high, &low).unwrap());
/// ```
pub struct Comparator<I, A> {
    name: Arc<str>,
    compare: Arc<CompareFn<I, A>>,
}

impl<I, A> Clone for Comparator<I, A> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<I, A> fmt::Debug for Comparator<I, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Comparator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<I: 'static, A: 'static> Comparator<I, A> {
    /// A comparator over whole elements, index included.
    pub fn new<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&ValueIndexed<I, A>, &ValueIndexed<I, A>) -> Result<Option<Ordering>, OpticError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            compare: Arc::new(compare),
        }
    }

    /// A fallible comparator over values.
    pub fn fallible<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&A, &A) -> Result<Option<Ordering>, OpticError> + Send + Sync + 'static,
    {
        Self::new(name, move |left, right| compare(&left.value, &right.value))
    }

    /// Orders values by a key.
    pub fn by_key<K, F>(name: impl Into<String>, key: F) -> Self
    where
        K: Ord,
        F: Fn(&A) -> K + Send + Sync + 'static,
    {
        Self::new(name, move |left, right| {
            Ok(Some(key(&left.value).cmp(&key(&right.value))))
        })
    }

    /// The natural total order of the values.
    #[must_use]
    pub fn natural() -> Self
    where
        A: Ord,
    {
        Self::new("natural", |left, right| Ok(Some(left.value.cmp(&right.value))))
    }

    /// The natural partial order of the values; incomparable pairs keep their
    /// original order.
    ///
    /// Falling back to position is only a total order when incomparability
    /// is confined to ties. A value incomparable with everything (such as
    /// `f64::NAN` among other floats) can form a cycle with two comparable
    /// values, and those two may then come out unsorted. The result is still
    /// a permutation of the input. Filter such values out first when the
    /// rest must be sorted.
    #[must_use]
    pub fn partial() -> Self
    where
        A: PartialOrd,
    {
        Self::new("partial", |left, right| Ok(left.value.partial_cmp(&right.value)))
    }

    /// Orders elements by their index.
    #[must_use]
    pub fn by_index() -> Self
    where
        I: Ord,
    {
        Self::new("index", |left, right| Ok(Some(left.index.cmp(&right.index))))
    }

    /// The reverse of this ordering.
    #[must_use]
    pub fn desc(&self) -> Self {
        let compare = Arc::clone(&self.compare);
        Self::new(format!("{} desc", self.name), move |left, right| {
            compare(left, right).map(|ordering| ordering.map(Ordering::reverse))
        })
    }

    /// Compares two elements.
    ///
    /// # Errors
    ///
    /// Whatever the underlying comparison raises.
    pub fn compare(
        &self,
        left: &ValueIndexed<I, A>,
        right: &ValueIndexed<I, A>,
    ) -> Result<Option<Ordering>, OpticError> {
        (self.compare)(left, right)
    }

    /// `true` when `left` sorts strictly before `right`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying comparison raises.
    pub fn less(
        &self,
        left: &ValueIndexed<I, A>,
        right: &ValueIndexed<I, A>,
    ) -> Result<bool, OpticError> {
        Ok(matches!(self.compare(left, right)?, Some(Ordering::Less)))
    }

    /// The expression node describing this comparator.
    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::comparator(self.name.as_ref())
    }
}

/// A named test over errors, used by the recovery combinators.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{ErrorFilter, OpticError};
///
/// assert!(ErrorFilter::empty_result().matches(&OpticError::empty_result()));
/// assert!(!ErrorFilter::any().matches(&OpticError::cancelled("stop")));
/// ```
#[derive(Clone)]
pub struct ErrorFilter {
    name: Arc<str>,
    test: Arc<dyn Fn(&OpticError) -> bool + Send + Sync>,
}

impl fmt::Debug for ErrorFilter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ErrorFilter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ErrorFilter {
    /// A filter from a closure.
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&OpticError) -> bool + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            test: Arc::new(test),
        }
    }

    /// Matches every error.
    #[must_use]
    pub fn any() -> Self {
        Self::new("any error", |_| true)
    }

    /// Matches `EmptyResult`.
    #[must_use]
    pub fn empty_result() -> Self {
        Self::new("empty result", OpticError::is_empty_result)
    }

    /// Matches domain errors of type `E`.
    #[must_use]
    pub fn domain<E>() -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::new(std::any::type_name::<E>(), |error| {
            error.downcast_ref::<E>().is_some()
        })
    }

    /// `true` when `error` matches and is not a cancellation.
    ///
    /// Cancellation never matches, so no recovery combinator can discard it.
    #[must_use]
    pub fn matches(&self, error: &OpticError) -> bool {
        !error.is_cancelled() && (self.test)(error)
    }

    /// The expression node describing this filter.
    #[must_use]
    pub fn expr(&self) -> Expr {
        Expr::predicate(self.name.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("bad row")]
    struct BadRow;

    #[test]
    fn negate_renames_and_inverts() {
        let even = Predicate::<usize, i32>::new("even", |value| value % 2 == 0);
        let odd = even.negate();
        assert_eq!(odd.name(), "not even");
        assert!(odd.test(&0, &3).unwrap());
    }

    #[test]
    fn fallible_predicate_propagates_errors() {
        let failing = Predicate::<usize, i32>::fallible("boom", |_, _| {
            Err(OpticError::domain(BadRow))
        });
        assert!(failing.test(&0, &1).is_err());
        assert!(failing.negate().test(&0, &1).is_err());
    }

    #[test]
    fn partial_comparator_reports_no_opinion() {
        let partial = Comparator::<usize, f64>::partial();
        let nan = ValueIndexed::new(0, f64::NAN);
        let one = ValueIndexed::new(1, 1.0);
        assert_eq!(partial.compare(&nan, &one).unwrap(), None);
        assert!(!partial.less(&nan, &one).unwrap());
        assert!(!partial.less(&one, &nan).unwrap());
    }

    #[test]
    fn by_key_orders_by_projection() {
        let by_length = Comparator::<usize, String>::by_key("length", String::len);
        let short = ValueIndexed::new(0, "ab".to_string());
        let long = ValueIndexed::new(1, "abcd".to_string());
        assert!(by_length.less(&short, &long).unwrap());
        assert_eq!(by_length.expr().to_string(), "Comparator[length]");
    }

    #[test]
    fn error_filter_never_matches_cancellation() {
        let filter = ErrorFilter::domain::<BadRow>();
        assert!(filter.matches(&OpticError::domain(BadRow)));
        assert!(!filter.matches(&OpticError::domain(BadRow).with_cancellation("stop")));
        assert!(!filter.matches(&OpticError::empty_result()));
    }
}
