//! Values flowing through optic iteration.

use std::fmt;

use super::OpticError;

/// Bound shared by sources and foci: immutable values that can be cloned and
/// shared across call sites.
pub trait Focus: Clone + Send + Sync + 'static {}

impl<T> Focus for T where T: Clone + Send + Sync + 'static {}

/// Bound on indices: foci that can also be compared and printed.
///
/// `()` is the index of optics with no natural index.
pub trait Index: Focus + PartialEq + fmt::Debug {}

impl<T> Index for T where T: Focus + PartialEq + fmt::Debug {}

/// One focused element together with its index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueIndexed<I, A> {
    /// Key or position of the element.
    pub index: I,
    /// The focused value.
    pub value: A,
}

impl<I, A> ValueIndexed<I, A> {
    /// Pairs an index with a value.
    pub const fn new(index: I, value: A) -> Self {
        Self { index, value }
    }

    /// Transforms the value, keeping the index.
    pub fn map<B, F>(self, function: F) -> ValueIndexed<I, B>
    where
        F: FnOnce(A) -> B,
    {
        ValueIndexed::new(self.index, function(self.value))
    }

    /// Replaces the index, keeping the value.
    pub fn reindex<J>(self, index: J) -> ValueIndexed<J, A> {
        ValueIndexed::new(index, self.value)
    }

    /// Splits into `(index, value)`.
    pub fn into_parts(self) -> (I, A) {
        (self.index, self.value)
    }
}

/// The atomic unit produced by iteration: an element or the error that
/// prevented producing one.
pub type ValueIndexedResult<I, A> = Result<ValueIndexed<I, A>, OpticError>;
