//! External interpreter delegation.
//!
//! A leaf optic backed by an external system (a database, a query engine) can
//! carry a [`Handler`]. Combinators never need to know about it: they only
//! propagate the reference and contribute their own node to the expression
//! tree. When an action runs against a tree that contains a handler, control
//! of the entire action passes to that handler, which receives the full root
//! [`Expr`] and interprets the whole expression itself.
//!
//! Values cross the boundary as [`DynValue`]s. The caller down-casts results
//! and reports a [`CastMismatch`](super::ErrorKind::CastMismatch) when the
//! handler produced a value of another type.
//!
//! At most one handler identity may appear per tree. Composition collapses
//! references with the same [`Handler::token`] (the first registered wins)
//! and rejects two different tokens with
//! [`MixedHandlers`](super::ErrorKind::MixedHandlers).

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use super::{Context, ErrorKind, Expr, OpticError};

/// A value whose type is only known at run time.
#[derive(Clone)]
pub struct DynValue {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl DynValue {
    /// Wraps a value, remembering its type name for mismatch reports.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Name of the wrapped type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `true` when the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    ///
    /// # Errors
    ///
    /// [`CastMismatch`](ErrorKind::CastMismatch) when the value is not a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Result<&T, OpticError> {
        self.value
            .downcast_ref::<T>()
            .ok_or_else(|| OpticError::cast_mismatch(type_name::<T>(), self.type_name))
    }

    /// Extracts the wrapped value as a `T`, cloning only when shared.
    ///
    /// # Errors
    ///
    /// [`CastMismatch`](ErrorKind::CastMismatch) when the value is not a `T`.
    pub fn downcast<T>(self) -> Result<T, OpticError>
    where
        T: Any + Clone + Send + Sync,
    {
        let actual = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone())),
            Err(_) => Err(OpticError::cast_mismatch(type_name::<T>(), actual)),
        }
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DynValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Per-element mapping callback handed to [`Handler::modify`].
///
/// The handler may run it natively on every element it finds, or ignore it
/// and translate the mapping into its own language.
pub type DynMapper<'m> = dyn FnMut(DynValue) -> Result<DynValue, OpticError> + 'm;

/// An external interpreter that executes whole optic expressions.
///
/// Thread safety of the implementation is the handler author's
/// responsibility; optics only share the reference.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Identity of the interpreter. Trees may contain only one.
    fn token(&self) -> &str;

    /// Interprets a single-focus read of `source` through `expression`.
    ///
    /// # Errors
    ///
    /// Any error the interpreter produces; `EmptyResult` when nothing matched.
    fn get(
        &self,
        context: &Context,
        expression: &Expr,
        source: DynValue,
    ) -> Result<DynValue, OpticError>;

    /// Interprets replacing every focus of `source` with `focus`.
    ///
    /// # Errors
    ///
    /// Any error the interpreter produces.
    fn set(
        &self,
        context: &Context,
        expression: &Expr,
        focus: DynValue,
        source: DynValue,
    ) -> Result<DynValue, OpticError>;

    /// Interprets transforming every focus of `source` with `mapper`.
    ///
    /// # Errors
    ///
    /// Any error the interpreter or the mapper produces.
    fn modify(
        &self,
        context: &Context,
        expression: &Expr,
        source: DynValue,
        mapper: &mut DynMapper<'_>,
    ) -> Result<DynValue, OpticError>;

    /// Interprets rebuilding a source from `focus`.
    ///
    /// # Errors
    ///
    /// Any error the interpreter produces.
    fn reverse_get(
        &self,
        context: &Context,
        expression: &Expr,
        focus: DynValue,
    ) -> Result<DynValue, OpticError>;
}

/// Collapses the handler references of two sub-optics into one.
///
/// # Errors
///
/// [`MixedHandlers`](ErrorKind::MixedHandlers) when both carry handlers with
/// different tokens.
pub fn merge_handlers(
    first: Option<&Arc<dyn Handler>>,
    second: Option<&Arc<dyn Handler>>,
) -> Result<Option<Arc<dyn Handler>>, OpticError> {
    match (first, second) {
        (None, None) => Ok(None),
        (Some(handler), None) | (None, Some(handler)) => Ok(Some(Arc::clone(handler))),
        (Some(first), Some(second)) if first.token() == second.token() => {
            tracing::debug!(token = first.token(), "collapsed duplicate handler references");
            Ok(Some(Arc::clone(first)))
        }
        (Some(first), Some(second)) => {
            tracing::warn!(
                first = first.token(),
                second = second.token(),
                "refusing to mix handlers in one expression"
            );
            Err(OpticError::new(ErrorKind::MixedHandlers {
                first: first.token().to_string(),
                second: second.token().to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Handler for Named {
        fn token(&self) -> &str {
            self.0
        }

        fn get(&self, _: &Context, _: &Expr, source: DynValue) -> Result<DynValue, OpticError> {
            Ok(source)
        }

        fn set(
            &self,
            _: &Context,
            _: &Expr,
            focus: DynValue,
            _: DynValue,
        ) -> Result<DynValue, OpticError> {
            Ok(focus)
        }

        fn modify(
            &self,
            _: &Context,
            _: &Expr,
            source: DynValue,
            mapper: &mut DynMapper<'_>,
        ) -> Result<DynValue, OpticError> {
            mapper(source)
        }

        fn reverse_get(
            &self,
            _: &Context,
            _: &Expr,
            focus: DynValue,
        ) -> Result<DynValue, OpticError> {
            Ok(focus)
        }
    }

    #[test]
    fn downcast_returns_the_value() {
        let value = DynValue::new(vec![1, 2, 3]);
        assert!(value.is::<Vec<i32>>());
        assert_eq!(value.downcast::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn downcast_reports_both_types() {
        let error = DynValue::new(42_i64).downcast::<String>().unwrap_err();
        match error.kind() {
            ErrorKind::CastMismatch { expected, actual } => {
                assert_eq!(*expected, "alloc::string::String");
                assert_eq!(*actual, "i64");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn shared_values_are_cloned_out() {
        let value = DynValue::new("shared".to_string());
        let copy = value.clone();
        assert_eq!(value.downcast::<String>().unwrap(), "shared");
        assert_eq!(copy.downcast_ref::<String>().unwrap(), "shared");
    }

    #[test]
    fn merge_keeps_first_of_same_token() {
        let first: Arc<dyn Handler> = Arc::new(Named("sql"));
        let second: Arc<dyn Handler> = Arc::new(Named("sql"));
        let merged = merge_handlers(Some(&first), Some(&second)).unwrap().unwrap();
        assert!(Arc::ptr_eq(&merged, &first));
    }

    #[test]
    fn merge_rejects_different_tokens() {
        let first: Arc<dyn Handler> = Arc::new(Named("sql"));
        let second: Arc<dyn Handler> = Arc::new(Named("graphql"));
        let error = merge_handlers(Some(&first), Some(&second)).unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::MixedHandlers { .. }));
    }

    #[test]
    fn merge_propagates_a_single_reference() {
        let only: Arc<dyn Handler> = Arc::new(Named("sql"));
        assert!(merge_handlers(None, Some(&only)).unwrap().is_some());
        assert!(merge_handlers(None, None).unwrap().is_none());
    }
}
