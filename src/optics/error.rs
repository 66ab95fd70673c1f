//! Error types for the optic runtime.
//!
//! Every fallible optic operation returns an [`OpticError`]: an open,
//! inspectable error made of an [`ErrorKind`], the structural path the error
//! crossed on its way out of a composition, and a cancellation mark.
//!
//! The path is built innermost-first. The optic where the error originated
//! seeds it with its own [`Expr`]; each enclosing optic appends its node, so
//! the rendered error localizes exactly which sub-optic failed:
//!
//! ```text
//! no element was focused where exactly one was required
//! optic error path:
//!     numbers
//!     First(numbers)
//! ```
//!
//! Breaking the iteration protocol is not an [`OpticError`]. It is an
//! implementation bug and raises a [`ProtocolViolation`] panic.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::{Expr, OpticKind};

/// Header line separating an error message from its path.
pub const ERROR_PATH_HEADER: &str = "optic error path:";

/// Ordered list of expression nodes an error crossed, innermost first.
pub type ErrorPath = SmallVec<[Expr; 4]>;

/// The eight operations of the optic contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single focus read.
    Get,
    /// Replace every focus.
    Set,
    /// Lazily push every focus.
    Iterate,
    /// Count the foci.
    Length,
    /// Transform every focus in one pass.
    Modify,
    /// Iterate the foci whose index matches.
    IndexedGet,
    /// Compare two indices.
    IndexEquality,
    /// Rebuild a source from a focus.
    ReverseGet,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Iterate => "iterate",
            Self::Length => "length",
            Self::Modify => "modify",
            Self::IndexedGet => "indexed_get",
            Self::IndexEquality => "index_equality",
            Self::ReverseGet => "reverse_get",
        };
        formatter.write_str(name)
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// No element was focused where exactly one was required.
    #[error("no element was focused where exactly one was required")]
    EmptyResult,

    /// A dynamically typed value did not have the expected type.
    #[error("cast mismatch: expected `{expected}`, found `{actual}`")]
    CastMismatch {
        /// Type the caller asked for.
        expected: &'static str,
        /// Type that was actually held.
        actual: &'static str,
    },

    /// The operation is not part of the optic's capabilities.
    #[error("operation `{operation}` is not supported by a {kind}")]
    UnsupportedOperation {
        /// The rejected operation.
        operation: Operation,
        /// The kind of the optic it was called on.
        kind: OpticKind,
    },

    /// Two different handlers were found in one expression tree.
    #[error("handlers `{first}` and `{second}` cannot be mixed in one expression")]
    MixedHandlers {
        /// Token of the handler registered first.
        first: String,
        /// Token of the conflicting handler.
        second: String,
    },

    /// An optic was assembled from a primitive set that cannot satisfy its kind.
    #[error("invalid optic configuration: {0}")]
    Configuration(String),

    /// An optic behaved differently across two passes over the same source.
    #[error("inconsistent optic: {0}")]
    Inconsistent(String),

    /// The ambient context was cancelled.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// A leaf or domain error raised by user code.
    #[error(transparent)]
    Domain(Arc<dyn StdError + Send + Sync>),
}

/// The single error type returned by every optic operation.
///
/// # Examples
///
/// ```
/// use lambars_optics::optics::{ErrorKind, Expr, OpticError, OpticKind};
///
/// let error = OpticError::empty_result()
///     .with_node(Expr::leaf("numbers", OpticKind::Traversal));
///
/// assert!(error.is_empty_result());
/// assert_eq!(error.path().len(), 1);
/// assert!(error.to_string().ends_with("optic error path:\n\tnumbers"));
/// ```
#[derive(Debug, Clone)]
pub struct OpticError {
    kind: ErrorKind,
    path: ErrorPath,
    cancellation: Option<String>,
}

impl OpticError {
    /// Creates an error of the given kind with an empty path.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: SmallVec::new(),
            cancellation: None,
        }
    }

    /// The reserved "nothing was focused" error.
    #[must_use]
    pub fn empty_result() -> Self {
        Self::new(ErrorKind::EmptyResult)
    }

    /// A cast mismatch between `expected` and `actual`.
    #[must_use]
    pub fn cast_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::new(ErrorKind::CastMismatch { expected, actual })
    }

    /// A capability violation.
    #[must_use]
    pub fn unsupported(operation: Operation, kind: OpticKind) -> Self {
        Self::new(ErrorKind::UnsupportedOperation { operation, kind })
    }

    /// A cancellation error carrying the reason given to the context.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled(reason.into()))
    }

    /// Wraps a domain error raised by user code.
    pub fn domain<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(ErrorKind::Domain(Arc::new(error)))
    }

    /// Returns what went wrong.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the path from the failure point to the outermost annotated
    /// optic, innermost first.
    #[must_use]
    pub fn path(&self) -> &[Expr] {
        &self.path
    }

    /// `true` for the reserved `EmptyResult` error.
    #[must_use]
    pub const fn is_empty_result(&self) -> bool {
        matches!(self.kind, ErrorKind::EmptyResult)
    }

    /// `true` when the error is, or was merged with, a cancellation.
    ///
    /// Recovery combinators must never discard such an error.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled(_)) || self.cancellation.is_some()
    }

    /// Returns the domain error as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match &self.kind {
            ErrorKind::Domain(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Appends `node` to the path, seeding it when empty.
    #[must_use]
    pub fn with_node(mut self, node: Expr) -> Self {
        self.path.push(node);
        self
    }

    /// Marks the error as having happened under a cancelled context.
    #[must_use]
    pub fn with_cancellation(mut self, reason: impl Into<String>) -> Self {
        if !self.is_cancelled() {
            self.cancellation = Some(reason.into());
        }
        self
    }
}

impl fmt::Display for OpticError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.kind)?;
        if let Some(reason) = &self.cancellation {
            write!(formatter, " (cancelled: {reason})")?;
        }
        if self.path.is_empty() {
            return Ok(());
        }
        write!(formatter, "\n{ERROR_PATH_HEADER}")?;
        for node in &self.path {
            write!(formatter, "\n\t{node}")?;
        }
        Ok(())
    }
}

impl StdError for OpticError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::Domain(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<ErrorKind> for OpticError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Raised, never returned, when an optic keeps producing elements after its
/// consumer asked it to stop.
///
/// The payload of the panic is this value, so a test harness can recover it
/// with `std::panic::catch_unwind` and `downcast_ref::<ProtocolViolation>()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("iteration protocol violated by `{optic}`: element produced after the consumer stopped")]
pub struct ProtocolViolation {
    /// Rendered expression of the offending optic.
    pub optic: String,
}
