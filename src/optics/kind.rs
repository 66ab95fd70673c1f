//! Capability classification of optics.
//!
//! Every optic carries three capability tags:
//!
//! - [`Arity`]: whether it focuses exactly one value or zero-or-more values
//! - [`Mutability`]: whether it can rebuild the source with new focus values
//! - [`Direction`]: whether the source can be reconstructed from a focus alone
//!
//! The tags collapse into a small closed set of [`OpticKind`]s. Composition
//! takes the capability meet of both sides, so composing a [`OpticKind::Lens`]
//! with a [`OpticKind::Prism`] yields a [`OpticKind::Traversal`].
//!
//! # Examples
//!
//! ```
//! use lambars_optics::optics::OpticKind;
//!
//! assert_eq!(OpticKind::Lens.compose(OpticKind::Iso), OpticKind::Lens);
//! assert_eq!(OpticKind::Lens.compose(OpticKind::Prism), OpticKind::Traversal);
//! assert_eq!(OpticKind::Getter.compose(OpticKind::Traversal), OpticKind::Iteration);
//! ```

use std::fmt;

/// How many values an optic focuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arity {
    /// Exactly one focus (may still report `EmptyResult` for derived getters).
    One,
    /// Zero or more foci.
    Many,
}

/// Whether an optic can write new focus values back into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mutability {
    /// Read access only.
    ReadOnly,
    /// Read and write access.
    ReadWrite,
}

/// Whether an optic can reconstruct a source from a focus value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Source to focus only.
    UniDirectional,
    /// Focus can be converted back into a source.
    BiDirectional,
}

/// The full capability triple of an optic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// Number of foci.
    pub arity: Arity,
    /// Read-only or read-write.
    pub mutability: Mutability,
    /// Uni- or bi-directional.
    pub direction: Direction,
}

impl Capabilities {
    /// Returns the capabilities shared by both sides of a composition.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        let arity = match (self.arity, other.arity) {
            (Arity::One, Arity::One) => Arity::One,
            _ => Arity::Many,
        };
        let mutability = match (self.mutability, other.mutability) {
            (Mutability::ReadWrite, Mutability::ReadWrite) => Mutability::ReadWrite,
            _ => Mutability::ReadOnly,
        };
        let direction = match (self.direction, other.direction) {
            (Direction::BiDirectional, Direction::BiDirectional) => Direction::BiDirectional,
            _ => Direction::UniDirectional,
        };
        Self {
            arity,
            mutability,
            direction,
        }
    }

    /// Returns the closed kind these capabilities describe.
    ///
    /// Read-only optics never reverse, so direction is ignored for them.
    #[must_use]
    pub const fn kind(self) -> OpticKind {
        match (self.arity, self.mutability, self.direction) {
            (Arity::One, Mutability::ReadOnly, _) => OpticKind::Getter,
            (Arity::Many, Mutability::ReadOnly, _) => OpticKind::Iteration,
            (Arity::One, Mutability::ReadWrite, Direction::UniDirectional) => OpticKind::Lens,
            (Arity::One, Mutability::ReadWrite, Direction::BiDirectional) => OpticKind::Iso,
            (Arity::Many, Mutability::ReadWrite, Direction::UniDirectional) => {
                OpticKind::Traversal
            }
            (Arity::Many, Mutability::ReadWrite, Direction::BiDirectional) => OpticKind::Prism,
        }
    }
}

/// The closed set of optic shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpticKind {
    /// Read-only, exactly one focus.
    Getter,
    /// Read-write, exactly one focus.
    Lens,
    /// Read-only, zero or more foci.
    Iteration,
    /// Read-write, zero or more foci.
    Traversal,
    /// Lossless bidirectional conversion.
    Iso,
    /// Zero or one focus selected by a match, reversible.
    Prism,
}

impl OpticKind {
    /// Returns the capability triple of this kind.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        let (arity, mutability, direction) = match self {
            Self::Getter => (Arity::One, Mutability::ReadOnly, Direction::UniDirectional),
            Self::Lens => (Arity::One, Mutability::ReadWrite, Direction::UniDirectional),
            Self::Iteration => (Arity::Many, Mutability::ReadOnly, Direction::UniDirectional),
            Self::Traversal => (Arity::Many, Mutability::ReadWrite, Direction::UniDirectional),
            Self::Iso => (Arity::One, Mutability::ReadWrite, Direction::BiDirectional),
            Self::Prism => (Arity::Many, Mutability::ReadWrite, Direction::BiDirectional),
        };
        Capabilities {
            arity,
            mutability,
            direction,
        }
    }

    /// Returns the kind of `self` composed with `inner`.
    #[must_use]
    pub const fn compose(self, inner: Self) -> Self {
        self.capabilities().meet(inner.capabilities()).kind()
    }

    /// Returns the kind with the arity widened to [`Arity::Many`] and the
    /// direction dropped, which is what every filtering combinator produces.
    #[must_use]
    pub const fn widened(self) -> Self {
        let capabilities = self.capabilities();
        Capabilities {
            arity: Arity::Many,
            mutability: capabilities.mutability,
            direction: Direction::UniDirectional,
        }
        .kind()
    }

    /// Returns the read-only counterpart of this kind.
    #[must_use]
    pub const fn read_only(self) -> Self {
        let capabilities = self.capabilities();
        Capabilities {
            arity: capabilities.arity,
            mutability: Mutability::ReadOnly,
            direction: capabilities.direction,
        }
        .kind()
    }

    /// `true` when `Get` is legal.
    #[must_use]
    pub const fn is_single(self) -> bool {
        matches!(self.capabilities().arity, Arity::One)
    }

    /// `true` when `Set` and `Modify` are legal.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self.capabilities().mutability, Mutability::ReadWrite)
    }

    /// `true` when `ReverseGet` is legal.
    #[must_use]
    pub const fn is_reversible(self) -> bool {
        matches!(self.capabilities().direction, Direction::BiDirectional)
            && self.is_writable()
    }
}

impl fmt::Display for OpticKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Getter => "getter",
            Self::Lens => "lens",
            Self::Iteration => "iteration",
            Self::Traversal => "traversal",
            Self::Iso => "iso",
            Self::Prism => "prism",
        };
        formatter.write_str(name)
    }
}
