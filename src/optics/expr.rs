//! Structural expression trees describing how an optic was built.
//!
//! Every optic can describe its own construction as an [`Expr`]: the kind of
//! construct plus the expressions of the sub-optics, predicates and
//! comparators it was assembled from. The tree mirrors the composition and is
//! what an external [`Handler`](super::Handler) interprets, and what an
//! [`OpticError`](super::OpticError) records in its path.
//!
//! # Examples
//!
//! ```
//! use lambars_optics::optics::{Expr, ExprKind, OpticKind};
//!
//! let leaf = Expr::leaf("rows", OpticKind::Traversal);
//! let taking = Expr::new(ExprKind::Taking { count: 2 }, vec![leaf]);
//!
//! assert_eq!(taking.to_string(), "Taking[2](rows)");
//! assert_eq!(taking.depth(), 2);
//! ```

use std::fmt;

use super::OpticKind;

/// The construct one expression node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum ExprKind {
    /// A primitive optic supplied by a data source or a concrete container.
    Leaf {
        /// Name of the leaf optic.
        name: String,
        /// Its capability kind.
        kind: OpticKind,
    },
    /// Sequential composition; children are `[outer, inner]`.
    Compose,
    /// First `count` elements.
    Taking {
        /// Number of elements kept.
        count: usize,
    },
    /// All but the first `count` elements.
    Dropping {
        /// Number of elements skipped.
        count: usize,
    },
    /// Leading elements satisfying a predicate.
    TakingWhile,
    /// Elements after the leading run satisfying a predicate.
    DroppingWhile,
    /// Elements between a leading and a trailing run satisfying a predicate.
    TrimmingWhile,
    /// Elements satisfying a predicate.
    Filtered,
    /// The element at a fixed position.
    ElementAt {
        /// Zero-based position.
        position: usize,
    },
    /// Elements sorted by a comparator.
    Ordered,
    /// Elements in reverse order.
    Reversed,
    /// The first element only.
    First,
    /// Errors matching a predicate are skipped.
    Ignoring,
    /// Errors are replaced by a substitute.
    Catching,
    /// Iteration stops at the first error matching a predicate.
    StopOn,
    /// A named predicate.
    Predicate {
        /// Human readable description.
        name: String,
    },
    /// A named comparator.
    Comparator {
        /// Human readable description.
        name: String,
    },
    /// A construct defined outside this crate.
    Custom {
        /// Name of the construct.
        name: String,
    },
}

impl ExprKind {
    fn label(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { name, .. } => formatter.write_str(name),
            Self::Compose => formatter.write_str("Compose"),
            Self::Taking { count } => write!(formatter, "Taking[{count}]"),
            Self::Dropping { count } => write!(formatter, "Dropping[{count}]"),
            Self::TakingWhile => formatter.write_str("TakingWhile"),
            Self::DroppingWhile => formatter.write_str("DroppingWhile"),
            Self::TrimmingWhile => formatter.write_str("TrimmingWhile"),
            Self::Filtered => formatter.write_str("Filtered"),
            Self::ElementAt { position } => write!(formatter, "ElementAt[{position}]"),
            Self::Ordered => formatter.write_str("Ordered"),
            Self::Reversed => formatter.write_str("Reversed"),
            Self::First => formatter.write_str("First"),
            Self::Ignoring => formatter.write_str("Ignoring"),
            Self::Catching => formatter.write_str("Catching"),
            Self::StopOn => formatter.write_str("StopOn"),
            Self::Predicate { name } => write!(formatter, "Predicate[{name}]"),
            Self::Comparator { name } => write!(formatter, "Comparator[{name}]"),
            Self::Custom { name } => formatter.write_str(name),
        }
    }
}

/// One node of an optic expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    /// What this node constructs.
    pub kind: ExprKind,
    /// Expressions of the sub-optics, predicates and comparators it uses.
    pub children: Vec<Expr>,
}

impl Expr {
    /// Creates a node from a construct and its children.
    #[must_use]
    pub const fn new(kind: ExprKind, children: Vec<Self>) -> Self {
        Self { kind, children }
    }

    /// Creates a leaf node for a primitive optic.
    #[must_use]
    pub fn leaf(name: impl Into<String>, kind: OpticKind) -> Self {
        Self::new(
            ExprKind::Leaf {
                name: name.into(),
                kind,
            },
            Vec::new(),
        )
    }

    /// Creates a leaf node for a named predicate.
    #[must_use]
    pub fn predicate(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Predicate { name: name.into() }, Vec::new())
    }

    /// Creates a leaf node for a named comparator.
    #[must_use]
    pub fn comparator(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Comparator { name: name.into() }, Vec::new())
    }

    /// Returns the number of levels in the tree, counting this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Returns the first node, in pre-order, satisfying `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<&Self>
    where
        P: Fn(&Self) -> bool,
    {
        self.find_by(&predicate)
    }

    fn find_by(&self, predicate: &dyn Fn(&Self) -> bool) -> Option<&Self> {
        if predicate(self) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by(predicate))
    }

    /// Returns the names of all leaves, in pre-order.
    #[must_use]
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_leaf_names(&mut names);
        names
    }

    fn collect_leaf_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        if let ExprKind::Leaf { name, .. } = &self.kind {
            names.push(name.as_str());
        }
        for child in &self.children {
            child.collect_leaf_names(names);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.label(formatter)?;
        if self.children.is_empty() {
            return Ok(());
        }
        formatter.write_str("(")?;
        for (position, child) in self.children.iter().enumerate() {
            if position > 0 {
                formatter.write_str(", ")?;
            }
            write!(formatter, "{child}")?;
        }
        formatter.write_str(")")
    }
}
