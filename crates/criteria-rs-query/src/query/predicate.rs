//! Predicates and lookups for criteria query filters.
//!
//! This module provides the [`Lookup`] enum for path-level comparisons and
//! the [`Predicate`] enum for combining filters with AND, OR, and NOT
//! operators. Comparison lookups take an [`Operand`], which is either an
//! inline [`Value`] or a named parameter bound at execution time — named
//! parameters are what the native count fallback remaps to positional
//! placeholders.
//!
//! # Examples
//!
//! ```
//! use criteria_rs_query::query::predicate::{Lookup, Operand, Predicate};
//! use criteria_rs_query::value::Value;
//!
//! // o.total > 100
//! let p = Predicate::filter("o.total", Lookup::Gt(Operand::from(100)));
//!
//! // o.total > 100 AND o.placed_at IS NOT NULL
//! let combined = p & Predicate::filter("o.placed_at", Lookup::IsNull(false));
//!
//! // named parameter, bound later: o.total > :min_total
//! let named = Predicate::filter("o.total", Lookup::Gt(Operand::param("min_total")));
//! ```

use crate::value::Value;
use std::ops;

/// The right-hand side of a comparison: an inline value or a named parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// An inline literal value.
    Value(Value),
    /// A named parameter, bound at execution time.
    Param(String),
}

impl Operand {
    /// Creates a named parameter operand.
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(v: T) -> Self {
        Self::Value(v.into())
    }
}

/// A path-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`path = operand`; `IS NULL` for an inline NULL).
    Exact(Operand),
    /// Greater than (`path > operand`).
    Gt(Operand),
    /// Greater than or equal (`path >= operand`).
    Gte(Operand),
    /// Less than (`path < operand`).
    Lt(Operand),
    /// Less than or equal (`path <= operand`).
    Lte(Operand),
    /// Pattern match (`path LIKE pattern`).
    Like(String),
    /// Membership test (`path IN (operands...)`).
    In(Vec<Operand>),
    /// Range test (`path BETWEEN low AND high`).
    Between(Operand, Operand),
    /// NULL test (`path IS NULL` or `path IS NOT NULL`).
    IsNull(bool),
}

/// A composable query filter tree.
///
/// `Predicate` values can be combined using `&` (AND), `|` (OR), and `!`
/// (NOT) operators to build arbitrarily complex restrictions. Paths use
/// `alias.attribute` notation; a bare attribute name resolves against the
/// query's primary root.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single path lookup.
    Filter {
        /// The path being compared (`alias.attribute` or bare attribute).
        path: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Predicate>),
    /// Logical OR of multiple conditions.
    Or(Vec<Predicate>),
    /// Logical negation of a condition.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Creates a new filter predicate.
    pub fn filter(path: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            path: path.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND or OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
