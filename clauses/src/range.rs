//! Range resolution shared by every range-bearing clause.
//!
//! A comparison operator plus one endpoint (and the "next" value after it)
//! always reduces through this table:
//!
//! ```text
//! <= v   (-inf, v + inc)
//! <  v   (-inf, v)
//! >= v   [v, +inf)
//! >  v   [v + inc, +inf)
//! =  v   [v, v + inc)
//! ```
//!
//! Without an increment (exact point domains such as sizes or strings) the
//! `v + inc` endpoints collapse onto `v` with the inclusivity flipped, so
//! `= v` becomes `[v, v]`.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Comparison operators accepted as a clause prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=` or no prefix
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl CompareOp {
    /// Split a leading comparison prefix off `input`.
    ///
    /// Two-character operators are checked before one-character ones.
    pub fn split_prefix(input: &str) -> (Option<CompareOp>, &str) {
        if let Some(rest) = input.strip_prefix(">=") {
            (Some(CompareOp::Gte), rest)
        } else if let Some(rest) = input.strip_prefix("<=") {
            (Some(CompareOp::Lte), rest)
        } else if let Some(rest) = input.strip_prefix('>') {
            (Some(CompareOp::Gt), rest)
        } else if let Some(rest) = input.strip_prefix('<') {
            (Some(CompareOp::Lt), rest)
        } else if let Some(rest) = input.strip_prefix('=') {
            (Some(CompareOp::Eq), rest)
        } else {
            (None, input)
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
        }
    }
}

/// One side of a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound<T> {
    Unbounded,
    Included(T),
    Excluded(T),
}

impl<T> Bound<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Bound::Unbounded => None,
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
        }
    }

    pub fn is_inclusive(&self) -> bool {
        matches!(self, Bound::Included(_))
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Bound::Unbounded)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Bound<U> {
        match self {
            Bound::Unbounded => Bound::Unbounded,
            Bound::Included(v) => Bound::Included(f(v)),
            Bound::Excluded(v) => Bound::Excluded(f(v)),
        }
    }
}

/// A normalized low/high range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    pub low: Bound<T>,
    pub high: Bound<T>,
}

impl<T> Range<T> {
    pub fn new(low: Bound<T>, high: Bound<T>) -> Self {
        Self { low, high }
    }

    /// Apply an order-preserving conversion to both endpoints.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Range<U> {
        Range {
            low: self.low.map(&mut f),
            high: self.high.map(&mut f),
        }
    }
}

impl<T: PartialOrd> Range<T> {
    /// Whether `v` falls inside the range.
    pub fn contains(&self, v: &T) -> bool {
        let above_low = match &self.low {
            Bound::Unbounded => true,
            Bound::Included(low) => v >= low,
            Bound::Excluded(low) => v > low,
        };
        let below_high = match &self.high {
            Bound::Unbounded => true,
            Bound::Included(high) => v <= high,
            Bound::Excluded(high) => v < high,
        };
        above_low && below_high
    }
}

/// Resolve `op value` where `next` is the first value after `value` in the
/// clause's domain, or `None` for exact point domains.
pub fn resolve_span<T: Clone>(op: CompareOp, value: T, next: Option<T>) -> Range<T> {
    match (op, next) {
        (CompareOp::Lte, Some(next)) => Range::new(Bound::Unbounded, Bound::Excluded(next)),
        (CompareOp::Lte, None) => Range::new(Bound::Unbounded, Bound::Included(value)),
        (CompareOp::Lt, _) => Range::new(Bound::Unbounded, Bound::Excluded(value)),
        (CompareOp::Gte, _) => Range::new(Bound::Included(value), Bound::Unbounded),
        (CompareOp::Gt, Some(next)) => Range::new(Bound::Included(next), Bound::Unbounded),
        (CompareOp::Gt, None) => Range::new(Bound::Excluded(value), Bound::Unbounded),
        (CompareOp::Eq, Some(next)) => Range::new(Bound::Included(value), Bound::Excluded(next)),
        (CompareOp::Eq, None) => Range::new(Bound::Included(value.clone()), Bound::Included(value)),
    }
}

/// Resolve `op value` with a fixed increment.
pub fn resolve<T>(op: CompareOp, value: T, increment: Option<T>) -> Range<T>
where
    T: Add<Output = T> + Clone,
{
    let next = increment.map(|inc| value.clone() + inc);
    resolve_span(op, value, next)
}
