//! Order-preserving encoding of integers into index terms.
//!
//! The full-text index only compares terms byte-wise, so a structured-field
//! integer is stored as 16 hex digits of its value with the sign bit flipped.
//! Negative values then sort below positive ones and byte order equals
//! numeric order.

use crate::range::CompareOp;

const SIGN_BIT: u64 = 1 << 63;

/// Separator between a field name and its encoded numeric value.
pub const NUMERIC_MARKER: &str = "#:";

/// Encode `value` as a fixed-width, sign-normalized term.
pub fn encode(value: i64) -> String {
    format!("{:016x}", (value as u64) ^ SIGN_BIT)
}

/// Decode a term produced by [`encode`].
pub fn decode(term: &str) -> Option<i64> {
    if term.len() != 16 {
        return None;
    }
    u64::from_str_radix(term, 16).ok().map(|bits| (bits ^ SIGN_BIT) as i64)
}

/// Field-scoped numeric term, `<field>#:<encoded>`.
pub fn field_term(field: &str, value: i64) -> String {
    format!("{}{}{}", field, NUMERIC_MARKER, encode(value))
}

/// Result of classifying a structured-field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericValue {
    /// `(<|>|<=|>=)?-?\d+` that fits in an i64.
    Parsed(CompareOp, i64),
    /// Numeric shape but out of range.
    Overflow,
    /// Not numeric at all.
    NotNumeric,
}

/// Classify `text` as a numeric comparison.
///
/// A bare `=` prefix is not part of the numeric form.
pub fn classify(text: &str) -> NumericValue {
    let (op, rest) = CompareOp::split_prefix(text);
    let op = match op {
        Some(CompareOp::Eq) => return NumericValue::NotNumeric,
        Some(op) => op,
        None => CompareOp::Eq,
    };

    let digits = rest.strip_prefix('-').unwrap_or(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return NumericValue::NotNumeric;
    }

    match rest.parse::<i64>() {
        Ok(value) => NumericValue::Parsed(op, value),
        Err(_) => NumericValue::Overflow,
    }
}
