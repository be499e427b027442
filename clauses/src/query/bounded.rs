//! Range-bearing relational clauses: date, size, subject/sender ranges and
//! conversation counts. All of them resolve through [`crate::range`].

use super::{QueryNode, TextClause, TextField, DATE_PLACEHOLDER, NUM_PLACEHOLDER, TEXT_PLACEHOLDER};
use crate::context::SearchContext;
use crate::date::{format_bound, DateParser, DateType};
use crate::operation::{CompiledOperation, Predicate, RelationalOperation};
use crate::range::{resolve, resolve_span, CompareOp, Range};
use crate::{Error, Result};

fn relational(predicate: Predicate, negated: bool, label: String) -> CompiledOperation {
    CompiledOperation::Relational(RelationalOperation {
        predicate,
        negated,
        label,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateClause {
    kind: DateType,
    range: Range<i64>,
}

impl DateClause {
    pub fn parse(ctx: &dyn SearchContext, kind: DateType, text: &str) -> Result<Self> {
        let range = DateParser::new(ctx).parse(kind, text)?;
        Ok(Self { kind, range })
    }

    pub fn kind(&self) -> DateType {
        self.kind
    }

    /// Epoch milliseconds.
    pub fn range(&self) -> &Range<i64> {
        &self.range
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        let predicate = Predicate::DateRange {
            column: self.kind.column(),
            range: self.range.clone(),
        };
        relational(predicate, negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("DATE:");
        out.push_str(self.kind.name());
        out.push(',');
        out.push_str(&format_bound(&self.range.low));
        out.push('-');
        out.push_str(&format_bound(&self.range.high));
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("DATE:");
        out.push_str(self.kind.name());
        out.push(',');
        out.push_str(DATE_PLACEHOLDER);
        out.push('-');
        out.push_str(DATE_PLACEHOLDER);
    }
}

/// How a size clause was spelled: `size:`, `larger:` or `smaller:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Eq,
    Larger,
    Smaller,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeClause {
    op: CompareOp,
    bytes: i64,
}

impl SizeClause {
    /// Parse `[op]N[unit]`; units are b, k/kb, m/mb, g/gb in binary multiples.
    pub fn parse(kind: SizeKind, text: &str) -> Result<Self> {
        let err = || Error::parse("size", text);

        let (explicit, rest) = CompareOp::split_prefix(text.trim());
        let op = match (kind, explicit) {
            (SizeKind::Eq, op) => op.unwrap_or(CompareOp::Eq),
            (SizeKind::Larger, None) => CompareOp::Gt,
            (SizeKind::Smaller, None) => CompareOp::Lt,
            (_, Some(_)) => return Err(err()),
        };

        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(err());
        }
        let number: i64 = rest[..digits].parse().map_err(|_| err())?;
        let multiplier: i64 = match rest[digits..].trim().to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "k" | "kb" => 1 << 10,
            "m" | "mb" => 1 << 20,
            "g" | "gb" => 1 << 30,
            _ => return Err(err()),
        };
        let bytes = number.checked_mul(multiplier).ok_or_else(err)?;

        Ok(Self { op, bytes })
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Sizes are exact points; `=` selects exactly one size.
    pub fn range(&self) -> Range<i64> {
        resolve(self.op, self.bytes, None)
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        relational(Predicate::SizeRange(self.range()), negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("SIZE:");
        out.push_str(&self.op.to_string());
        out.push_str(&self.bytes.to_string());
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("SIZE:");
        out.push_str(&self.op.to_string());
        out.push_str(NUM_PLACEHOLDER);
    }
}

/// Metadata column compared by a string range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTarget {
    Subject,
    Sender,
}

impl StringTarget {
    fn name(&self) -> &'static str {
        match self {
            StringTarget::Subject => "SUBJECT",
            StringTarget::Sender => "FROM",
        }
    }
}

/// Lexicographic comparison on subject or sender, e.g. `subject:>m`.
#[derive(Debug, Clone, PartialEq)]
pub struct StringRangeClause {
    target: StringTarget,
    op: CompareOp,
    value: String,
}

impl StringRangeClause {
    /// Parse text that starts with `<` or `>`.
    pub fn parse(target: StringTarget, text: &str) -> Result<Self> {
        let clause = match target {
            StringTarget::Subject => "subject",
            StringTarget::Sender => "from",
        };
        let (op, rest) = CompareOp::split_prefix(text.trim());
        let op = match op {
            Some(op) if op != CompareOp::Eq => op,
            _ => return Err(Error::parse(clause, text)),
        };
        if rest.is_empty() {
            return Err(Error::parse(clause, text));
        }
        Ok(Self {
            target,
            op,
            value: rest.to_string(),
        })
    }

    pub fn range(&self) -> Range<String> {
        resolve_span(self.op, self.value.clone(), None)
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        let predicate = match self.target {
            StringTarget::Subject => Predicate::SubjectRange(self.range()),
            StringTarget::Sender => Predicate::SenderRange(self.range()),
        };
        relational(predicate, negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str(self.target.name());
        out.push(':');
        out.push_str(&self.op.to_string());
        out.push_str(&self.value);
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str(self.target.name());
        out.push(':');
        out.push_str(&self.op.to_string());
        out.push_str(TEXT_PLACEHOLDER);
    }
}

fn is_range_text(text: &str) -> bool {
    text.trim_start().starts_with(|c: char| c == '<' || c == '>')
}

/// `subject:` clause: a string range when the value starts with `<` or `>`,
/// otherwise subject text.
pub fn subject_clause(ctx: &dyn SearchContext, text: &str) -> Result<QueryNode> {
    if is_range_text(text) {
        Ok(QueryNode::StringRange(StringRangeClause::parse(StringTarget::Subject, text)?))
    } else {
        Ok(QueryNode::Text(TextClause::new(ctx, TextField::Subject, text, false)))
    }
}

/// `from:` clause: a sender range when the value starts with `<` or `>`,
/// otherwise address text.
pub fn sender_clause(ctx: &dyn SearchContext, text: &str) -> Result<QueryNode> {
    if is_range_text(text) {
        Ok(QueryNode::StringRange(StringRangeClause::parse(StringTarget::Sender, text)?))
    } else {
        Ok(QueryNode::Text(TextClause::new(ctx, TextField::From, text, false)))
    }
}

/// Number of messages in the item's conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvCountClause {
    op: CompareOp,
    count: i64,
}

impl ConvCountClause {
    pub fn parse(text: &str) -> Result<Self> {
        let (op, rest) = CompareOp::split_prefix(text.trim());
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::parse("conv-count", text));
        }
        let count = rest.parse().map_err(|_| Error::parse("conv-count", text))?;
        Ok(Self {
            op: op.unwrap_or(CompareOp::Eq),
            count,
        })
    }

    pub fn range(&self) -> Range<i64> {
        resolve_span(self.op, self.count, self.count.checked_add(1))
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        relational(Predicate::ConvCount(self.range()), negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("CONV-COUNT:");
        out.push_str(&self.op.to_string());
        out.push_str(&self.count.to_string());
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("CONV-COUNT:");
        out.push_str(&self.op.to_string());
        out.push_str(NUM_PLACEHOLDER);
    }
}
