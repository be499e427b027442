//! Clauses answered by the full-text index.

use tracing::debug;

use super::{QueryNode, SubQuery, FIELD_INDEX, NUM_PLACEHOLDER, TEXT_PLACEHOLDER};
use crate::context::SearchContext;
use crate::numeric::{self, NumericValue, NUMERIC_MARKER};
use crate::operation::{CompiledOperation, FullTextOperation, FullTextTerm};
use crate::range::{resolve_span, Bound, CompareOp, Range};
use crate::tokenizer::{contact_term, contact_tokens, normalize_width};
use crate::{Error, Result};

/// Indexed text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Content,
    Subject,
    Filename,
    Author,
    Title,
    Keywords,
    Company,
    From,
    To,
    Cc,
}

impl TextField {
    pub const ALL: [TextField; 10] = [
        TextField::Content,
        TextField::Subject,
        TextField::Filename,
        TextField::Author,
        TextField::Title,
        TextField::Keywords,
        TextField::Company,
        TextField::From,
        TextField::To,
        TextField::Cc,
    ];

    /// Index field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::Content => "l.content",
            TextField::Subject => "subject",
            TextField::Filename => "filename",
            TextField::Author => "author",
            TextField::Title => "title",
            TextField::Keywords => "keywords",
            TextField::Company => "company",
            TextField::From => "from",
            TextField::To => "to",
            TextField::Cc => "cc",
        }
    }

    /// Lookup by search keyword (`content`, `subject`, `from`, ...).
    pub fn from_keyword(keyword: &str) -> Option<TextField> {
        let keyword = keyword.to_ascii_lowercase();
        TextField::ALL
            .into_iter()
            .find(|f| f.as_str().trim_start_matches("l.") == keyword)
    }
}

fn full_text(field: impl Into<String>, term: FullTextTerm, negated: bool, label: String) -> CompiledOperation {
    CompiledOperation::FullText(FullTextOperation {
        field: field.into(),
        term,
        negated,
        label,
    })
}

/// Free text against one indexed field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextClause {
    field: TextField,
    tokens: Vec<String>,
    prefix: bool,
}

impl TextClause {
    /// Analyze `text` for `field`. In quick mode the last token matches as a prefix.
    pub fn new(ctx: &dyn SearchContext, field: TextField, text: &str, quick: bool) -> Self {
        let mut tokens = ctx.analyzer().tokenize(field.as_str(), text);
        let prefix = quick || tokens.last().is_some_and(|t| t.ends_with('*'));
        for token in &mut tokens {
            let len = token.trim_end_matches('*').len();
            token.truncate(len);
        }
        tokens.retain(|t| !t.is_empty());
        Self {
            field,
            tokens,
            prefix,
        }
    }

    pub fn field(&self) -> TextField {
        self.field
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    fn term(&self) -> FullTextTerm {
        match self.tokens.as_slice() {
            [] => FullTextTerm::NoOp,
            [only] if self.prefix => FullTextTerm::Prefix(only.clone()),
            [only] => FullTextTerm::Term(only.clone()),
            _ => FullTextTerm::Phrase {
                terms: self.tokens.clone(),
                last_is_prefix: self.prefix,
            },
        }
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        full_text(self.field.as_str(), self.term(), negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str(self.field.as_str());
        out.push(':');
        out.push_str(&self.tokens.join(","));
        if self.prefix && !self.tokens.is_empty() {
            out.push_str("[*]");
        }
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str(self.field.as_str());
        out.push(':');
        if !self.tokens.is_empty() {
            out.push_str(TEXT_PLACEHOLDER);
            if self.prefix {
                out.push_str("[*]");
            }
        }
    }
}

/// Value of a structured-field clause.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `name:value` term, optionally a prefix.
    Text { term: String, prefix: bool },
    /// Integer comparison over encoded terms.
    Numeric { op: CompareOp, value: i64 },
}

/// A `name:value` structured field, e.g. `company:zimbra` or `age:>=5`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    name: String,
    value: FieldValue,
}

impl FieldClause {
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = normalize_width(text.trim());
        let body = normalized.strip_prefix('#').unwrap_or(&normalized);
        let (name, value) = body
            .split_once(':')
            .ok_or_else(|| Error::parse("field", text))?;

        let name = name.trim().to_lowercase();
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        if name.is_empty() || value.is_empty() {
            return Err(Error::parse("field", text));
        }

        let value = match numeric::classify(value) {
            NumericValue::Parsed(op, value) => FieldValue::Numeric { op, value },
            classified => {
                if classified == NumericValue::Overflow {
                    debug!("numeric field value out of range, matching as text");
                }
                let lower = value.to_lowercase();
                let stem = lower.trim_end_matches('*');
                FieldValue::Text {
                    term: format!("{}:{}", name, stem),
                    prefix: stem.len() != lower.len(),
                }
            }
        };

        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Index term for this field.
    ///
    /// An open end of a numeric range is not left unbounded: it becomes an
    /// inclusive bound at the field's own `i64::MIN` or `i64::MAX` term, so the
    /// lexicographic range never runs into another field's terms.
    fn term(&self) -> FullTextTerm {
        match &self.value {
            FieldValue::Text { term, prefix: true } => FullTextTerm::Prefix(term.clone()),
            FieldValue::Text { term, prefix: false } => FullTextTerm::Term(term.clone()),
            FieldValue::Numeric { op, value } => {
                let range = resolve_span(*op, *value, value.checked_add(1));
                let low = match range.low {
                    Bound::Unbounded => Bound::Included(i64::MIN),
                    bound => bound,
                };
                let high = match range.high {
                    Bound::Unbounded => Bound::Included(i64::MAX),
                    bound => bound,
                };
                let range = Range::new(low, high).map(|v| numeric::field_term(&self.name, v));
                FullTextTerm::Range {
                    low: range.low,
                    high: range.high,
                }
            }
        }
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        full_text(FIELD_INDEX, self.term(), negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str(FIELD_INDEX);
        out.push(':');
        match &self.value {
            FieldValue::Text { term, prefix } => {
                out.push_str(term);
                if *prefix {
                    out.push('*');
                }
            }
            FieldValue::Numeric { op, value } => {
                out.push_str(&self.name);
                out.push_str(NUMERIC_MARKER);
                push_op(out, *op);
                out.push_str(&value.to_string());
            }
        }
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str(FIELD_INDEX);
        out.push(':');
        out.push_str(TEXT_PLACEHOLDER);
        match &self.value {
            FieldValue::Text { prefix, .. } => {
                if *prefix {
                    out.push('*');
                }
            }
            FieldValue::Numeric { op, .. } => {
                out.push_str(NUMERIC_MARKER);
                push_op(out, *op);
                out.push_str(NUM_PLACEHOLDER);
            }
        }
    }
}

fn push_op(out: &mut String, op: CompareOp) {
    if op != CompareOp::Eq {
        out.push_str(&op.to_string());
    }
}

/// Contact search over the contact-data field.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactClause {
    tokens: Vec<String>,
}

impl ContactClause {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: contact_tokens(text),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub(crate) fn compile(&self, ctx: &dyn SearchContext, negate: bool, label: String) -> CompiledOperation {
        full_text(
            ctx.config().contact_field.as_str(),
            contact_term(&self.tokens),
            negate,
            label,
        )
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("CONTACT:");
        out.push_str(&self.tokens.join(","));
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("CONTACT:");
        if !self.tokens.is_empty() {
            out.push_str(TEXT_PLACEHOLDER);
        }
    }
}

/// Attachment or item MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeClause {
    mime: String,
}

/// Index field holding MIME types.
const TYPE_FIELD: &str = "type";

fn type_aliases(name: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match name {
        "word" | "msword" => &[
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ],
        "excel" | "xls" => &[
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ],
        "ppt" | "powerpoint" => &[
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ],
        "pdf" => &["application/pdf"],
        "ms-tnef" => &["application/ms-tnef"],
        "jpeg" => &["image/jpeg"],
        "gif" => &["image/gif"],
        "bmp" => &["image/bmp"],
        _ => return None,
    };
    Some(types)
}

impl TypeClause {
    /// Build a type clause, expanding aliases such as `word` into an OR of MIME types.
    pub fn parse(text: &str) -> Result<QueryNode> {
        let name = text.trim().to_lowercase();
        if name.is_empty() {
            return Err(Error::parse("type", text));
        }

        match type_aliases(&name) {
            Some([single]) => Ok(QueryNode::Type(TypeClause::new(single))),
            Some(types) => Ok(QueryNode::Sub(SubQuery::any_of(
                types.iter().map(|t| QueryNode::Type(TypeClause::new(t))),
            ))),
            None => Ok(QueryNode::Type(TypeClause { mime: name })),
        }
    }

    fn new(mime: &str) -> Self {
        Self {
            mime: mime.to_string(),
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        full_text(TYPE_FIELD, FullTextTerm::Term(self.mime.clone()), negate, label)
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("type:");
        out.push_str(&self.mime);
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("type:");
        out.push_str(TEXT_PLACEHOLDER);
    }
}
