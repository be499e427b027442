//! Compiled operations handed to the execution engine.
//!
//! These carry no backend types, only field names, values, bounds and a
//! label mirroring the raw dump of the clause that produced them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::Conjunction;
use crate::range::{Bound, Range};

/// Output of compiling a single query node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompiledOperation {
    FullText(FullTextOperation),
    Relational(RelationalOperation),
    /// A grouping. Each marker joins an entry to the one before it; AND binds
    /// tighter than OR, and a missing marker means AND.
    Group {
        entries: Vec<(CompiledOperation, Option<Conjunction>)>,
    },
}

/// A predicate against the inverted full-text index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullTextOperation {
    pub field: String,
    pub term: FullTextTerm,
    pub negated: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullTextTerm {
    Term(String),
    Prefix(String),
    /// Ordered phrase; the last term is expanded as a prefix when flagged.
    Phrase { terms: Vec<String>, last_is_prefix: bool },
    /// Lexicographic range over encoded terms.
    Range { low: Bound<String>, high: Bound<String> },
    /// Matches nothing.
    NoOp,
}

/// A predicate against the relational metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalOperation {
    pub predicate: Predicate,
    /// Tag predicates carry polarity in `present` and never set this.
    pub negated: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Epoch milliseconds.
    DateRange { column: DateColumn, range: Range<i64> },
    /// Bytes.
    SizeRange(Range<i64>),
    ConvCount(Range<i64>),
    SubjectRange(Range<String>),
    SenderRange(Range<String>),
    ItemIds(ItemIdSet),
    ConversationId(ItemId),
    Tag { tag: TagRef, present: bool },
    Folder { scope: FolderScope, include_subfolders: bool },
    InFolder { folder: FolderRef, include_subfolders: bool },
    Priority(Priority),
}

/// Date columns in the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateColumn {
    Date,
    #[serde(rename = "mdate")]
    ModifiedDate,
    CalStart,
    CalEnd,
}

/// An item id, qualified by the owning account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemId {
    pub account: String,
    pub id: i64,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemIdSet {
    All,
    None,
    List(Vec<ItemId>),
    /// Inclusive on both ends.
    Range { low: ItemId, high: ItemId },
}

impl fmt::Display for ItemIdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemIdSet::All => write!(f, "all"),
            ItemIdSet::None => write!(f, "none"),
            ItemIdSet::List(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", id)?;
                }
                Ok(())
            }
            ItemIdSet::Range { low, high } => write!(f, "{}--{}", low, high),
        }
    }
}

/// System flags stored alongside user tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    Unread,
    Flagged,
    Draft,
    Sent,
    Answered,
    Forwarded,
    Invite,
    Attached,
}

impl Flag {
    pub const ALL: [Flag; 8] = [
        Flag::Unread,
        Flag::Flagged,
        Flag::Draft,
        Flag::Sent,
        Flag::Answered,
        Flag::Forwarded,
        Flag::Invite,
        Flag::Attached,
    ];

    /// Stored name, e.g. `\Unread`.
    pub fn name(&self) -> &'static str {
        match self {
            Flag::Unread => "\\Unread",
            Flag::Flagged => "\\Flagged",
            Flag::Draft => "\\Draft",
            Flag::Sent => "\\Sent",
            Flag::Answered => "\\Answered",
            Flag::Forwarded => "\\Forwarded",
            Flag::Invite => "\\Invite",
            Flag::Attached => "\\Attached",
        }
    }

    /// Case-insensitive lookup by stored name.
    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|f| f.name().eq_ignore_ascii_case(name))
    }
}

/// What a tag name resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRef {
    Flag(Flag),
    /// A tag defined in the requesting mailbox.
    User { id: i32, name: String },
    /// Not defined locally; may be owned by a shared mailbox.
    Remote { name: String },
}

impl TagRef {
    pub fn name(&self) -> &str {
        match self {
            TagRef::Flag(flag) => flag.name(),
            TagRef::User { name, .. } | TagRef::Remote { name } => name,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, TagRef::Flag(_))
    }
}

/// A folder in the requesting mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderScope {
    Any,
    Local,
    Remote,
}

impl FolderScope {
    pub fn name(&self) -> &'static str {
        match self {
            FolderScope::Any => "ANY_FOLDER",
            FolderScope::Local => "LOCAL",
            FolderScope::Remote => "REMOTE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Low,
}

impl CompiledOperation {
    pub fn label(&self) -> Option<&str> {
        match self {
            CompiledOperation::FullText(op) => Some(&op.label),
            CompiledOperation::Relational(op) => Some(&op.label),
            CompiledOperation::Group { .. } => None,
        }
    }

    /// Whether this operation is negated as a whole.
    ///
    /// Groups are never negated; negation is pushed into their children.
    pub fn is_negated(&self) -> bool {
        match self {
            CompiledOperation::FullText(op) => op.negated,
            CompiledOperation::Relational(op) => match op.predicate {
                Predicate::Tag { present, .. } => !present,
                _ => op.negated,
            },
            CompiledOperation::Group { .. } => false,
        }
    }

    /// Render in full-text index query syntax.
    ///
    /// Returns `None` when any part of the operation targets the relational store.
    pub fn to_query_string(&self) -> Option<String> {
        match self {
            CompiledOperation::FullText(op) => Some(op.to_query_string()),
            CompiledOperation::Relational(_) => None,
            CompiledOperation::Group { entries } => {
                let mut out = String::from("(");
                for (i, (child, conj)) in entries.iter().enumerate() {
                    if i > 0 {
                        match conj {
                            Some(Conjunction::Or) => out.push_str(" OR "),
                            _ => out.push_str(" AND "),
                        }
                    }
                    out.push_str(&child.to_query_string()?);
                }
                out.push(')');
                Some(out)
            }
        }
    }
}

impl FullTextOperation {
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        if self.negated {
            out.push('-');
        }

        if self.field == crate::query::FIELD_INDEX {
            // structured fields render as #name:"value"
            if let FullTextTerm::Term(t) | FullTextTerm::Prefix(t) = &self.term {
                if let Some((name, value)) = t.split_once(':') {
                    out.push('#');
                    out.push_str(name);
                    out.push(':');
                    out.push_str(&quote(value));
                    if matches!(self.term, FullTextTerm::Prefix(_)) {
                        out.push('*');
                    }
                    return out;
                }
            }
        }

        out.push_str(query_field_name(&self.field));
        out.push(':');
        match &self.term {
            FullTextTerm::Term(t) => out.push_str(&quote_if_needed(t)),
            FullTextTerm::Prefix(t) => {
                out.push_str(&quote_if_needed(t));
                out.push('*');
            }
            FullTextTerm::Phrase { terms, last_is_prefix } => {
                let mut phrase = terms.join(" ");
                if *last_is_prefix {
                    phrase.push('*');
                }
                out.push_str(&quote(&phrase));
            }
            FullTextTerm::Range { low, high } => {
                out.push(if low.is_inclusive() || low.is_unbounded() { '[' } else { '{' });
                out.push_str(low.value().map(String::as_str).unwrap_or("*"));
                out.push_str(" TO ");
                out.push_str(high.value().map(String::as_str).unwrap_or("*"));
                out.push(if high.is_inclusive() || high.is_unbounded() { ']' } else { '}' });
            }
            FullTextTerm::NoOp => out.push_str("\"\""),
        }
        out
    }
}

fn query_field_name(field: &str) -> &str {
    field.strip_prefix("l.").unwrap_or(field)
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | ':' | '(' | ')' | '\\'));
    if needs_quotes {
        quote(value)
    } else {
        value.to_string()
    }
}
