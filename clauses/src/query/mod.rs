//! Query nodes: one variant per clause kind, plus composite groupings.
//!
//! Every node can:
//! - report whether compiling it touches the full-text index
//! - compile against a [`SearchContext`] and an inherited negation flag
//! - render a raw dump (`SIZE:>10240`) and a sanitized dump (`SIZE:>$NUM`)
//!
//! # Polarity
//!
//! A clause's effective sense is its own sense XOR the inherited negation.
//! Only tag clauses carry a sense of their own; every other kind only honors
//! the inherited flag.
//!
//! # Dump shape
//!
//! Inside a grouping, leaves render as `<mod>Q(<dump>)`, nested groupings as
//! `<mod>(<children>)`, and explicit conjunctions as `Q(&&)` or `Q(||)`.

mod bounded;
mod flags;
mod identity;
mod shortcuts;
mod text;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::SearchContext;
use crate::operation::CompiledOperation;
use crate::Result;

pub use bounded::{
    sender_clause, subject_clause, ConvCountClause, DateClause, SizeClause, SizeKind,
    StringRangeClause, StringTarget,
};
pub use flags::{InClause, PriorityClause, TagClause};
pub use identity::{ConversationClause, ItemClause};
pub use shortcuts::{builtin, builtin_names};
pub use text::{ContactClause, FieldClause, FieldValue, TextClause, TextField, TypeClause};

/// Full-text field holding structured `name:value` terms.
pub const FIELD_INDEX: &str = "l.field";

/// Sanitized placeholders.
pub const TEXT_PLACEHOLDER: &str = "$TEXT";
pub const NUM_PLACEHOLDER: &str = "$NUM";
pub const DATE_PLACEHOLDER: &str = "$DATE";
pub const TAG_PLACEHOLDER: &str = "$TAG";
pub const FOLDER_PLACEHOLDER: &str = "$FOLDER";

/// A single clause kind, or a grouping of clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Text(TextClause),
    Field(FieldClause),
    Contact(ContactClause),
    Date(DateClause),
    Size(SizeClause),
    StringRange(StringRangeClause),
    ConvCount(ConvCountClause),
    Item(ItemClause),
    Conversation(ConversationClause),
    Tag(TagClause),
    In(InClause),
    Type(TypeClause),
    Priority(PriorityClause),
    Sub(SubQuery),
}

impl QueryNode {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryNode::Text(_) => "text",
            QueryNode::Field(_) => "field",
            QueryNode::Contact(_) => "contact",
            QueryNode::Date(_) => "date",
            QueryNode::Size(_) => "size",
            QueryNode::StringRange(_) => "string_range",
            QueryNode::ConvCount(_) => "conv_count",
            QueryNode::Item(_) => "item",
            QueryNode::Conversation(_) => "conversation",
            QueryNode::Tag(_) => "tag",
            QueryNode::In(_) => "in",
            QueryNode::Type(_) => "type",
            QueryNode::Priority(_) => "priority",
            QueryNode::Sub(_) => "sub",
        }
    }

    /// True iff compiling this node touches the full-text index.
    pub fn has_text_operation(&self) -> bool {
        match self {
            QueryNode::Text(_) | QueryNode::Field(_) | QueryNode::Contact(_) | QueryNode::Type(_) => {
                true
            }
            QueryNode::Date(_)
            | QueryNode::Size(_)
            | QueryNode::StringRange(_)
            | QueryNode::ConvCount(_)
            | QueryNode::Item(_)
            | QueryNode::Conversation(_)
            | QueryNode::Tag(_)
            | QueryNode::In(_)
            | QueryNode::Priority(_) => false,
            QueryNode::Sub(sub) => sub.has_text_operation(),
        }
    }

    /// Compile against `ctx`, with `negate` inherited from enclosing clauses.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = self.kind(), negate = negate))]
    pub fn compile(&self, ctx: &dyn SearchContext, negate: bool) -> Result<CompiledOperation> {
        debug!(clause = %self.sanitized_string(), "compiling");
        let label = self.dump_string();
        let op = match self {
            QueryNode::Text(c) => c.compile(negate, label),
            QueryNode::Field(c) => c.compile(negate, label),
            QueryNode::Contact(c) => c.compile(ctx, negate, label),
            QueryNode::Date(c) => c.compile(negate, label),
            QueryNode::Size(c) => c.compile(negate, label),
            QueryNode::StringRange(c) => c.compile(negate, label),
            QueryNode::ConvCount(c) => c.compile(negate, label),
            QueryNode::Item(c) => c.compile(negate, label),
            QueryNode::Conversation(c) => c.compile(negate, label),
            QueryNode::Tag(c) => c.compile(negate, label),
            QueryNode::In(c) => c.compile(negate, label),
            QueryNode::Type(c) => c.compile(negate, label),
            QueryNode::Priority(c) => c.compile(negate, label),
            QueryNode::Sub(sub) => sub.compile(ctx, negate)?,
        };
        Ok(op)
    }

    /// Append the raw dump.
    pub fn dump(&self, out: &mut String) {
        match self {
            QueryNode::Text(c) => c.dump(out),
            QueryNode::Field(c) => c.dump(out),
            QueryNode::Contact(c) => c.dump(out),
            QueryNode::Date(c) => c.dump(out),
            QueryNode::Size(c) => c.dump(out),
            QueryNode::StringRange(c) => c.dump(out),
            QueryNode::ConvCount(c) => c.dump(out),
            QueryNode::Item(c) => c.dump(out),
            QueryNode::Conversation(c) => c.dump(out),
            QueryNode::Tag(c) => c.dump(out),
            QueryNode::In(c) => c.dump(out),
            QueryNode::Type(c) => c.dump(out),
            QueryNode::Priority(c) => c.dump(out),
            QueryNode::Sub(sub) => sub.dump_with(out, QueryNode::dump),
        }
    }

    /// Append the sanitized dump. Same shape as [`QueryNode::dump`], values redacted.
    pub fn sanitized_dump(&self, out: &mut String) {
        match self {
            QueryNode::Text(c) => c.sanitized_dump(out),
            QueryNode::Field(c) => c.sanitized_dump(out),
            QueryNode::Contact(c) => c.sanitized_dump(out),
            QueryNode::Date(c) => c.sanitized_dump(out),
            QueryNode::Size(c) => c.sanitized_dump(out),
            QueryNode::StringRange(c) => c.sanitized_dump(out),
            QueryNode::ConvCount(c) => c.sanitized_dump(out),
            QueryNode::Item(c) => c.sanitized_dump(out),
            QueryNode::Conversation(c) => c.sanitized_dump(out),
            QueryNode::Tag(c) => c.sanitized_dump(out),
            QueryNode::In(c) => c.sanitized_dump(out),
            QueryNode::Type(c) => c.sanitized_dump(out),
            QueryNode::Priority(c) => c.dump(out),
            QueryNode::Sub(sub) => sub.dump_with(out, QueryNode::sanitized_dump),
        }
    }

    pub fn dump_string(&self) -> String {
        let mut out = String::new();
        self.dump(&mut out);
        out
    }

    pub fn sanitized_string(&self) -> String {
        let mut out = String::new();
        self.sanitized_dump(&mut out);
        out
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryNode::Sub(sub) => write!(f, "({})", sub),
            leaf => write!(f, "Q({})", leaf.dump_string()),
        }
    }
}

/// Occurrence modifier on a clause inside a grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    None,
    /// Must match.
    Plus,
    /// Must not match.
    Minus,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::None => Ok(()),
            Modifier::Plus => write!(f, "+"),
            Modifier::Minus => write!(f, "-"),
        }
    }
}

/// Marker joining a clause to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn flip(self) -> Conjunction {
        match self {
            Conjunction::And => Conjunction::Or,
            Conjunction::Or => Conjunction::And,
        }
    }

    fn dump(&self) -> &'static str {
        match self {
            Conjunction::And => "Q(&&)",
            Conjunction::Or => "Q(||)",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => write!(f, "&&"),
            Conjunction::Or => write!(f, "||"),
        }
    }
}

/// A node with its occurrence modifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub modifier: Modifier,
    pub node: QueryNode,
}

impl Clause {
    pub fn new(node: QueryNode) -> Self {
        Self {
            modifier: Modifier::None,
            node,
        }
    }

    pub fn with_modifier(modifier: Modifier, node: QueryNode) -> Self {
        Self { modifier, node }
    }

    pub fn negated(&self) -> bool {
        self.modifier == Modifier::Minus
    }

    fn dump_with(&self, out: &mut String, render: fn(&QueryNode, &mut String)) {
        out.push_str(match self.modifier {
            Modifier::None => "",
            Modifier::Plus => "+",
            Modifier::Minus => "-",
        });
        match &self.node {
            QueryNode::Sub(_) => render(&self.node, out),
            leaf => {
                out.push_str("Q(");
                render(leaf, out);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifier, self.node)
    }
}

/// An ordered grouping of clauses.
///
/// Each entry carries the marker joining it to the previous entry. The first
/// entry never has one; a missing marker on a later entry means AND.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubQuery {
    entries: Vec<(Clause, Option<Conjunction>)>,
}

impl SubQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group `nodes` joined by OR.
    pub fn any_of(nodes: impl IntoIterator<Item = QueryNode>) -> Self {
        let mut sub = Self::new();
        for node in nodes {
            sub.push(Some(Conjunction::Or), Clause::new(node));
        }
        sub
    }

    /// Append a clause. The marker is dropped for the first entry.
    pub fn push(&mut self, conjunction: Option<Conjunction>, clause: Clause) {
        let conjunction = if self.entries.is_empty() { None } else { conjunction };
        self.entries.push((clause, conjunction));
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.push(Some(Conjunction::And), clause);
        self
    }

    pub fn or(mut self, clause: Clause) -> Self {
        self.push(Some(Conjunction::Or), clause);
        self
    }

    /// Append with an implicit AND.
    pub fn then(mut self, clause: Clause) -> Self {
        self.push(None, clause);
        self
    }

    pub fn entries(&self) -> &[(Clause, Option<Conjunction>)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_text_operation(&self) -> bool {
        self.entries.iter().any(|(c, _)| c.node.has_text_operation())
    }

    fn dump_with(&self, out: &mut String, render: fn(&QueryNode, &mut String)) {
        out.push('(');
        for (clause, conjunction) in &self.entries {
            if let Some(conjunction) = conjunction {
                out.push_str(conjunction.dump());
            }
            clause.dump_with(out, render);
        }
        out.push(')');
    }

    /// Compile children in order.
    ///
    /// Under negation the grouping is rewritten by De Morgan: every child is
    /// negated and AND/OR swap. AND binds tighter than OR, so each run of
    /// AND-joined entries becomes its own nested group before the swap.
    fn compile(&self, ctx: &dyn SearchContext, negate: bool) -> Result<CompiledOperation> {
        if !negate {
            let mut entries = Vec::with_capacity(self.entries.len());
            for (clause, conjunction) in &self.entries {
                entries.push((clause.node.compile(ctx, clause.negated())?, *conjunction));
            }
            return Ok(CompiledOperation::Group { entries });
        }

        // split into OR-separated runs of AND-joined clauses
        let mut runs: Vec<Vec<&Clause>> = Vec::new();
        for (clause, conjunction) in &self.entries {
            if runs.is_empty() || *conjunction == Some(Conjunction::Or) {
                runs.push(vec![clause]);
            } else if let Some(run) = runs.last_mut() {
                run.push(clause);
            }
        }

        // NOT(r1 OR r2) = NOT r1 AND NOT r2, NOT(a AND b) = NOT a OR NOT b
        let mut entries = Vec::with_capacity(runs.len());
        for run in runs {
            let mut negated = Vec::with_capacity(run.len());
            for clause in run {
                let conjunction = (!negated.is_empty()).then_some(Conjunction::Or);
                negated.push((clause.node.compile(ctx, !clause.negated())?, conjunction));
            }
            let op = if negated.len() == 1 {
                negated.remove(0).0
            } else {
                CompiledOperation::Group { entries: negated }
            };
            let conjunction = (!entries.is_empty()).then_some(Conjunction::And);
            entries.push((op, conjunction));
        }
        Ok(CompiledOperation::Group { entries })
    }
}

impl fmt::Display for SubQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (clause, conjunction)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", conjunction.unwrap_or(Conjunction::And))?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
