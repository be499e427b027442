//! `is:` shortcuts such as `unread`, `local` and `tome`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use tracing::debug;

use super::{ConvCountClause, InClause, QueryNode, SubQuery, TagClause, TextClause, TextField};
use crate::context::SearchContext;
use crate::operation::{Flag, FolderScope};
use crate::{Error, Result};

type Factory = fn(&dyn SearchContext) -> Result<QueryNode>;

fn flag(flag: Flag, sense: bool, display: &str) -> Result<QueryNode> {
    Ok(QueryNode::Tag(TagClause::flag(flag, sense, display)))
}

fn folder(scope: FolderScope, include_subfolders: bool) -> Result<QueryNode> {
    Ok(QueryNode::In(InClause::new(scope, include_subfolders)))
}

/// Items addressed to or from the account.
///
/// To and Cc match every account address; From matches the sent flag.
fn me(ctx: &dyn SearchContext, fields: &[TextField]) -> Result<QueryNode> {
    let mut nodes = Vec::new();
    for &field in fields {
        if field == TextField::From {
            nodes.push(QueryNode::Tag(TagClause::flag(Flag::Sent, true, "SENT")));
            continue;
        }
        for address in ctx.addresses() {
            nodes.push(QueryNode::Text(TextClause::new(ctx, field, address, false)));
        }
    }
    Ok(QueryNode::Sub(SubQuery::any_of(nodes)))
}

const BUILTINS: &[(&str, Factory)] = &[
    ("read", |_| flag(Flag::Unread, false, "READ")),
    ("unread", |_| flag(Flag::Unread, true, "UNREAD")),
    ("flagged", |_| flag(Flag::Flagged, true, "FLAGGED")),
    ("unflagged", |_| flag(Flag::Flagged, false, "UNFLAGGED")),
    ("draft", |_| flag(Flag::Draft, true, "DRAFT")),
    ("sent", |_| flag(Flag::Sent, true, "SENT")),
    ("fromme", |_| flag(Flag::Sent, true, "SENT")),
    ("received", |_| flag(Flag::Sent, false, "RECEIVED")),
    ("replied", |_| flag(Flag::Answered, true, "REPLIED")),
    ("unreplied", |_| flag(Flag::Answered, false, "UNREPLIED")),
    ("forwarded", |_| flag(Flag::Forwarded, true, "FORWARDED")),
    ("unforwarded", |_| flag(Flag::Forwarded, false, "UNFORWARDED")),
    ("invite", |_| flag(Flag::Invite, true, "INVITE")),
    ("anywhere", |_| folder(FolderScope::Any, false)),
    ("local", |_| folder(FolderScope::Local, false)),
    ("remote", |_| folder(FolderScope::Remote, true)),
    ("solo", |_| Ok(QueryNode::ConvCount(ConvCountClause::parse("1")?))),
    ("tome", |ctx| me(ctx, &[TextField::To])),
    ("ccme", |ctx| me(ctx, &[TextField::Cc])),
    ("tofromme", |ctx| me(ctx, &[TextField::To, TextField::From])),
    ("toccme", |ctx| me(ctx, &[TextField::To, TextField::Cc])),
    ("fromccme", |ctx| me(ctx, &[TextField::From, TextField::Cc])),
    ("tofromccme", |ctx| me(ctx, &[TextField::To, TextField::From, TextField::Cc])),
];

static REGISTRY: LazyLock<BTreeMap<&'static str, Factory>> =
    LazyLock::new(|| BUILTINS.iter().copied().collect());

/// Expand a built-in shortcut for the requesting account.
pub fn builtin(ctx: &dyn SearchContext, name: &str) -> Result<QueryNode> {
    let key = name.trim().to_ascii_lowercase();
    let factory = REGISTRY
        .get(key.as_str())
        .ok_or_else(|| Error::UnknownBuiltIn(name.to_string()))?;
    debug!(name = %key, "expanding built-in query");
    factory(ctx)
}

/// Registered names, sorted.
pub fn builtin_names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}
