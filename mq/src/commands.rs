//! CLI command implementations.

use std::path::Path;

use chrono::{DateTime, Utc};
use clauses::context::offset_from_minutes;
use clauses::query::{
    sender_clause, subject_clause, ContactClause, ConvCountClause, ConversationClause, DateClause,
    FieldClause, InClause, ItemClause, PriorityClause, SizeClause, SizeKind, TagClause,
    TextClause, TextField, TypeClause,
};
use clauses::{
    builtin, builtin_names, AccountZone, Config, DateType, QueryNode, SearchContext, StaticContext,
};
use tracing::debug;

use crate::error::{Error, Result};

/// Identity of the account the clause is compiled for.
pub struct AccountOptions {
    pub account: String,
    pub address: String,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub folders: Vec<String>,
    pub tz_offset: Option<i32>,
    pub timezone: Option<String>,
    pub locale: Option<String>,
    pub now: Option<i64>,
}

pub struct ExplainOptions {
    pub negate: bool,
    pub quick: bool,
    pub json: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    })
}

fn build_context(config: Config, opts: &AccountOptions) -> Result<StaticContext> {
    let mut ctx = StaticContext::new(&opts.account, &opts.address).with_config(config);
    for alias in &opts.aliases {
        ctx = ctx.with_alias(alias);
    }
    for tag in &opts.tags {
        let (name, id) = named_id("tag", tag)?;
        ctx = ctx.with_tag(name, id);
    }
    for folder in &opts.folders {
        let (name, id) = named_id("folder", folder)?;
        ctx = ctx.with_folder(name, id);
    }
    if let Some(minutes) = opts.tz_offset {
        ctx = ctx.with_timezone(offset_from_minutes(minutes));
    }
    if let Some(name) = &opts.timezone {
        let zone = AccountZone::named(name)
            .ok_or_else(|| Error::InvalidOption(format!("unknown timezone: {}", name)))?;
        ctx = ctx.with_timezone(zone);
    }
    if let Some(locale) = &opts.locale {
        ctx = ctx.with_locale(locale);
    }
    if let Some(ms) = opts.now {
        let now = DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or_else(|| Error::InvalidOption(format!("now out of range: {}", ms)))?;
        ctx = ctx.with_now(now);
    }
    Ok(ctx)
}

/// Split a `name=id` option value.
fn named_id<'a>(what: &str, option: &'a str) -> Result<(&'a str, i32)> {
    let (name, id) = option
        .split_once('=')
        .ok_or_else(|| Error::InvalidOption(format!("{} must be name=id: {}", what, option)))?;
    let id = id.parse().map_err(|_| {
        Error::InvalidOption(format!("{} id must be an integer: {}", what, option))
    })?;
    Ok((name, id))
}

/// Build the node for `kind:value`.
fn build_node(ctx: &dyn SearchContext, kind: &str, value: &str, quick: bool) -> Result<QueryNode> {
    let kind = kind.to_ascii_lowercase();
    if let Some(date_type) = DateType::from_keyword(&kind) {
        return Ok(QueryNode::Date(DateClause::parse(ctx, date_type, value)?));
    }

    let node = match kind.as_str() {
        "size" => QueryNode::Size(SizeClause::parse(SizeKind::Eq, value)?),
        "larger" => QueryNode::Size(SizeClause::parse(SizeKind::Larger, value)?),
        "smaller" => QueryNode::Size(SizeClause::parse(SizeKind::Smaller, value)?),
        "subject" if !quick => subject_clause(ctx, value)?,
        "from" if !quick => sender_clause(ctx, value)?,
        "field" => QueryNode::Field(FieldClause::parse(value)?),
        "contact" => QueryNode::Contact(ContactClause::new(value)),
        "item" => QueryNode::Item(ItemClause::parse(ctx, value)?),
        "conv" => conversation(ctx, value)?,
        "conv-count" => QueryNode::ConvCount(ConvCountClause::parse(value)?),
        "tag" => QueryNode::Tag(TagClause::for_name(ctx, value, true)),
        "is" => builtin(ctx, value)?,
        "type" => TypeClause::parse(value)?,
        "priority" => QueryNode::Priority(PriorityClause::parse(value)?),
        "in" => QueryNode::In(InClause::for_folder(ctx, value, false)?),
        "under" => QueryNode::In(InClause::for_folder(ctx, value, true)?),
        "inid" => QueryNode::In(InClause::for_folder_id(ctx, value, false)?),
        "underid" => QueryNode::In(InClause::for_folder_id(ctx, value, true)?),
        other => match TextField::from_keyword(other) {
            Some(field) => QueryNode::Text(TextClause::new(ctx, field, value, quick)),
            None => return Err(Error::UnknownKind(other.to_string())),
        },
    };
    Ok(node)
}

/// A negative conversation id is a virtual conversation holding the single
/// message with the positive id.
fn conversation(ctx: &dyn SearchContext, value: &str) -> Result<QueryNode> {
    let trimmed = value.trim();
    if let Some(item) = trimmed.strip_prefix('-') {
        if !item.is_empty() && item.bytes().all(|b| b.is_ascii_digit()) {
            debug!(clause = "conv", "virtual conversation, matching item");
            return Ok(QueryNode::Item(ItemClause::parse(ctx, item)?));
        }
    }
    Ok(QueryNode::Conversation(ConversationClause::new(ctx, value)?))
}

/// Build a clause and print its dumps and compiled operation.
pub fn explain(
    config_path: Option<&Path>,
    account: &AccountOptions,
    kind: &str,
    value: &str,
    opts: &ExplainOptions,
) -> Result<()> {
    let config = load_config(config_path)?;
    let ctx = build_context(config, account)?;

    let node = build_node(&ctx, kind, value, opts.quick)?;
    let operation = node.compile(&ctx, opts.negate)?;
    let query = operation.to_query_string();

    if opts.json {
        let out = serde_json::json!({
            "dump": node.dump_string(),
            "sanitized": node.sanitized_string(),
            "has_text_operation": node.has_text_operation(),
            "query": query,
            "operation": operation,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("clause:     {}", node);
    println!("dump:       {}", node.dump_string());
    println!("sanitized:  {}", node.sanitized_string());
    println!("full-text:  {}", node.has_text_operation());
    if let Some(query) = query {
        println!("query:      {}", query);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&operation)?);
    Ok(())
}

/// List built-in shortcut names.
pub fn builtins() -> Result<()> {
    for name in builtin_names() {
        println!("{}", name);
    }
    Ok(())
}

/// Print the effective config, or save it.
pub fn config(config_path: Option<&Path>, write: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    match write {
        Some(path) => {
            config.save(path)?;
            println!("Wrote config to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}
