//! Item and conversation identity clauses.

use super::TEXT_PLACEHOLDER;
use crate::context::SearchContext;
use crate::operation::{CompiledOperation, ItemId, ItemIdSet, Predicate, RelationalOperation};
use crate::{Error, Result};

/// Parse `id` or `account:id`; bare ids belong to the requesting account.
fn parse_item_id(ctx: &dyn SearchContext, clause: &'static str, text: &str) -> Result<ItemId> {
    let text = text.trim();
    let (account, id) = match text.rsplit_once(':') {
        Some((account, id)) if !account.is_empty() => (account.to_string(), id),
        Some(_) => return Err(Error::parse(clause, text)),
        None => (ctx.account_id().to_string(), text),
    };

    let digits = id.strip_prefix('-').unwrap_or(id);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(clause, text));
    }
    let id: i64 = id.parse().map_err(|_| Error::parse(clause, text))?;
    if id < 0 {
        return Err(Error::InvalidRequest(format!("negative {} id", clause)));
    }
    Ok(ItemId { account, id })
}

/// Match items by id: `all`, `none`, a comma list, or an inclusive `a--b` range.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemClause {
    ids: ItemIdSet,
}

impl ItemClause {
    pub fn parse(ctx: &dyn SearchContext, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self { ids: ItemIdSet::All });
        }
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self { ids: ItemIdSet::None });
        }

        let parts: Vec<&str> = trimmed.split("--").collect();
        let ids = match parts.as_slice() {
            [list] => {
                let ids = list
                    .split(',')
                    .map(|id| parse_item_id(ctx, "item", id))
                    .collect::<Result<Vec<_>>>()?;
                ItemIdSet::List(ids)
            }
            [low, high] => {
                if low.contains(',') || high.contains(',') {
                    return Err(Error::InvalidRequest(
                        "item list and range cannot be combined".to_string(),
                    ));
                }
                let low = parse_item_id(ctx, "item", low)?;
                let high = parse_item_id(ctx, "item", high)?;
                if low.account != high.account || low.id > high.id {
                    return Err(Error::InvalidRequest(
                        "item range must be ascending within one account".to_string(),
                    ));
                }
                ItemIdSet::Range { low, high }
            }
            _ => return Err(Error::parse("item", text)),
        };
        Ok(Self { ids })
    }

    pub fn ids(&self) -> &ItemIdSet {
        &self.ids
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        CompiledOperation::Relational(RelationalOperation {
            predicate: Predicate::ItemIds(self.ids.clone()),
            negated: negate,
            label,
        })
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("ITEMID,");
        out.push_str(&self.ids.to_string());
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("ITEMID,");
        out.push_str(TEXT_PLACEHOLDER);
    }
}

/// Match items in one conversation.
///
/// Virtual conversations (negative ids) are single items; callers route
/// those to [`ItemClause`] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationClause {
    id: ItemId,
}

impl ConversationClause {
    pub fn new(ctx: &dyn SearchContext, text: &str) -> Result<Self> {
        Ok(Self {
            id: parse_item_id(ctx, "conversation", text)?,
        })
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub(crate) fn compile(&self, negate: bool, label: String) -> CompiledOperation {
        CompiledOperation::Relational(RelationalOperation {
            predicate: Predicate::ConversationId(self.id.clone()),
            negated: negate,
            label,
        })
    }

    pub(crate) fn dump(&self, out: &mut String) {
        out.push_str("CONV,");
        out.push_str(&self.id.to_string());
    }

    pub(crate) fn sanitized_dump(&self, out: &mut String) {
        out.push_str("CONV,");
        out.push_str(TEXT_PLACEHOLDER);
    }
}
