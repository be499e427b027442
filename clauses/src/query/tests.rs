//! Tests for query nodes: construction, dumps, polarity and compilation.

use super::*;
use crate::context::StaticContext;
use crate::date::DateType;
use crate::numeric;
use crate::operation::{
    DateColumn, Flag, FolderRef, FolderScope, FullTextTerm, ItemId, ItemIdSet, Predicate,
    Priority, TagRef,
};
use crate::range::{Bound, CompareOp, Range};
use crate::Error;
use chrono::{TimeZone, Utc};

fn ctx() -> StaticContext {
    StaticContext::new("acct", "me@example.com")
}

fn size(text: &str) -> QueryNode {
    QueryNode::Size(SizeClause::parse(SizeKind::Eq, text).unwrap())
}

fn predicate(op: &CompiledOperation) -> &Predicate {
    match op {
        CompiledOperation::Relational(rel) => &rel.predicate,
        other => panic!("expected relational operation, got {:?}", other),
    }
}

fn full_text_term(op: &CompiledOperation) -> (&str, &FullTextTerm) {
    match op {
        CompiledOperation::FullText(ft) => (&ft.field, &ft.term),
        other => panic!("expected full-text operation, got {:?}", other),
    }
}

fn group_entries(op: &CompiledOperation) -> &[(CompiledOperation, Option<Conjunction>)] {
    match op {
        CompiledOperation::Group { entries } => entries,
        other => panic!("expected group, got {:?}", other),
    }
}

// Size

#[test]
fn test_size_exact() {
    let clause = SizeClause::parse(SizeKind::Eq, "10kb").unwrap();
    assert_eq!(clause.bytes(), 10240);
    assert_eq!(
        clause.range(),
        Range::new(Bound::Included(10240), Bound::Included(10240))
    );

    let node = QueryNode::Size(clause);
    assert_eq!(node.dump_string(), "SIZE:=10240");
    assert_eq!(node.sanitized_string(), "SIZE:=$NUM");
}

#[test]
fn test_size_at_least() {
    let clause = SizeClause::parse(SizeKind::Eq, ">=10kb").unwrap();
    assert_eq!(clause.range(), Range::new(Bound::Included(10240), Bound::Unbounded));
}

#[test]
fn test_size_larger_smaller() {
    let larger = SizeClause::parse(SizeKind::Larger, "1M").unwrap();
    assert_eq!(larger.op(), CompareOp::Gt);
    assert_eq!(
        larger.range(),
        Range::new(Bound::Excluded(1 << 20), Bound::Unbounded)
    );

    let smaller = SizeClause::parse(SizeKind::Smaller, "2gb").unwrap();
    assert_eq!(smaller.range(), Range::new(Bound::Unbounded, Bound::Excluded(2i64 << 30)));

    assert_eq!(
        QueryNode::Size(larger).dump_string(),
        format!("SIZE:>{}", 1 << 20)
    );
}

#[test]
fn test_size_rejects_bad_input() {
    assert!(SizeClause::parse(SizeKind::Larger, ">10").is_err());
    assert!(SizeClause::parse(SizeKind::Smaller, "<=10").is_err());
    assert!(SizeClause::parse(SizeKind::Eq, "kb").is_err());
    assert!(SizeClause::parse(SizeKind::Eq, "10tb").is_err());
    assert!(SizeClause::parse(SizeKind::Eq, "").is_err());
    assert!(SizeClause::parse(SizeKind::Eq, "99999999999999gb").is_err());
}

#[test]
fn test_size_compiles_relational() {
    let op = size("<5").compile(&ctx(), false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::SizeRange(Range::new(Bound::Unbounded, Bound::Excluded(5)))
    );
    assert_eq!(op.label(), Some("SIZE:<5"));
    assert!(!op.is_negated());
    assert!(op.to_query_string().is_none());
}

// Structured fields

#[test]
fn test_field_numeric_at_least() {
    let node = QueryNode::Field(FieldClause::parse("age:>=5").unwrap());
    assert_eq!(node.dump_string(), "l.field:age#:>=5");
    assert_eq!(node.sanitized_string(), "l.field:$TEXT#:>=$NUM");

    let op = node.compile(&ctx(), false).unwrap();
    let (field, term) = full_text_term(&op);
    assert_eq!(field, FIELD_INDEX);
    assert_eq!(
        term,
        &FullTextTerm::Range {
            low: Bound::Included(numeric::field_term("age", 5)),
            high: Bound::Included(numeric::field_term("age", i64::MAX)),
        }
    );
}

#[test]
fn test_field_numeric_exact_and_below() {
    let exact = FieldClause::parse("#age:30").unwrap();
    assert_eq!(
        exact.value(),
        &FieldValue::Numeric {
            op: CompareOp::Eq,
            value: 30
        }
    );
    assert_eq!(QueryNode::Field(exact.clone()).dump_string(), "l.field:age#:30");

    let op = QueryNode::Field(exact).compile(&ctx(), false).unwrap();
    let (_, term) = full_text_term(&op);
    assert_eq!(
        term,
        &FullTextTerm::Range {
            low: Bound::Included(numeric::field_term("age", 30)),
            high: Bound::Excluded(numeric::field_term("age", 31)),
        }
    );

    let below = QueryNode::Field(FieldClause::parse("age:<-2").unwrap());
    let op = below.compile(&ctx(), false).unwrap();
    let (_, term) = full_text_term(&op);
    assert_eq!(
        term,
        &FullTextTerm::Range {
            low: Bound::Included(numeric::field_term("age", i64::MIN)),
            high: Bound::Excluded(numeric::field_term("age", -2)),
        }
    );
}

#[test]
fn test_field_text() {
    let node = QueryNode::Field(FieldClause::parse("Company:\"Zimbra\"").unwrap());
    assert_eq!(node.dump_string(), "l.field:company:zimbra");
    assert_eq!(node.sanitized_string(), "l.field:$TEXT");

    let op = node.compile(&ctx(), false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::Term("company:zimbra".to_string()));
    assert_eq!(op.to_query_string().unwrap(), "#company:\"zimbra\"");
}

#[test]
fn test_field_text_prefix() {
    let node = QueryNode::Field(FieldClause::parse("title:eng*").unwrap());
    assert_eq!(node.dump_string(), "l.field:title:eng*");
    assert_eq!(node.sanitized_string(), "l.field:$TEXT*");
    let op = node.compile(&ctx(), false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::Prefix("title:eng".to_string()));
}

#[test]
fn test_field_overflow_falls_back_to_text() {
    let clause = FieldClause::parse("size:99999999999999999999").unwrap();
    assert!(matches!(clause.value(), FieldValue::Text { .. }));
    assert_eq!(
        QueryNode::Field(clause).dump_string(),
        "l.field:size:99999999999999999999"
    );
}

#[test]
fn test_field_rejects_malformed() {
    assert!(FieldClause::parse("novalue").is_err());
    assert!(FieldClause::parse(":value").is_err());
    assert!(FieldClause::parse("name:").is_err());
}

// Text and contact

#[test]
fn test_contact_phrase_prefix() {
    let node = QueryNode::Contact(ContactClause::new("john sm*"));
    assert_eq!(node.dump_string(), "CONTACT:john,sm");
    assert_eq!(node.sanitized_string(), "CONTACT:$TEXT");

    let op = node.compile(&ctx(), false).unwrap();
    let (field, term) = full_text_term(&op);
    assert_eq!(field, "contact_data");
    assert_eq!(
        term,
        &FullTextTerm::Phrase {
            terms: vec!["john".to_string(), "sm".to_string()],
            last_is_prefix: true,
        }
    );
}

#[test]
fn test_contact_single_and_empty() {
    let op = QueryNode::Contact(ContactClause::new("john"))
        .compile(&ctx(), false)
        .unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::Prefix("john".to_string()));

    let empty = QueryNode::Contact(ContactClause::new(" , "));
    assert_eq!(empty.dump_string(), "CONTACT:");
    let op = empty.compile(&ctx(), false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::NoOp);
}

#[test]
fn test_text_quick_mode() {
    let node = QueryNode::Text(TextClause::new(&ctx(), TextField::Content, "all hands meeting", true));
    assert_eq!(node.dump_string(), "l.content:all,hands,meeting[*]");
    assert_eq!(node.sanitized_string(), "l.content:$TEXT[*]");
    let op = node.compile(&ctx(), false).unwrap();
    assert_eq!(op.to_query_string().unwrap(), "content:\"all hands meeting*\"");
}

#[test]
fn test_text_terms() {
    let ctx = ctx();
    let single = QueryNode::Text(TextClause::new(&ctx, TextField::Subject, "Budget", false));
    assert_eq!(single.dump_string(), "subject:budget");
    let op = single.compile(&ctx, false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::Term("budget".to_string()));

    let phrase = QueryNode::Text(TextClause::new(&ctx, TextField::Content, "one two three", false));
    let op = phrase.compile(&ctx, false).unwrap();
    assert_eq!(op.to_query_string().unwrap(), "content:\"one two three\"");

    let wildcard = QueryNode::Text(TextClause::new(&ctx, TextField::Content, "meet*", false));
    assert_eq!(wildcard.dump_string(), "l.content:meet[*]");
    let op = wildcard.compile(&ctx, false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::Prefix("meet".to_string()));
}

#[test]
fn test_text_only_stop_words() {
    let node = QueryNode::Text(TextClause::new(&ctx(), TextField::Content, "the and of", false));
    assert_eq!(node.dump_string(), "l.content:");
    assert_eq!(node.sanitized_string(), "l.content:");
    let op = node.compile(&ctx(), false).unwrap();
    assert_eq!(full_text_term(&op).1, &FullTextTerm::NoOp);
}

#[test]
fn test_text_negated() {
    let node = QueryNode::Text(TextClause::new(&ctx(), TextField::From, "bob@example.com", false));
    assert_eq!(node.dump_string(), "from:bob@example.com");
    let op = node.compile(&ctx(), true).unwrap();
    assert!(op.is_negated());
    assert_eq!(op.to_query_string().unwrap(), "-from:bob@example.com");
}

#[test]
fn test_text_field_keywords() {
    assert_eq!(TextField::from_keyword("content"), Some(TextField::Content));
    assert_eq!(TextField::from_keyword("CC"), Some(TextField::Cc));
    assert_eq!(TextField::from_keyword("body"), None);
}

// Subject and sender

#[test]
fn test_subject_range_or_text() {
    let ctx = ctx();
    let range = subject_clause(&ctx, ">m").unwrap();
    assert_eq!(range.dump_string(), "SUBJECT:>m");
    assert_eq!(range.sanitized_string(), "SUBJECT:>$TEXT");
    assert!(!range.has_text_operation());
    let op = range.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::SubjectRange(Range::new(Bound::Excluded("m".to_string()), Bound::Unbounded))
    );

    let text = subject_clause(&ctx, "hello").unwrap();
    assert_eq!(text.dump_string(), "subject:hello");
    assert!(text.has_text_operation());
}

#[test]
fn test_sender_range() {
    let ctx = ctx();
    let node = sender_clause(&ctx, "<=b").unwrap();
    assert_eq!(node.dump_string(), "FROM:<=b");
    let op = node.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::SenderRange(Range::new(Bound::Unbounded, Bound::Included("b".to_string())))
    );

    assert!(sender_clause(&ctx, ">").is_err());
    assert!(StringRangeClause::parse(StringTarget::Sender, "b").is_err());
}

// Dates

#[test]
fn test_date_clause_dump() {
    let ctx = ctx().with_now(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
    let node = QueryNode::Date(DateClause::parse(&ctx, DateType::Date, "1/2/2024").unwrap());
    assert_eq!(node.dump_string(), "DATE:DATE,2024-01-02T00:00-2024-01-03T00:00");
    assert_eq!(node.sanitized_string(), "DATE:DATE,$DATE-$DATE");

    let after = QueryNode::Date(DateClause::parse(&ctx, DateType::After, "1/2/2024").unwrap());
    assert_eq!(after.dump_string(), "DATE:AFTER,2024-01-03T00:00-*");

    let op = node.compile(&ctx, false).unwrap();
    match predicate(&op) {
        Predicate::DateRange { column, .. } => assert_eq!(*column, DateColumn::Date),
        other => panic!("unexpected predicate {:?}", other),
    }
}

#[test]
fn test_date_clause_parse_error() {
    assert!(DateClause::parse(&ctx(), DateType::Date, "not a date").is_err());
}

// Conversation count

#[test]
fn test_conv_count() {
    let clause = ConvCountClause::parse(">1").unwrap();
    assert_eq!(clause.range(), Range::new(Bound::Included(2), Bound::Unbounded));
    let node = QueryNode::ConvCount(clause);
    assert_eq!(node.dump_string(), "CONV-COUNT:>1");
    assert_eq!(node.sanitized_string(), "CONV-COUNT:>$NUM");

    assert!(ConvCountClause::parse("-1").is_err());
    assert!(ConvCountClause::parse("many").is_err());
}

// Identity

#[test]
fn test_item_list() {
    let clause = ItemClause::parse(&ctx(), "1,2,other:3").unwrap();
    assert_eq!(
        clause.ids(),
        &ItemIdSet::List(vec![
            ItemId { account: "acct".to_string(), id: 1 },
            ItemId { account: "acct".to_string(), id: 2 },
            ItemId { account: "other".to_string(), id: 3 },
        ])
    );
    let node = QueryNode::Item(clause);
    assert_eq!(node.dump_string(), "ITEMID,acct:1,acct:2,other:3");
    assert_eq!(node.sanitized_string(), "ITEMID,$TEXT");
}

#[test]
fn test_item_all_none_range() {
    let ctx = ctx();
    let all = QueryNode::Item(ItemClause::parse(&ctx, "ALL").unwrap());
    assert_eq!(all.dump_string(), "ITEMID,all");
    let none = QueryNode::Item(ItemClause::parse(&ctx, "none").unwrap());
    assert_eq!(none.dump_string(), "ITEMID,none");

    let range = QueryNode::Item(ItemClause::parse(&ctx, "1--10").unwrap());
    assert_eq!(range.dump_string(), "ITEMID,acct:1--acct:10");
    let op = range.compile(&ctx, false).unwrap();
    assert!(matches!(predicate(&op), Predicate::ItemIds(ItemIdSet::Range { .. })));
}

#[test]
fn test_item_errors() {
    let ctx = ctx();
    assert!(matches!(ItemClause::parse(&ctx, "1--2--3"), Err(Error::Parse { .. })));
    assert!(matches!(ItemClause::parse(&ctx, "1,2--5"), Err(Error::InvalidRequest(_))));
    assert!(matches!(ItemClause::parse(&ctx, "-5"), Err(Error::InvalidRequest(_))));
    assert!(matches!(ItemClause::parse(&ctx, "10--1"), Err(Error::InvalidRequest(_))));
    assert!(matches!(
        ItemClause::parse(&ctx, "a:1--b:5"),
        Err(Error::InvalidRequest(_))
    ));
    assert!(matches!(ItemClause::parse(&ctx, "abc"), Err(Error::Parse { .. })));
    assert!(matches!(ItemClause::parse(&ctx, ":5"), Err(Error::Parse { .. })));
}

#[test]
fn test_conversation() {
    let ctx = ctx();
    let node = QueryNode::Conversation(ConversationClause::new(&ctx, "12").unwrap());
    assert_eq!(node.dump_string(), "CONV,acct:12");
    assert_eq!(node.sanitized_string(), "CONV,$TEXT");
    let op = node.compile(&ctx, true).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::ConversationId(ItemId { account: "acct".to_string(), id: 12 })
    );
    assert!(op.is_negated());

    assert!(matches!(
        ConversationClause::new(&ctx, "-3"),
        Err(Error::InvalidRequest(_))
    ));
}

// Tags, folders, priority

#[test]
fn test_tag_polarity() {
    let ctx = ctx();
    let unread = builtin(&ctx, "unread").unwrap();
    assert_eq!(unread.to_string(), "Q(TAG:\\Unread,UNREAD)");

    let op = unread.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::Tag { tag: TagRef::Flag(Flag::Unread), present: true }
    );
    assert!(!op.is_negated());

    let op = unread.compile(&ctx, true).unwrap();
    assert!(op.is_negated());

    let read = builtin(&ctx, "read").unwrap();
    let op = read.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::Tag { tag: TagRef::Flag(Flag::Unread), present: false }
    );
    let op = read.compile(&ctx, true).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::Tag { tag: TagRef::Flag(Flag::Unread), present: true }
    );
}

#[test]
fn test_tag_never_sets_negated() {
    let ctx = ctx();
    let op = QueryNode::Tag(TagClause::for_name(&ctx, "\\Flagged", true))
        .compile(&ctx, true)
        .unwrap();
    match op {
        CompiledOperation::Relational(rel) => assert!(!rel.negated),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_tag_lookup() {
    let ctx = ctx().with_tag("Work", 7);
    let user = TagClause::for_name(&ctx, "work", true);
    assert_eq!(user.tag(), &TagRef::User { id: 7, name: "Work".to_string() });
    let node = QueryNode::Tag(user);
    assert_eq!(node.dump_string(), "TAG:Work");
    assert_eq!(node.sanitized_string(), "TAG:$TAG");

    let remote = TagClause::for_name(&ctx, "shared-tag", true);
    assert_eq!(remote.tag(), &TagRef::Remote { name: "shared-tag".to_string() });

    let flag = QueryNode::Tag(TagClause::for_name(&ctx, "\\draft", true));
    assert_eq!(flag.dump_string(), "TAG:\\Draft");
    assert_eq!(flag.sanitized_string(), "TAG:\\Draft");
}

#[test]
fn test_folder_scope() {
    let ctx = ctx();
    let remote = builtin(&ctx, "remote").unwrap();
    assert_eq!(remote.to_string(), "Q(UNDER:REMOTE)");
    assert_eq!(remote.sanitized_string(), "UNDER:REMOTE");

    let local = builtin(&ctx, "local").unwrap();
    assert_eq!(local.dump_string(), "IN:LOCAL");
    let op = local.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::Folder { scope: FolderScope::Local, include_subfolders: false }
    );

    assert_eq!(builtin(&ctx, "anywhere").unwrap().dump_string(), "IN:ANY_FOLDER");
}

#[test]
fn test_folder_by_name() {
    let ctx = ctx().with_folder("Projects", 257);
    let clause = InClause::for_folder(&ctx, "inbox", false).unwrap();
    assert_eq!(clause.scope(), None);
    assert_eq!(clause.folder().map(|f| f.id), Some(2));

    let node = QueryNode::In(clause);
    assert_eq!(node.to_string(), "Q(IN:/Inbox)");
    assert_eq!(node.sanitized_string(), "IN:$FOLDER");

    let under = QueryNode::In(InClause::for_folder(&ctx, "/projects", true).unwrap());
    assert_eq!(under.dump_string(), "UNDER:/Projects");
    let op = under.compile(&ctx, true).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::InFolder {
            folder: FolderRef { id: 257, name: "Projects".to_string() },
            include_subfolders: true,
        }
    );
    assert!(op.is_negated());

    assert!(matches!(
        InClause::for_folder(&ctx, "Archive", false),
        Err(Error::NoSuchFolder)
    ));
}

#[test]
fn test_folder_by_id() {
    let ctx = ctx();
    let trash = QueryNode::In(InClause::for_folder_id(&ctx, "3", false).unwrap());
    assert_eq!(trash.dump_string(), "IN:/Trash");
    assert_eq!(trash.sanitized_string(), "IN:$FOLDER");

    // everything under the root is every folder
    let root = QueryNode::In(InClause::for_folder_id(&ctx, "1", true).unwrap());
    assert_eq!(root.dump_string(), "UNDER:ANY_FOLDER");
    assert_eq!(root.sanitized_string(), "UNDER:ANY_FOLDER");

    assert!(matches!(InClause::for_folder_id(&ctx, "999", false), Err(Error::NoSuchFolder)));
    assert!(matches!(InClause::for_folder_id(&ctx, "inbox", false), Err(Error::Parse { .. })));
}

#[test]
fn test_folder_group_sanitized() {
    let ctx = ctx();
    let under = |id: &str| QueryNode::In(InClause::for_folder_id(&ctx, id, true).unwrap());
    let sub = SubQuery::new()
        .then(Clause::new(under("1")))
        .and(Clause::with_modifier(Modifier::Minus, under("3")))
        .and(Clause::with_modifier(Modifier::Minus, under("4")));
    let node = QueryNode::Sub(sub);
    assert_eq!(
        node.sanitized_string(),
        "(Q(UNDER:ANY_FOLDER)Q(&&)-Q(UNDER:$FOLDER)Q(&&)-Q(UNDER:$FOLDER))"
    );
    assert_eq!(
        node.dump_string(),
        "(Q(UNDER:ANY_FOLDER)Q(&&)-Q(UNDER:/Trash)Q(&&)-Q(UNDER:/Junk))"
    );
}

#[test]
fn test_priority() {
    let ctx = ctx();
    let node = QueryNode::Priority(PriorityClause::parse("HIGH").unwrap());
    assert_eq!(node.dump_string(), "PRIORITY:HIGH");
    assert_eq!(node.sanitized_string(), "PRIORITY:HIGH");
    let op = node.compile(&ctx, false).unwrap();
    assert_eq!(predicate(&op), &Predicate::Priority(Priority::High));

    assert_eq!(PriorityClause::parse("low").unwrap().priority(), Priority::Low);
    assert!(PriorityClause::parse("urgent").is_err());
}

// Types

#[test]
fn test_type_alias_expands() {
    let node = TypeClause::parse("Word").unwrap();
    assert_eq!(
        node.dump_string(),
        "(Q(type:application/msword)Q(||)Q(type:application/vnd.openxmlformats-officedocument.wordprocessingml.document))"
    );
    assert_eq!(node.sanitized_string(), "(Q(type:$TEXT)Q(||)Q(type:$TEXT))");
    assert!(node.has_text_operation());

    let op = node.compile(&ctx(), false).unwrap();
    assert_eq!(
        op.to_query_string().unwrap(),
        "(type:application/msword OR type:application/vnd.openxmlformats-officedocument.wordprocessingml.document)"
    );
}

#[test]
fn test_type_single_and_passthrough() {
    let pdf = TypeClause::parse("pdf").unwrap();
    assert_eq!(pdf.dump_string(), "type:application/pdf");

    let other = TypeClause::parse("text/plain").unwrap();
    assert_eq!(other.dump_string(), "type:text/plain");

    assert!(TypeClause::parse("  ").is_err());
}

// Groupings

#[test]
fn test_group_dump_and_display() {
    let ctx = ctx().with_tag("work", 3);
    let sub = SubQuery::new()
        .then(Clause::new(size(">10240")))
        .or(Clause::with_modifier(
            Modifier::Minus,
            QueryNode::Tag(TagClause::for_name(&ctx, "work", true)),
        ));
    let node = QueryNode::Sub(sub);
    assert_eq!(node.dump_string(), "(Q(SIZE:>10240)Q(||)-Q(TAG:work))");
    assert_eq!(node.sanitized_string(), "(Q(SIZE:>$NUM)Q(||)-Q(TAG:$TAG))");
    assert_eq!(node.to_string(), "(Q(SIZE:>10240) || -Q(TAG:work))");
}

#[test]
fn test_group_nested_dump() {
    let inner = SubQuery::new()
        .then(Clause::new(size("1")))
        .and(Clause::new(size("2")));
    let outer = SubQuery::new()
        .then(Clause::with_modifier(Modifier::Plus, QueryNode::Sub(inner)))
        .then(Clause::new(size("3")));
    assert_eq!(
        QueryNode::Sub(outer).dump_string(),
        "(+(Q(SIZE:=1)Q(&&)Q(SIZE:=2))Q(SIZE:=3))"
    );
}

#[test]
fn test_group_first_marker_dropped() {
    let sub = SubQuery::new().or(Clause::new(size("1")));
    assert_eq!(sub.entries()[0].1, None);
}

#[test]
fn test_group_has_text_operation() {
    let ctx = ctx();
    let relational = SubQuery::new().then(Clause::new(size("1")));
    assert!(!QueryNode::Sub(relational.clone()).has_text_operation());

    let mixed = relational.or(Clause::new(QueryNode::Text(TextClause::new(
        &ctx,
        TextField::Content,
        "hello",
        false,
    ))));
    assert!(QueryNode::Sub(mixed).has_text_operation());
}

#[test]
fn test_group_compile_positive() {
    let ctx = ctx();
    let sub = SubQuery::new()
        .then(Clause::new(size("1")))
        .or(Clause::with_modifier(Modifier::Minus, size("2")));
    let op = QueryNode::Sub(sub).compile(&ctx, false).unwrap();
    let entries = group_entries(&op);
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].0.is_negated());
    assert_eq!(entries[0].1, None);
    assert!(entries[1].0.is_negated());
    assert_eq!(entries[1].1, Some(Conjunction::Or));
}

#[test]
fn test_group_compile_de_morgan() {
    // NOT(a AND b OR c) = (NOT a OR NOT b) AND NOT c
    let ctx = ctx();
    let sub = SubQuery::new()
        .then(Clause::new(size("1")))
        .and(Clause::new(size("2")))
        .or(Clause::new(size("3")));
    let op = QueryNode::Sub(sub).compile(&ctx, true).unwrap();

    let entries = group_entries(&op);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].1, None);
    assert_eq!(entries[1].1, Some(Conjunction::And));

    let first = group_entries(&entries[0].0);
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|(op, _)| op.is_negated()));
    assert_eq!(first[1].1, Some(Conjunction::Or));
    assert_eq!(first[0].0.label(), Some("SIZE:=1"));

    assert!(entries[1].0.is_negated());
    assert_eq!(entries[1].0.label(), Some("SIZE:=3"));
}

#[test]
fn test_group_negated_minus_cancels() {
    let ctx = ctx();
    let sub = SubQuery::new().then(Clause::with_modifier(Modifier::Minus, size("1")));
    let op = QueryNode::Sub(sub).compile(&ctx, true).unwrap();
    let entries = group_entries(&op);
    assert!(!entries[0].0.is_negated());
}

#[test]
fn test_conjunction_flip() {
    assert_eq!(Conjunction::And.flip(), Conjunction::Or);
    assert_eq!(Conjunction::Or.flip(), Conjunction::And);
}

// Built-ins

#[test]
fn test_builtin_me_expansion() {
    let ctx = ctx().with_alias("alias@example.com");
    let tome = builtin(&ctx, "tome").unwrap();
    assert_eq!(
        tome.dump_string(),
        "(Q(to:me@example.com)Q(||)Q(to:alias@example.com))"
    );

    let tofromme = builtin(&ctx, "ToFromMe").unwrap();
    assert_eq!(
        tofromme.dump_string(),
        "(Q(to:me@example.com)Q(||)Q(to:alias@example.com)Q(||)Q(TAG:\\Sent,SENT))"
    );
    assert_eq!(
        tofromme.sanitized_string(),
        "(Q(to:$TEXT)Q(||)Q(to:$TEXT)Q(||)Q(TAG:\\Sent,SENT))"
    );
}

#[test]
fn test_builtin_solo_and_sent() {
    let ctx = ctx();
    let solo = builtin(&ctx, "solo").unwrap();
    assert_eq!(solo.dump_string(), "CONV-COUNT:=1");
    let op = solo.compile(&ctx, false).unwrap();
    assert_eq!(
        predicate(&op),
        &Predicate::ConvCount(Range::new(Bound::Included(1), Bound::Excluded(2)))
    );

    assert_eq!(builtin(&ctx, "fromme").unwrap().dump_string(), "TAG:\\Sent,SENT");
    assert_eq!(builtin(&ctx, "received").unwrap().dump_string(), "TAG:\\Sent,RECEIVED");
}

#[test]
fn test_builtin_unknown() {
    assert!(matches!(
        builtin(&ctx(), "starred"),
        Err(Error::UnknownBuiltIn(name)) if name == "starred"
    ));
}

#[test]
fn test_builtin_names_sorted() {
    let names = builtin_names();
    assert_eq!(names.len(), 23);
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    for name in names {
        assert!(builtin(&ctx(), name).is_ok(), "{}", name);
    }
}

// Labels

#[test]
fn test_label_mirrors_dump() {
    let ctx = ctx().with_now(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
    let nodes = vec![
        size(">1k"),
        QueryNode::Field(FieldClause::parse("age:>=5").unwrap()),
        QueryNode::Contact(ContactClause::new("john")),
        QueryNode::Date(DateClause::parse(&ctx, DateType::Day, "-1d").unwrap()),
        QueryNode::Item(ItemClause::parse(&ctx, "5").unwrap()),
        builtin(&ctx, "unread").unwrap(),
    ];
    for node in nodes {
        let op = node.compile(&ctx, false).unwrap();
        assert_eq!(op.label(), Some(node.dump_string().as_str()));
    }
}
