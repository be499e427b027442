//! Mailbox/account context consulted while building and compiling clauses.
//!
//! [`SearchContext`] is the seam to the surrounding system: account identity,
//! timezone and locale, tag and folder lookup, and the text analyzer.
//! [`StaticContext`] is an in-memory implementation for tests and tooling.

use std::collections::HashMap;

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::operation::{Flag, FolderRef, TagRef};
use crate::tokenizer::{Analyzer, StandardAnalyzer};
use crate::Config;

/// Read-only view of the requesting account.
pub trait SearchContext: Send + Sync {
    fn account_id(&self) -> &str;

    fn primary_address(&self) -> &str;

    fn aliases(&self) -> &[String];

    fn timezone(&self) -> AccountZone;

    fn locale(&self) -> &str;

    /// Instant that relative dates are resolved against.
    fn now(&self) -> DateTime<Utc>;

    /// Resolve a tag or flag name. `None` means the name is not defined locally.
    fn lookup_tag(&self, name: &str) -> Option<TagRef>;

    /// Resolve a folder by name or path (`Inbox`, `/Inbox`), ignoring case.
    fn lookup_folder(&self, name: &str) -> Option<FolderRef>;

    fn folder_by_id(&self, id: i32) -> Option<FolderRef>;

    fn analyzer(&self) -> &dyn Analyzer;

    fn config(&self) -> &Config;

    /// Primary address followed by aliases.
    fn addresses(&self) -> Vec<&str> {
        std::iter::once(self.primary_address())
            .chain(self.aliases().iter().map(String::as_str))
            .collect()
    }
}

/// Id of the root of the user's folder tree.
pub const USER_ROOT_FOLDER_ID: i32 = 1;

/// Folders every mailbox starts with.
const SYSTEM_FOLDERS: [(i32, &str); 7] = [
    (2, "Inbox"),
    (3, "Trash"),
    (4, "Junk"),
    (5, "Sent"),
    (6, "Drafts"),
    (7, "Contacts"),
    (10, "Calendar"),
];

/// An account's timezone: a named zone with daylight-saving rules, or a
/// fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl AccountZone {
    /// Look up an IANA zone name such as `Europe/Berlin`.
    pub fn named(name: &str) -> Option<Self> {
        name.trim().parse::<Tz>().ok().map(AccountZone::Named)
    }
}

impl From<Tz> for AccountZone {
    fn from(tz: Tz) -> Self {
        AccountZone::Named(tz)
    }
}

impl From<FixedOffset> for AccountZone {
    fn from(offset: FixedOffset) -> Self {
        AccountZone::Fixed(offset)
    }
}

impl TimeZone for AccountZone {
    type Offset = FixedOffset;

    fn from_offset(offset: &FixedOffset) -> Self {
        AccountZone::Fixed(*offset)
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        match self {
            AccountZone::Named(tz) => tz.offset_from_local_date(local).map(|o| o.fix()),
            AccountZone::Fixed(offset) => LocalResult::Single(*offset),
        }
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        match self {
            AccountZone::Named(tz) => tz.offset_from_local_datetime(local).map(|o| o.fix()),
            AccountZone::Fixed(offset) => LocalResult::Single(*offset),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        match self {
            AccountZone::Named(tz) => tz.offset_from_utc_date(utc).fix(),
            AccountZone::Fixed(offset) => *offset,
        }
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        match self {
            AccountZone::Named(tz) => tz.offset_from_utc_datetime(utc).fix(),
            AccountZone::Fixed(offset) => *offset,
        }
    }
}

/// Fixed, in-memory account context.
#[derive(Debug, Clone)]
pub struct StaticContext {
    account_id: String,
    primary_address: String,
    aliases: Vec<String>,
    timezone: AccountZone,
    locale: String,
    now: Option<DateTime<Utc>>,
    tags: HashMap<String, TagRef>,
    folders: Vec<FolderRef>,
    analyzer: StandardAnalyzer,
    config: Config,
}

impl StaticContext {
    pub fn new(account_id: impl Into<String>, primary_address: impl Into<String>) -> Self {
        let config = Config::default();
        Self {
            account_id: account_id.into(),
            primary_address: primary_address.into(),
            aliases: Vec::new(),
            timezone: offset_from_minutes(config.default_tz_offset_minutes).into(),
            locale: config.fallback_locale.clone(),
            now: None,
            tags: HashMap::new(),
            folders: SYSTEM_FOLDERS
                .iter()
                .map(|&(id, name)| FolderRef {
                    id,
                    name: name.to_string(),
                })
                .collect(),
            analyzer: StandardAnalyzer,
            config,
        }
    }

    /// Replace the config. Also resets the timezone to the config default.
    pub fn with_config(mut self, config: Config) -> Self {
        self.timezone = offset_from_minutes(config.default_tz_offset_minutes).into();
        self.config = config;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<AccountZone>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Pin "now" instead of reading the system clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Define a user tag.
    pub fn with_tag(mut self, name: impl Into<String>, id: i32) -> Self {
        let name = name.into();
        self.tags
            .insert(name.to_lowercase(), TagRef::User { id, name });
        self
    }

    /// Define a folder, replacing any folder with the same id.
    pub fn with_folder(mut self, name: impl Into<String>, id: i32) -> Self {
        let folder = FolderRef {
            id,
            name: name.into(),
        };
        match self.folders.iter_mut().find(|f| f.id == id) {
            Some(existing) => *existing = folder,
            None => self.folders.push(folder),
        }
        self
    }
}

/// Build an offset from minutes east of UTC, clamping to UTC when out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or(Utc.fix())
}

impl SearchContext for StaticContext {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn primary_address(&self) -> &str {
        &self.primary_address
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn timezone(&self) -> AccountZone {
        self.timezone
    }

    fn locale(&self) -> &str {
        &self.locale
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn lookup_tag(&self, name: &str) -> Option<TagRef> {
        if let Some(flag) = Flag::from_name(name) {
            return Some(TagRef::Flag(flag));
        }
        self.tags.get(&name.to_lowercase()).cloned()
    }

    fn lookup_folder(&self, name: &str) -> Option<FolderRef> {
        let name = name.trim().trim_start_matches('/');
        self.folders
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn folder_by_id(&self, id: i32) -> Option<FolderRef> {
        self.folders.iter().find(|f| f.id == id).cloned()
    }

    fn analyzer(&self) -> &dyn Analyzer {
        &self.analyzer
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_static_context_defaults() {
        let ctx = StaticContext::new("acct", "me@example.com");
        assert_eq!(ctx.account_id(), "acct");
        assert_eq!(ctx.locale(), "en");
        assert_eq!(ctx.timezone(), AccountZone::Fixed(Utc.fix()));
        assert!(ctx.aliases().is_empty());
    }

    #[test]
    fn test_addresses_primary_first() {
        let ctx = StaticContext::new("acct", "me@example.com")
            .with_alias("alias1@example.com")
            .with_alias("alias2@example.com");
        assert_eq!(
            ctx.addresses(),
            vec!["me@example.com", "alias1@example.com", "alias2@example.com"]
        );
    }

    #[test]
    fn test_lookup_tag() {
        let ctx = StaticContext::new("acct", "me@example.com").with_tag("Work", 64);
        assert_eq!(
            ctx.lookup_tag("work"),
            Some(TagRef::User { id: 64, name: "Work".to_string() })
        );
        assert_eq!(ctx.lookup_tag("\\Flagged"), Some(TagRef::Flag(Flag::Flagged)));
        assert_eq!(ctx.lookup_tag("shared"), None);
    }

    #[test]
    fn test_config_sets_timezone() {
        let config = Config {
            default_tz_offset_minutes: -300,
            ..Default::default()
        };
        let ctx = StaticContext::new("acct", "me@example.com").with_config(config);
        assert_eq!(
            ctx.timezone(),
            AccountZone::Fixed(FixedOffset::west_opt(300 * 60).unwrap())
        );
    }

    #[test]
    fn test_named_zone_follows_daylight_saving() {
        let zone = AccountZone::named("Europe/Berlin").unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(winter.with_timezone(&zone).offset().local_minus_utc(), 3600);
        assert_eq!(summer.with_timezone(&zone).offset().local_minus_utc(), 7200);

        // 02:30 does not exist on the spring-forward day
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(zone.from_local_datetime(&gap), LocalResult::None);
        assert!(AccountZone::named("Mars/Olympus").is_none());
    }

    #[test]
    fn test_lookup_folder() {
        let ctx = StaticContext::new("acct", "me@example.com").with_folder("Projects", 257);
        assert_eq!(
            ctx.lookup_folder("/inbox"),
            Some(FolderRef { id: 2, name: "Inbox".to_string() })
        );
        assert_eq!(ctx.lookup_folder("projects").map(|f| f.id), Some(257));
        assert_eq!(ctx.folder_by_id(257).map(|f| f.name), Some("Projects".to_string()));
        assert_eq!(ctx.lookup_folder("Archive"), None);

        let renamed = ctx.with_folder("Posteingang", 2);
        assert_eq!(renamed.folder_by_id(2).map(|f| f.name), Some("Posteingang".to_string()));
        assert_eq!(renamed.lookup_folder("inbox"), None);
    }

    #[test]
    fn test_pinned_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
        let ctx = StaticContext::new("acct", "me@example.com").with_now(now);
        assert_eq!(ctx.now(), now);
    }
}
