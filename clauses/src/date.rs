//! Date clause parsing.
//!
//! Clause text resolves to a `[begin, end)` interval in epoch milliseconds,
//! then goes through [`resolve_span`] with the clause's comparison operator.
//! Accepted forms, tried in order:
//!
//! - all digits: an epoch-millisecond instant
//! - `today` / `yesterday`
//! - relative: `[+-]N[unit]`, e.g. `-1d`, `+2weeks`
//! - absolute: a locale short date such as `1/23/2010` or `23.1.2010`

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};
use tracing::debug;

use crate::context::{AccountZone, SearchContext};
use crate::operation::DateColumn;
use crate::range::{resolve_span, Bound, CompareOp, Range};
use crate::{Error, Result};

/// Date clause flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateType {
    AppointmentStart,
    AppointmentEnd,
    ConversationStart,
    ConversationEnd,
    Before,
    After,
    Date,
    ModifiedDate,
    Day,
    Week,
    Month,
    Year,
}

impl DateType {
    pub const ALL: [DateType; 12] = [
        DateType::AppointmentStart,
        DateType::AppointmentEnd,
        DateType::ConversationStart,
        DateType::ConversationEnd,
        DateType::Before,
        DateType::After,
        DateType::Date,
        DateType::ModifiedDate,
        DateType::Day,
        DateType::Week,
        DateType::Month,
        DateType::Year,
    ];

    /// Name used in dumps.
    pub fn name(&self) -> &'static str {
        match self {
            DateType::AppointmentStart => "APPT_START",
            DateType::AppointmentEnd => "APPT_END",
            DateType::ConversationStart => "CONV_START",
            DateType::ConversationEnd => "CONV_END",
            DateType::Before => "BEFORE",
            DateType::After => "AFTER",
            DateType::Date => "DATE",
            DateType::ModifiedDate => "MDATE",
            DateType::Day => "DAY",
            DateType::Week => "WEEK",
            DateType::Month => "MONTH",
            DateType::Year => "YEAR",
        }
    }

    /// Search keyword, e.g. `appt-start`.
    pub fn keyword(&self) -> &'static str {
        match self {
            DateType::AppointmentStart => "appt-start",
            DateType::AppointmentEnd => "appt-end",
            DateType::ConversationStart => "conv-start",
            DateType::ConversationEnd => "conv-end",
            DateType::Before => "before",
            DateType::After => "after",
            DateType::Date => "date",
            DateType::ModifiedDate => "mdate",
            DateType::Day => "day",
            DateType::Week => "week",
            DateType::Month => "month",
            DateType::Year => "year",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<DateType> {
        DateType::ALL
            .into_iter()
            .find(|t| t.keyword().eq_ignore_ascii_case(keyword))
    }

    /// Unit used when the text does not name one.
    pub fn granularity(&self) -> DateUnit {
        match self {
            DateType::Week => DateUnit::Week,
            DateType::Month => DateUnit::Month,
            DateType::Year => DateUnit::Year,
            _ => DateUnit::Day,
        }
    }

    pub fn column(&self) -> DateColumn {
        match self {
            DateType::AppointmentStart => DateColumn::CalStart,
            DateType::AppointmentEnd => DateColumn::CalEnd,
            DateType::ModifiedDate => DateColumn::ModifiedDate,
            _ => DateColumn::Date,
        }
    }

    /// Operator implied by the type itself. Such types reject an explicit one.
    pub fn forced_op(&self) -> Option<CompareOp> {
        match self {
            DateType::Before => Some(CompareOp::Lt),
            DateType::After => Some(CompareOp::Gt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    /// Parse a relative-date unit suffix.
    pub fn parse(unit: &str) -> Option<DateUnit> {
        let unit = match unit.to_ascii_lowercase().as_str() {
            "mi" | "minute" | "minutes" => DateUnit::Minute,
            "h" | "hour" | "hours" => DateUnit::Hour,
            "d" | "day" | "days" => DateUnit::Day,
            "w" | "week" | "weeks" => DateUnit::Week,
            "m" | "month" | "months" => DateUnit::Month,
            "y" | "year" | "years" => DateUnit::Year,
            _ => return None,
        };
        Some(unit)
    }

    /// Move `at` by `n` units in local calendar terms.
    fn shift(&self, at: NaiveDateTime, n: i64) -> Option<NaiveDateTime> {
        match self {
            DateUnit::Minute => at.checked_add_signed(Duration::try_minutes(n)?),
            DateUnit::Hour => at.checked_add_signed(Duration::try_hours(n)?),
            DateUnit::Day => at.checked_add_signed(Duration::try_days(n)?),
            DateUnit::Week => at.checked_add_signed(Duration::try_weeks(n)?),
            DateUnit::Month => add_months(at, n),
            DateUnit::Year => add_months(at, n.checked_mul(12)?),
        }
    }

    /// Clear every field finer than this unit.
    fn truncate(&self, at: NaiveDateTime, week_start: Weekday) -> Option<NaiveDateTime> {
        let date = at.date();
        let truncated = match self {
            DateUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_time(NaiveTime::MIN),
            DateUnit::Month => {
                NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_time(NaiveTime::MIN)
            }
            DateUnit::Week => {
                let back = (date.weekday().num_days_from_monday() + 7
                    - week_start.num_days_from_monday())
                    % 7;
                date.checked_sub_signed(Duration::try_days(i64::from(back))?)?
                    .and_time(NaiveTime::MIN)
            }
            DateUnit::Day => date.and_time(NaiveTime::MIN),
            DateUnit::Hour => date.and_hms_opt(at.hour(), 0, 0)?,
            DateUnit::Minute => date.and_hms_opt(at.hour(), at.minute(), 0)?,
        };
        Some(truncated)
    }
}

fn add_months(at: NaiveDateTime, n: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(n.unsigned_abs()).ok()?);
    if n >= 0 {
        at.checked_add_months(months)
    } else {
        at.checked_sub_months(months)
    }
}

/// Field order of a locale's short date format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrder {
    Mdy,
    Dmy,
    Ymd,
    Ydm,
}

/// Short-date field order for a locale tag like `en`, `en_GB` or `fr-CA`.
pub fn field_order(locale: &str) -> Option<FieldOrder> {
    let mut parts = locale.split(|c: char| c == '_' || c == '-');
    let language = parts.next()?.to_ascii_lowercase();
    let region = parts.next().map(str::to_ascii_uppercase);

    let by_region = match (language.as_str(), region.as_deref()) {
        ("en", Some("GB" | "AU" | "NZ" | "IE" | "IN" | "CA")) => Some(FieldOrder::Dmy),
        ("en", Some("ZA")) => Some(FieldOrder::Ymd),
        ("fr", Some("CA")) => Some(FieldOrder::Ymd),
        ("es", Some("US")) => Some(FieldOrder::Mdy),
        ("zh", Some("TW" | "CN")) => Some(FieldOrder::Ymd),
        ("zh", Some("HK")) => Some(FieldOrder::Dmy),
        _ => None,
    };
    if by_region.is_some() {
        return by_region;
    }

    match language.as_str() {
        "en" => Some(FieldOrder::Mdy),
        "fr" | "de" | "it" | "es" | "nl" | "pt" | "ru" | "pl" | "da" | "nb" | "no" | "nn" | "fi"
        | "tr" | "el" | "cs" | "sk" | "ro" | "uk" | "vi" | "id" | "ms" | "ar" | "he" | "iw"
        | "ca" | "hr" | "sl" | "sr" | "bg" | "et" | "is" | "ga" | "mt" | "sq" | "th" | "hi" => {
            Some(FieldOrder::Dmy)
        }
        "ja" | "ko" | "zh" | "sv" | "hu" | "lt" => Some(FieldOrder::Ymd),
        "lv" => Some(FieldOrder::Ydm),
        _ => None,
    }
}

fn language(locale: &str) -> &str {
    locale.split(|c: char| c == '_' || c == '-').next().unwrap_or(locale)
}

/// Strict short-date parse: three numeric fields, valid month and day.
pub fn parse_short_date(text: &str, order: FieldOrder, current_year: i32) -> Option<NaiveDate> {
    let text = text.trim();
    // Korean short dates end with a dot
    let text = text.strip_suffix('.').unwrap_or(text);

    let fields: Vec<&str> = text
        .split(|c: char| matches!(c, '/' | '.' | '-'))
        .map(str::trim)
        .collect();
    let &[a, b, c] = fields.as_slice() else {
        return None;
    };
    let valid = |f: &str| !f.is_empty() && f.len() <= 4 && f.bytes().all(|b| b.is_ascii_digit());
    if !(valid(a) && valid(b) && valid(c)) {
        return None;
    }

    let (year, month, day) = match order {
        FieldOrder::Mdy => (c, a, b),
        FieldOrder::Dmy => (c, b, a),
        FieldOrder::Ymd => (a, b, c),
        FieldOrder::Ydm => (a, c, b),
    };
    if month.len() > 2 || day.len() > 2 {
        return None;
    }

    let year = expand_year(year, current_year)?;
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// Two-digit years fall within 80 years before and 20 after the current year.
fn expand_year(year: &str, current_year: i32) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    if year.len() != 2 {
        return Some(value);
    }
    let window_start = current_year - 80;
    let mut full = window_start - window_start.rem_euclid(100) + value;
    if full < window_start {
        full += 100;
    }
    Some(full)
}

/// Resolves date clause text against an account's clock, timezone and locale.
///
/// Day, week, month and year boundaries are local midnights in `Z`, each
/// converted on its own, so a day spanning a daylight-saving change is 23 or
/// 25 hours long.
#[derive(Debug, Clone)]
pub struct DateParser<'a, Z: TimeZone = AccountZone> {
    now: DateTime<Utc>,
    tz: Z,
    locale: &'a str,
    fallback_locale: &'a str,
    week_start: Weekday,
}

impl<'a> DateParser<'a> {
    /// Parser in the account's own timezone.
    pub fn new(ctx: &'a dyn SearchContext) -> Self {
        Self::in_zone(ctx, ctx.timezone())
    }
}

impl<'a, Z: TimeZone> DateParser<'a, Z> {
    /// Parser using the account's clock and locale but an explicit timezone.
    pub fn in_zone(ctx: &'a dyn SearchContext, tz: Z) -> Self {
        Self {
            now: ctx.now(),
            tz,
            locale: ctx.locale(),
            fallback_locale: &ctx.config().fallback_locale,
            week_start: ctx.config().week_start,
        }
    }

    /// Resolve `text` for a clause of type `kind` into an epoch-millisecond range.
    pub fn parse(&self, kind: DateType, text: &str) -> Result<Range<i64>> {
        let err = || Error::parse("date", text);

        let mut src = text.trim();
        // list form: date:(a, b)
        if let Some(stripped) = src.strip_suffix(',') {
            src = stripped.trim_end();
        }
        if src.is_empty() {
            return Err(err());
        }

        let (explicit, rest) = CompareOp::split_prefix(src);
        if explicit.is_some() && (kind.forced_op().is_some() || rest.is_empty()) {
            return Err(err());
        }
        let op = explicit.or(kind.forced_op()).unwrap_or(CompareOp::Eq);

        let (begin, end) = self.interval(kind, rest).ok_or_else(err)?;
        debug!(clause = kind.name(), op = %op, "resolved date range");
        Ok(resolve_span(op, begin, Some(end)))
    }

    fn interval(&self, kind: DateType, src: &str) -> Option<(i64, i64)> {
        if src.bytes().all(|b| b.is_ascii_digit()) {
            let instant: i64 = src.parse().ok()?;
            return Some((instant, instant.checked_add(1)?));
        }

        let relative = if src.eq_ignore_ascii_case("today") {
            "-0d"
        } else if src.eq_ignore_ascii_case("yesterday") {
            "-1d"
        } else {
            src
        };
        if let Some((offset, unit)) = parse_relative(relative) {
            return self.relative(offset, unit.unwrap_or(kind.granularity()));
        }

        self.absolute(src, kind.granularity())
    }

    fn relative(&self, offset: i64, unit: DateUnit) -> Option<(i64, i64)> {
        let local = self.now.with_timezone(&self.tz).naive_local();
        let begin = unit.shift(unit.truncate(local, self.week_start)?, offset)?;
        let end = unit.shift(begin, 1)?;
        Some((self.millis(begin)?, self.millis(end)?))
    }

    fn absolute(&self, src: &str, granularity: DateUnit) -> Option<(i64, i64)> {
        let current_year = self.now.with_timezone(&self.tz).year();
        let date = match field_order(self.locale)
            .and_then(|order| parse_short_date(src, order, current_year))
        {
            Some(date) => date,
            None => {
                if language(self.locale).eq_ignore_ascii_case(language(self.fallback_locale)) {
                    return None;
                }
                debug!(
                    locale = self.locale,
                    fallback = self.fallback_locale,
                    "retrying date under fallback locale"
                );
                let order = field_order(self.fallback_locale)?;
                parse_short_date(src, order, current_year)?
            }
        };

        let begin = date.and_time(NaiveTime::MIN);
        let end = granularity.shift(begin, 1)?;
        Some((self.millis(begin)?, self.millis(end)?))
    }

    /// Epoch millis of a local wall-clock time. An ambiguous time takes its
    /// earlier instant; a time skipped by a transition moves forward an hour.
    fn millis(&self, local: NaiveDateTime) -> Option<i64> {
        let at = match self.tz.from_local_datetime(&local).earliest() {
            Some(at) => at,
            None => {
                let later = local.checked_add_signed(Duration::try_hours(1)?)?;
                self.tz.from_local_datetime(&later).earliest()?
            }
        };
        Some(at.timestamp_millis())
    }
}

/// Split `[+-]N[unit]` into a signed count and optional unit.
fn parse_relative(src: &str) -> Option<(i64, Option<DateUnit>)> {
    let (negative, rest) = match src.as_bytes().first() {
        Some(b'+') => (false, &src[1..]),
        Some(b'-') => (true, &src[1..]),
        _ => (false, src),
    };
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return None;
    }
    let count: i64 = rest[..digits].parse::<i32>().ok()?.into();
    let unit = match &rest[digits..] {
        "" => None,
        suffix => Some(DateUnit::parse(suffix)?),
    };
    Some((if negative { -count } else { count }, unit))
}

/// Render an epoch-millisecond bound as UTC `YYYY-MM-DDTHH:MM`, `*` when unbounded.
pub fn format_bound(bound: &Bound<i64>) -> String {
    match bound.value() {
        None => "*".to_string(),
        Some(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
            .map(|at| at.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_else(|| ms.to_string()),
    }
}
