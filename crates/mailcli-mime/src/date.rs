//! RFC 5322 date handling.

use chrono::{DateTime, FixedOffset, TimeZone};

/// Formats a timestamp for a `Date` header, e.g.
/// `Tue, 1 Jul 2003 10:52:37 +0200`.
#[must_use]
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.to_rfc2822()
}

/// Parses a `Date` header value.
///
/// Accepts the RFC 2822 form with or without a trailing zone comment such as
/// `(UTC)` or `(PST)`. Returns `None` when the value cannot be parsed.
#[must_use]
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value).ok().or_else(|| {
        let without_comment = value
            .rfind('(')
            .filter(|_| value.ends_with(')'))
            .map_or(value, |i| value[..i].trim_end());
        DateTime::parse_from_rfc2822(without_comment).ok()
    })
}
