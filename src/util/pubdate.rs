use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};

use crate::feed::extract::FeedTimestamp;

/// Resolve an item's raw date string to epoch seconds. RSS `pubDate` is
/// tried as RFC 2822 and then as an HTTP-date (some feeds emit asctime or
/// RFC 850 forms); Atom `updated` as RFC 3339. Anything unparseable, and
/// items without a date, get the current time so they sort with the fetch.
pub fn resolve_timestamp(timestamp: Option<&FeedTimestamp>) -> i64 {
    match timestamp {
        Some(FeedTimestamp::PubDate(raw)) => parse_pubdate(raw),
        Some(FeedTimestamp::Updated(raw)) => parse_updated(raw),
        None => None,
    }
    .unwrap_or_else(|| Utc::now().timestamp())
}

fn parse_pubdate(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.timestamp());
    }
    httpdate::parse_http_date(raw)
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs() as i64)
}

fn parse_updated(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.timestamp())
}
