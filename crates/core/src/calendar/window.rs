//! Query window resolution
//!
//! Turns a user's phrasing plus whatever bounds the classifier extracted
//! into a concrete `[start, end]` window. Relative phrases in the message win
//! over extracted bounds.

use aura_domain::QueryRequest;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static NEXT_WEEK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bnext\s+week\b").expect("NEXT_WEEK should compile - this is a bug")
});

static THIS_WEEK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bthis\s+week\b").expect("THIS_WEEK should compile - this is a bug")
});

static TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btomorrow\b").expect("TOMORROW should compile - this is a bug"));

static TODAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btoday\b").expect("TODAY should compile - this is a bug"));

/// A resolved query window. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub single_day: bool,
}

impl QueryWindow {
    fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end, single_day: start.date() == end.date() }
    }

    fn full_day(date: NaiveDate) -> Self {
        Self::days(date, 1)
    }

    fn days(first: NaiveDate, count: i64) -> Self {
        let start = first.and_time(NaiveTime::MIN);
        Self::new(start, start + Duration::days(count) - Duration::microseconds(1))
    }
}

/// Resolve the window for a query or availability check.
///
/// Precedence: relative phrases in `message`, then both explicit bounds,
/// then a bare date, then a start bound alone, then `[now, now + default_days]`.
pub fn resolve_query_window(
    message: &str,
    request: &QueryRequest,
    now: NaiveDateTime,
    default_days: i64,
) -> QueryWindow {
    let today = now.date();

    if NEXT_WEEK.is_match(message) {
        return QueryWindow::days(week_start(today) + Duration::days(7), 7);
    }
    if THIS_WEEK.is_match(message) {
        return QueryWindow::days(week_start(today), 7);
    }
    if TOMORROW.is_match(message) {
        return QueryWindow::full_day(today + Duration::days(1));
    }
    if TODAY.is_match(message) {
        return QueryWindow::full_day(today);
    }

    match (request.start_time, request.end_time, request.date) {
        (Some(a), Some(b), _) => {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            if is_midnight(start) && is_midnight(end) && end - start < Duration::days(1) {
                QueryWindow::full_day(start.date())
            } else {
                QueryWindow::new(start, end)
            }
        }
        (_, _, Some(date)) => QueryWindow::full_day(date),
        (Some(start), None, None) => QueryWindow::new(start, QueryWindow::full_day(start.date()).end),
        _ => default_window(now, default_days),
    }
}

fn default_window(now: NaiveDateTime, default_days: i64) -> QueryWindow {
    QueryWindow::new(now, now + Duration::days(default_days))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn is_midnight(at: NaiveDateTime) -> bool {
    at.time() == NaiveTime::MIN
}
