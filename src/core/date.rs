//! Date expressions for the modification-date filter.
//!
//! An expression is either `-N` / `0` ("N days before now") or `yyyy-mm-dd`.
//! Anything else, including an empty string, means "no bound".

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime};

/// Which end of the range an expression describes.
///
/// A calendar date covers a whole day, so it resolves to the first instant of
/// that day as a lower bound and to the last instant as an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    From,
    To,
}

/// Resolves a date expression against `now`.
pub fn parse_date_expr(expr: &str, bound: DateBound, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }

    if let Ok(days) = expr.parse::<i64>() {
        if days > 0 {
            return None;
        }
        let span = days.checked_neg().and_then(Duration::try_days)?;
        return now.checked_sub_signed(span);
    }

    let date = NaiveDate::parse_from_str(expr, "%Y-%m-%d").ok()?;
    let time = match bound {
        DateBound::From => NaiveTime::from_hms_opt(0, 0, 0)?,
        DateBound::To => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    let resolved = date.and_time(time).and_local_timezone(Local).earliest()?;

    // Today's upper bound stops at "now" so it never counts as future.
    if bound == DateBound::To && date == now.date_naive() && resolved > now {
        return Some(now);
    }
    Some(resolved)
}

/// `true` if `timestamp` lies in the inclusive range; a missing bound is open.
pub fn within_range(
    timestamp: DateTime<Local>,
    from: Option<DateTime<Local>>,
    to: Option<DateTime<Local>>,
) -> bool {
    from.is_none_or(|from| timestamp >= from) && to.is_none_or(|to| timestamp <= to)
}
