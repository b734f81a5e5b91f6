//! Date ordering and calendar arithmetic for business dates.
//!
//! Undated records are a real category in the ledger (spilled-over opening
//! balances, templates). They sort before every dated record, so the ordering
//! helpers here take `Option<NaiveDate>` rather than forcing callers to pick
//! an arbitrary sentinel date.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::cmp::Ordering;

/// Total order over optional dates: `None` sorts first.
pub fn compare_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// Last day of the date's month.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let day = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).unwrap_or(date)
}

/// First day of the date's month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// December 31 of the date's year.
pub fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

/// January 1 of the date's year.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Monday of the date's ISO week.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Sunday of the date's ISO week.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).last_day()
}

/// Shifts a date by whole months, clamping the day to the target month's length.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Inclusive count of days from `start` to `end`; zero when reversed.
pub fn day_span(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        return 0;
    }
    (end - start).num_days() + 1
}

/// Every day from `start` to `end`, inclusive.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.checked_add_days(Days::new(1)) {
            current = next;
        } else {
            break;
        }
    }
    days
}
