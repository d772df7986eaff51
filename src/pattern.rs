use chrono::{Datelike, NaiveDate};

use crate::models::{Frequency, RecurrenceRule};

/// Returns true if `check_date` is an occurrence of `rule`.
///
/// Periods are counted from `rule.start_date`; dates before the anchor never match.
///
/// * daily: every `interval` days.
/// * weekly: the date falls on the anchor's weekday and its week bucket
///   (`days / 7`) is a multiple of `interval`.
/// * monthly: the month offset is a multiple of `interval` and the day of month
///   equals the anchor's. Months without that day are skipped, not clamped.
/// * yearly: the year offset is a multiple of `interval` and month and day equal
///   the anchor's, so a Feb 29 anchor only fires in leap years.
///
/// A rule with `interval < 1` matches nothing.
pub fn matches(check_date: NaiveDate, rule: &RecurrenceRule) -> bool {
    let start = rule.start_date;
    if check_date < start || rule.interval < 1 {
        return false;
    }
    let interval = rule.interval;

    match rule.frequency {
        Frequency::Daily => days_between(start, check_date) % interval == 0,
        Frequency::Weekly => {
            let days = days_between(start, check_date);
            days % 7 == 0 && (days / 7) % interval == 0
        }
        Frequency::Monthly => {
            let months = month_index(check_date) - month_index(start);
            months % interval == 0 && check_date.day() == start.day()
        }
        Frequency::Yearly => {
            let years = i64::from(check_date.year() - start.year());
            years % interval == 0
                && check_date.month() == start.month()
                && check_date.day() == start.day()
        }
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month())
}
