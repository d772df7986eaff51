use cadence::models::{Frequency, RecurrenceRule};
use cadence::pattern::matches;
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_daily_interval() {
    let rule = RecurrenceRule::new(Frequency::Daily, 2, date(2024, 1, 1));
    assert!(matches(date(2024, 1, 1), &rule));
    assert!(!matches(date(2024, 1, 2), &rule));
    assert!(matches(date(2024, 1, 3), &rule));
    assert!(matches(date(2024, 3, 1), &rule)); // 60 days later
}

#[test]
fn test_rejects_dates_before_anchor() {
    for frequency in [Frequency::Daily, Frequency::Weekly, Frequency::Monthly, Frequency::Yearly] {
        let rule = RecurrenceRule::new(frequency, 1, date(2024, 6, 15));
        assert!(!matches(date(2024, 6, 14), &rule));
        assert!(!matches(date(2023, 6, 15), &rule));
    }
}

#[test]
fn test_weekly_requires_anchor_weekday() {
    // 2024-01-01 is a Monday
    let rule = RecurrenceRule::new(Frequency::Weekly, 1, date(2024, 1, 1));
    assert!(matches(date(2024, 1, 8), &rule));
    assert!(!matches(date(2024, 1, 9), &rule));
    assert!(!matches(date(2024, 1, 3), &rule));
}

#[test]
fn test_weekly_buckets_by_interval() {
    let rule = RecurrenceRule::new(Frequency::Weekly, 2, date(2024, 1, 1));
    assert!(matches(date(2024, 1, 1), &rule));
    assert!(!matches(date(2024, 1, 8), &rule));
    assert!(matches(date(2024, 1, 15), &rule));
    assert!(!matches(date(2024, 1, 22), &rule));
    assert!(matches(date(2024, 1, 29), &rule));
}

#[test]
fn test_monthly_does_not_clamp_short_months() {
    let rule = RecurrenceRule::new(Frequency::Monthly, 1, date(2024, 1, 31));
    assert!(!matches(date(2024, 2, 29), &rule));
    assert!(matches(date(2024, 3, 31), &rule));
    assert!(!matches(date(2024, 4, 30), &rule));
    assert!(matches(date(2024, 5, 31), &rule));
}

#[test]
fn test_monthly_interval_crosses_year() {
    let rule = RecurrenceRule::new(Frequency::Monthly, 3, date(2024, 11, 5));
    assert!(!matches(date(2024, 12, 5), &rule));
    assert!(matches(date(2025, 2, 5), &rule));
    assert!(!matches(date(2025, 2, 6), &rule));
}

#[test]
fn test_yearly_leap_day_anchor() {
    let rule = RecurrenceRule::new(Frequency::Yearly, 1, date(2024, 2, 29));
    assert!(!matches(date(2025, 2, 28), &rule));
    assert!(!matches(date(2025, 3, 1), &rule));
    assert!(matches(date(2028, 2, 29), &rule));
}

#[test]
fn test_yearly_interval() {
    let rule = RecurrenceRule::new(Frequency::Yearly, 2, date(2020, 7, 4));
    assert!(!matches(date(2021, 7, 4), &rule));
    assert!(matches(date(2022, 7, 4), &rule));
}

#[test]
fn test_non_positive_interval_never_matches() {
    let rule = RecurrenceRule::new(Frequency::Daily, 0, date(2024, 1, 1));
    assert!(!matches(date(2024, 1, 1), &rule));
    let rule = RecurrenceRule::new(Frequency::Weekly, -1, date(2024, 1, 1));
    assert!(!matches(date(2024, 1, 8), &rule));
}
