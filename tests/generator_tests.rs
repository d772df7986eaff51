use cadence::error::RecurrenceError;
use cadence::generator::{generate, generate_all, occurrences, DateRange};
use cadence::models::{
    EndCondition, EndValue, Frequency, Priority, RecurrenceRule, TaskStatus, TaskTemplate, VirtualInstance,
};
use chrono::{Duration, NaiveDate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn template(id: &str, rule: RecurrenceRule) -> TaskTemplate {
    let mut t = TaskTemplate::new(id, format!("Task {}", id)).with_rule(rule);
    t.priority = Priority::High;
    t.assignees = vec!["ana".into()];
    t
}

fn dates(instances: &[VirtualInstance]) -> Vec<NaiveDate> {
    instances.iter().map(|i| i.due_date).collect()
}

#[test]
fn test_daily_boundaries_are_exact() {
    let d = date(2024, 3, 10);
    let t = template("T", RecurrenceRule::new(Frequency::Daily, 2, d));

    let instances: Vec<_> = generate(&t, d, d + Duration::days(6)).unwrap().collect();
    assert_eq!(
        dates(&instances),
        vec![d, d + Duration::days(2), d + Duration::days(4), d + Duration::days(6)]
    );
}

#[test]
fn test_weekly_after_three() {
    let start = date(2024, 1, 1);
    let t = template("T", RecurrenceRule::new(Frequency::Weekly, 1, start).ending_after(3));

    let instances: Vec<_> = generate(&t, start, date(2024, 2, 1)).unwrap().collect();
    assert_eq!(dates(&instances), vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
    let ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["T_2024-01-01", "T_2024-01-08", "T_2024-01-15"]);
}

#[test]
fn test_count_cap_holds_across_windows() {
    let start = date(2024, 1, 1);
    let t = template("T", RecurrenceRule::new(Frequency::Weekly, 1, start).ending_after(3));

    let first: Vec<_> = generate(&t, start, date(2024, 1, 10)).unwrap().collect();
    let second: Vec<_> = generate(&t, date(2024, 1, 11), date(2024, 12, 31)).unwrap().collect();
    let later: Vec<_> = generate(&t, date(2024, 2, 1), date(2024, 12, 31)).unwrap().collect();

    assert_eq!(dates(&first), vec![date(2024, 1, 1), date(2024, 1, 8)]);
    assert_eq!(dates(&second), vec![date(2024, 1, 15)]);
    assert!(later.is_empty());
}

#[test]
fn test_count_cap_starts_at_anchor_not_window() {
    let start = date(2024, 1, 1);
    let rule = RecurrenceRule::new(Frequency::Daily, 1, start).ending_after(5);

    let got: Vec<_> = occurrences(&rule, date(2024, 1, 4), date(2024, 1, 31)).unwrap().collect();
    assert_eq!(got, vec![date(2024, 1, 4), date(2024, 1, 5)]);
}

#[test]
fn test_until_is_inclusive() {
    let start = date(2024, 1, 1);
    let t = template("T", RecurrenceRule::new(Frequency::Daily, 1, start).ending_until(date(2024, 1, 5)));

    let instances: Vec<_> = generate(&t, date(2023, 12, 1), date(2024, 1, 31)).unwrap().collect();
    assert_eq!(instances.len(), 5);
    assert_eq!(instances.first().unwrap().due_date, start);
    assert_eq!(instances.last().unwrap().due_date, date(2024, 1, 5));
}

#[test]
fn test_monthly_skips_months_without_the_day() {
    let t = template("T", RecurrenceRule::new(Frequency::Monthly, 1, date(2024, 1, 31)));

    let instances: Vec<_> = generate(&t, date(2024, 1, 1), date(2024, 12, 31)).unwrap().collect();
    let months: Vec<u32> = instances.iter().map(|i| chrono::Datelike::month(&i.due_date)).collect();
    assert_eq!(months, vec![1, 3, 5, 7, 8, 10, 12]);
}

#[test]
fn test_instances_stay_inside_range_and_rule_bounds() {
    let start = date(2024, 2, 10);
    let until = date(2024, 5, 1);
    let t = template("T", RecurrenceRule::new(Frequency::Daily, 3, start).ending_until(until));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 4, 1)).unwrap();

    let instances: Vec<_> = generate(&t, range.start, range.end).unwrap().collect();
    assert!(!instances.is_empty());
    for i in &instances {
        assert!(range.contains(i.due_date));
        assert!(i.due_date >= start && i.due_date <= until);
    }
}

#[test]
fn test_generation_is_deterministic() {
    let t = template("T", RecurrenceRule::new(Frequency::Weekly, 2, date(2024, 1, 3)).ending_after(10));

    let a: Vec<_> = generate(&t, date(2024, 1, 1), date(2024, 6, 30)).unwrap().collect();
    let b: Vec<_> = generate(&t, date(2024, 1, 1), date(2024, 6, 30)).unwrap().collect();
    assert_eq!(a, b);

    let iter = occurrences(t.rule().unwrap(), date(2024, 1, 1), date(2024, 6, 30)).unwrap();
    let restarted: Vec<_> = iter.clone().collect();
    assert_eq!(iter.collect::<Vec<_>>(), restarted);
}

#[test]
fn test_instances_snapshot_template_fields() {
    let mut t = template("T", RecurrenceRule::new(Frequency::Daily, 1, date(2024, 1, 1)));
    t.status = TaskStatus::InProgress;
    t.description = Some("details".into());
    t.created_by = Some("lee".into());

    let instance = generate(&t, date(2024, 1, 2), date(2024, 1, 2)).unwrap().next().unwrap();
    assert_eq!(instance.template_id, "T");
    assert_eq!(instance.title, "Task T");
    assert_eq!(instance.description.as_deref(), Some("details"));
    assert_eq!(instance.status, TaskStatus::InProgress);
    assert_eq!(instance.priority, Priority::High);
    assert_eq!(instance.assignees, vec!["ana".to_string()]);
    assert_eq!(instance.template.created_by.as_deref(), Some("lee"));
    assert_eq!(instance.template.frequency, Frequency::Daily);
    assert!(!instance.skipped);
    assert!(!instance.overridden);
}

#[test]
fn test_inverted_range_is_empty() {
    let t = template("T", RecurrenceRule::new(Frequency::Daily, 1, date(2024, 1, 1)));
    let instances: Vec<_> = generate(&t, date(2024, 2, 1), date(2024, 1, 1)).unwrap().collect();
    assert!(instances.is_empty());

    assert_eq!(
        DateRange::new(date(2024, 2, 1), date(2024, 1, 1)),
        Err(RecurrenceError::InvertedRange { start: date(2024, 2, 1), end: date(2024, 1, 1) })
    );
}

#[test]
fn test_range_before_anchor_is_empty() {
    let t = template("T", RecurrenceRule::new(Frequency::Daily, 1, date(2024, 1, 1)));
    assert_eq!(generate(&t, date(2023, 1, 1), date(2023, 12, 31)).unwrap().count(), 0);
}

#[test]
fn test_non_recurring_template_yields_nothing() {
    let t = TaskTemplate::new("plain", "One-off");
    assert_eq!(generate(&t, date(2024, 1, 1), date(2024, 12, 31)).unwrap().count(), 0);

    let mut paused = template("P", RecurrenceRule::new(Frequency::Daily, 1, date(2024, 1, 1)));
    paused.is_recurring = false;
    assert_eq!(generate(&paused, date(2024, 1, 1), date(2024, 12, 31)).unwrap().count(), 0);
}

#[test]
fn test_invalid_rules_are_rejected() {
    let start = date(2024, 1, 1);
    let end = date(2024, 1, 31);

    let zero_interval = template("A", RecurrenceRule::new(Frequency::Daily, 0, start));
    let zero_count = template("B", RecurrenceRule::new(Frequency::Daily, 1, start).ending_after(0));
    let mut bad_until = RecurrenceRule::new(Frequency::Daily, 1, start);
    bad_until.end_condition = EndCondition::Until;
    bad_until.end_value = Some(EndValue::Date("2024-13-45".into()));
    let bad_until = template("C", bad_until);
    let mut missing = RecurrenceRule::new(Frequency::Daily, 1, start);
    missing.end_condition = EndCondition::After;
    let missing = template("D", missing);

    for t in [&zero_interval, &zero_count, &bad_until, &missing] {
        assert!(
            matches!(generate(t, start, end), Err(RecurrenceError::InvalidRule(_))),
            "template {} should be rejected",
            t.id
        );
    }
}

#[test]
fn test_batch_isolates_failures_and_orders_by_date() {
    let start = date(2024, 1, 1);
    let daily = template("b", RecurrenceRule::new(Frequency::Daily, 1, start));
    let weekly = template("a", RecurrenceRule::new(Frequency::Weekly, 1, start));
    let broken = template("c", RecurrenceRule::new(Frequency::Daily, 0, start));

    let batch = generate_all(&[daily, broken, weekly], start, date(2024, 1, 8));

    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].0, "c");
    assert_eq!(batch.instances.len(), 8 + 2);
    let ids: Vec<&str> = batch.instances.iter().take(3).map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a_2024-01-01", "b_2024-01-01", "b_2024-01-02"]);
    assert!(batch.instances.windows(2).all(|w| w[0].due_date <= w[1].due_date));
}
