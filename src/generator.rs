use std::iter::FusedIterator;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::RecurrenceError;
use crate::models::{EndBound, InstanceKey, RecurrenceRule, TaskTemplate, TemplateRef, VirtualInstance};
use crate::pattern::matches;

/// A validated, inclusive date window supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RecurrenceError> {
        if end < start {
            return Err(RecurrenceError::InvertedRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Lazy sequence of the dates on which a rule fires inside a window.
///
/// Rules bounded by an occurrence count are scanned from their anchor so the
/// count is global rather than per window. Holds no state beyond the scan
/// itself; build a new one (or clone this one) to restart.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    cursor: Option<NaiveDate>,
    last: NaiveDate,
    window_start: NaiveDate,
    remaining: Option<u64>,
}

impl Occurrences {
    fn empty(rule: &RecurrenceRule) -> Self {
        Occurrences {
            rule: rule.clone(),
            cursor: None,
            last: rule.start_date,
            window_start: rule.start_date,
            remaining: None,
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while let Some(day) = self.cursor {
            if day > self.last || self.remaining == Some(0) {
                self.cursor = None;
                break;
            }
            self.cursor = day.succ_opt();
            if !matches(day, &self.rule) {
                continue;
            }
            if let Some(left) = self.remaining.as_mut() {
                *left -= 1;
            }
            if day >= self.window_start {
                return Some(day);
            }
        }
        None
    }
}

impl FusedIterator for Occurrences {}

/// Dates within `[range_start, range_end]` on which `rule` fires.
///
/// Fails only if the rule itself is malformed. An inverted range yields an
/// empty sequence.
pub fn occurrences(
    rule: &RecurrenceRule,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Occurrences, RecurrenceError> {
    let bound = rule.end_bound()?;

    if range_end < range_start {
        debug!(%range_start, %range_end, "inverted range, nothing to generate");
        return Ok(Occurrences::empty(rule));
    }

    let window_start = range_start.max(rule.start_date);
    let last = match bound {
        EndBound::Until(until) => range_end.min(until),
        EndBound::Never | EndBound::After(_) => range_end,
    };
    if window_start > last {
        return Ok(Occurrences::empty(rule));
    }

    let (scan_from, remaining) = match bound {
        EndBound::After(count) => (rule.start_date, Some(count)),
        EndBound::Never | EndBound::Until(_) => (window_start, None),
    };

    Ok(Occurrences {
        rule: rule.clone(),
        cursor: Some(scan_from),
        last,
        window_start,
        remaining,
    })
}

/// Lazy sequence of virtual instances for one template.
#[derive(Debug, Clone)]
pub struct Instances<'a> {
    template: &'a TaskTemplate,
    dates: Option<Occurrences>,
}

impl Iterator for Instances<'_> {
    type Item = VirtualInstance;

    fn next(&mut self) -> Option<VirtualInstance> {
        let date = self.dates.as_mut()?.next()?;
        let rule = self.template.rule()?;
        Some(instance_for(self.template, rule, date))
    }
}

impl FusedIterator for Instances<'_> {}

/// Expands a template into its occurrences within `[range_start, range_end]`.
///
/// Templates that are not recurring produce nothing. Every instance carries a
/// snapshot of the template's fields; the same arguments always produce the
/// same sequence.
pub fn generate(
    template: &TaskTemplate,
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Result<Instances<'_>, RecurrenceError> {
    let dates = match template.rule() {
        Some(rule) => Some(occurrences(rule, range_start, range_end)?),
        None => None,
    };
    Ok(Instances { template, dates })
}

fn instance_for(template: &TaskTemplate, rule: &RecurrenceRule, date: NaiveDate) -> VirtualInstance {
    let key = InstanceKey::new(template.id.clone(), date);
    VirtualInstance {
        id: key.to_string(),
        template_id: key.template_id,
        due_date: date,
        status: template.status,
        title: template.title.clone(),
        description: template.description.clone(),
        priority: template.priority,
        assignees: template.assignees.clone(),
        skipped: false,
        overridden: false,
        template: TemplateRef {
            id: template.id.clone(),
            created_by: template.created_by.clone(),
            frequency: rule.frequency,
            interval: rule.interval,
        },
    }
}

/// Result of expanding many templates at once.
#[derive(Debug, Default)]
pub struct Batch {
    /// Ordered by date, then template id.
    pub instances: Vec<VirtualInstance>,
    /// Templates whose rule could not be expanded.
    pub failures: Vec<(String, RecurrenceError)>,
}

/// Expands every template independently. A malformed rule only removes that
/// template's instances from the result.
pub fn generate_all(templates: &[TaskTemplate], range_start: NaiveDate, range_end: NaiveDate) -> Batch {
    let mut batch = Batch::default();
    for template in templates {
        match generate(template, range_start, range_end) {
            Ok(instances) => batch.instances.extend(instances),
            Err(e) => {
                warn!(template_id = %template.id, error = %e, "skipping template with invalid recurrence");
                batch.failures.push((template.id.clone(), e));
            }
        }
    }
    batch
        .instances
        .sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.template_id.cmp(&b.template_id)));
    debug!(
        templates = templates.len(),
        instances = batch.instances.len(),
        failures = batch.failures.len(),
        "generated instances"
    );
    batch
}
