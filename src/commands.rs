use std::io::{self, Write};

use chrono::{Duration, Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::config::Config;
use crate::error::{CadenceError, RecurrenceError, Result};
use crate::generator::{generate, generate_all, DateRange};
use crate::models::{
    EndBound, Frequency, InstanceKey, Priority, RecurrenceRule, TaskOverride, TaskStatus, TaskTemplate,
    VirtualInstance,
};
use crate::reconcile::{reconcile, visible};
use crate::storage::Store;

/// Template fields supplied on the command line. Unset fields keep their
/// default (on add) or current value (on edit).
#[derive(Debug, Clone, Default)]
pub struct TemplateFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub assignees: Option<Vec<String>>,
    pub created_by: Option<String>,
    pub recur: Option<Frequency>,
    pub interval: Option<i64>,
    /// Anchor date in YYYY-MM-DD. Defaults to today for new rules.
    pub start: Option<String>,
    pub after: Option<i64>,
    pub until: Option<String>,
    /// Turns recurrence off.
    pub no_recur: bool,
}

impl TemplateFields {
    fn touches_rule(&self) -> bool {
        self.recur.is_some()
            || self.interval.is_some()
            || self.start.is_some()
            || self.after.is_some()
            || self.until.is_some()
    }
}

/// Edits to a single occurrence.
#[derive(Debug, Clone, Default)]
pub struct InstanceEdit {
    pub title: Option<String>,
    /// `Some(None)` clears the description for this occurrence.
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignees: Option<Vec<String>>,
    /// `Some(true)` skips the occurrence, `Some(false)` restores it.
    pub skipped: Option<bool>,
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| CadenceError::InvalidInput(format!("Invalid date '{}': {}. Use YYYY-MM-DD.", s, e)))
}

/// Applies the recurrence part of `fields` on top of `current`.
///
/// The result is validated so that a bad rule is rejected at the prompt rather
/// than silently producing no occurrences later.
fn build_rule(current: Option<RecurrenceRule>, fields: &TemplateFields) -> Result<Option<RecurrenceRule>> {
    if fields.no_recur {
        return Ok(None);
    }
    if !fields.touches_rule() {
        return Ok(current);
    }
    if fields.after.is_some() && fields.until.is_some() {
        return Err(CadenceError::InvalidInput("Use either --after or --until, not both.".into()));
    }

    let start = match &fields.start {
        Some(s) => Some(parse_date(s)?),
        None => None,
    };
    let mut rule = match (current, fields.recur) {
        (Some(mut rule), freq) => {
            if let Some(f) = freq {
                rule.frequency = f;
            }
            rule
        }
        (None, Some(freq)) => RecurrenceRule::new(freq, 1, start.unwrap_or_else(|| Local::now().date_naive())),
        (None, None) => {
            return Err(CadenceError::InvalidInput(
                "Set a recurrence pattern with --recur (daily, weekly, monthly, yearly).".into(),
            ))
        }
    };
    if let Some(start) = start {
        rule.start_date = start;
    }
    if let Some(interval) = fields.interval {
        rule.interval = interval;
    }
    if let Some(count) = fields.after {
        rule = rule.ending_after(count);
    }
    if let Some(until) = &fields.until {
        rule = rule.ending_until(parse_date(until)?);
    }

    rule.end_bound()?;
    Ok(Some(rule))
}

/// Adds a new task template. Returns its id.
pub fn cmd_template_add(store: &Store, fields: TemplateFields, silent: bool) -> Result<String> {
    let title = fields
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CadenceError::InvalidInput("A template needs a title.".into()))?;
    let rule = build_rule(None, &fields)?;

    let mut templates = store.load_templates()?;
    let id = store.next_template_id()?;
    let mut template = TaskTemplate::new(id.clone(), title);
    template.description = fields.description;
    template.priority = fields.priority.unwrap_or_default();
    template.status = fields.status.unwrap_or_default();
    template.assignees = fields.assignees.unwrap_or_default();
    template.created_by = fields.created_by;
    template.created_at = Local::now().to_rfc3339();
    if let Some(rule) = rule {
        template = template.with_rule(rule);
    }

    templates.push(template);
    store.save_templates(&templates)?;
    if !silent { println!("Template added (id = {})", id); }
    Ok(id)
}

/// Edits an existing template. Changes apply to every occurrence that has no
/// override for the edited field.
pub fn cmd_template_edit(store: &Store, id: &str, fields: TemplateFields, silent: bool) -> Result<()> {
    let mut templates = store.load_templates()?;
    let t = templates
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| CadenceError::TemplateNotFound(id.to_string()))?;

    let rule = build_rule(t.recurrence.clone(), &fields)?;
    let rule_changed = fields.no_recur || fields.touches_rule();
    if let Some(title) = fields.title { t.title = title; }
    if let Some(d) = fields.description { t.description = Some(d); }
    if let Some(p) = fields.priority { t.priority = p; }
    if let Some(s) = fields.status { t.status = s; }
    if let Some(a) = fields.assignees { t.assignees = a; }
    if rule_changed {
        t.is_recurring = rule.is_some();
        t.recurrence = rule;
    }

    store.save_templates(&templates)?;
    if !silent { println!("Template {} updated.", id); }
    Ok(())
}

/// Removes a template and all of its occurrence overrides.
pub fn cmd_template_remove(store: &Store, id: &str, silent: bool) -> Result<()> {
    store.remove_template(id)?;
    if !silent { println!("Template {} removed.", id); }
    Ok(())
}

fn describe_rule(rule: &RecurrenceRule) -> String {
    let every = if rule.interval == 1 {
        rule.frequency.to_string()
    } else {
        format!("{} x{}", rule.frequency, rule.interval)
    };
    match rule.end_bound() {
        Ok(EndBound::Never) => format!("{} from {}", every, rule.start_date),
        Ok(EndBound::After(n)) => format!("{} from {}, {} times", every, rule.start_date, n),
        Ok(EndBound::Until(d)) => format!("{} from {} until {}", every, rule.start_date, d),
        Err(e) => format!("invalid: {}", e),
    }
}

/// Lists all templates.
pub fn cmd_template_list(store: &Store) -> Result<()> {
    let templates = store.load_templates()?;
    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Title", "Priority", "Status", "Assignees", "Recurrence"]);
    for t in templates {
        let recurrence = t.rule().map(describe_rule).unwrap_or_else(|| "-".into());
        table.add_row(vec![
            t.id,
            t.title,
            t.priority.to_string(),
            t.status.to_string(),
            t.assignees.join(", "),
            recurrence,
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Instances for a window, with stored overrides applied.
///
/// Templates whose rule cannot be expanded are returned separately; the rest
/// are unaffected.
pub fn agenda(
    store: &Store,
    range: DateRange,
    include_skipped: bool,
) -> Result<(Vec<VirtualInstance>, Vec<(String, RecurrenceError)>)> {
    let templates = store.load_templates()?;
    let overrides = store.load_overrides()?;
    let batch = generate_all(&templates, range.start, range.end);
    let merged = reconcile(batch.instances, &overrides);
    let instances = if include_skipped { merged } else { visible(merged) };
    Ok((instances, batch.failures))
}

/// Last day of a window of `days` days starting at `start`.
pub fn window_end(start: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days - 1)
        .filter(|_| days >= 1)
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| {
            CadenceError::InvalidInput(format!("An agenda window of {} days from {} is out of range.", days, start))
        })
}

/// Prints occurrences between `from` and `to`, inclusive.
///
/// `from` defaults to today and `to` to the end of the configured agenda window.
pub fn cmd_agenda(store: &Store, config: &Config, from: Option<String>, to: Option<String>, all: bool) -> Result<()> {
    let start = match from {
        Some(s) => parse_date(&s)?,
        None => Local::now().date_naive(),
    };
    let end = match to {
        Some(s) => parse_date(&s)?,
        None => window_end(start, config.agenda_days)?,
    };
    let range = DateRange::new(start, end)?;

    let (instances, failures) = agenda(store, range, all)?;
    for (template_id, e) in &failures {
        eprintln!("Template {} has no occurrences: {}", template_id, e);
    }
    if instances.is_empty() {
        println!("No occurrences between {} and {}.", start, end);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Assignees").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Note").add_attribute(Attribute::Bold),
        ]);

    for i in instances {
        let status_color = match i.status {
            TaskStatus::Todo => Color::Yellow,
            TaskStatus::InProgress => Color::Cyan,
            TaskStatus::Completed => Color::Green,
            TaskStatus::Cancelled => Color::Grey,
        };
        let priority_color = match i.priority {
            Priority::Urgent => Color::Red,
            Priority::High => Color::Yellow,
            _ => Color::Reset,
        };
        let note = if i.skipped {
            "skipped"
        } else if i.overridden {
            "edited"
        } else {
            ""
        };

        table.add_row(vec![
            Cell::new(&i.id),
            Cell::new(&i.title),
            Cell::new(i.due_date),
            Cell::new(i.priority).fg(priority_color),
            Cell::new(i.assignees.join(", ")),
            Cell::new(i.status).fg(status_color),
            Cell::new(note),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Resolves the occurrence a command refers to.
///
/// With a date, `target` is the template id. Without one, `target` is the
/// instance id shown by `agenda`, e.g. `3_2024-01-08`.
pub fn instance_key(target: &str, date: Option<&str>) -> Result<InstanceKey> {
    match date {
        Some(d) => Ok(InstanceKey::new(target, parse_date(d)?)),
        None => target.parse::<InstanceKey>().map_err(CadenceError::InvalidInput),
    }
}

/// The occurrence of `template_id` on `date`, with any stored override applied.
///
/// Fails if the template's rule does not fire on that date.
fn load_instance(store: &Store, key: &InstanceKey) -> Result<VirtualInstance> {
    let template = store.load_template(&key.template_id)?;
    let generated: Vec<VirtualInstance> = generate(&template, key.date, key.date)?.collect();
    if generated.is_empty() {
        return Err(CadenceError::InvalidInput(format!(
            "Template {} has no occurrence on {}.",
            key.template_id, key.date
        )));
    }
    let overrides = store.load_overrides()?;
    Ok(reconcile(generated, &overrides).remove(0))
}

/// Stores an edit for one occurrence without touching the rest of the series.
pub fn cmd_instance_edit(
    store: &Store,
    target: &str,
    date: Option<&str>,
    edit: InstanceEdit,
    silent: bool,
) -> Result<TaskOverride> {
    let key = instance_key(target, date)?;
    load_instance(store, &key)?;

    let mut record = TaskOverride::new(&key);
    record.title = edit.title;
    record.description = edit.description;
    record.status = edit.status;
    record.priority = edit.priority;
    record.assignees = edit.assignees;
    record.skipped = edit.skipped;
    if record.is_empty() {
        return Err(CadenceError::InvalidInput("Nothing to change.".into()));
    }

    let stored = store.upsert_override(record)?;
    if !silent { println!("Occurrence {} updated.", key); }
    Ok(stored)
}

/// Moves one occurrence to `status`, following the status transition table.
pub fn cmd_instance_move(
    store: &Store,
    target: &str,
    date: Option<&str>,
    status: TaskStatus,
    silent: bool,
) -> Result<TaskStatus> {
    let key = instance_key(target, date)?;
    let current = load_instance(store, &key)?;
    let next = current.status.transition(status)?;

    let mut record = TaskOverride::new(&key);
    record.status = Some(next);
    store.upsert_override(record)?;
    if !silent { println!("Occurrence {} moved from {} to {}.", key, current.status, next); }
    Ok(next)
}

/// Drops the override for one occurrence so it follows its template again.
pub fn cmd_instance_reset(store: &Store, target: &str, date: Option<&str>, silent: bool) -> Result<bool> {
    let key = instance_key(target, date)?;
    let removed = store.remove_override(&key)?;
    if !silent {
        if removed {
            println!("Occurrence {} reset.", key);
        } else {
            println!("Occurrence {} had no edits.", key);
        }
    }
    Ok(removed)
}

/// Deletes overrides for occurrences before `before`.
pub fn cmd_prune(store: &Store, before: &str, silent: bool) -> Result<usize> {
    let cutoff = parse_date(before)?;
    let removed = store.prune_overrides(cutoff)?;
    if !silent { println!("Removed {} edit(s) dated before {}.", removed, cutoff); }
    Ok(removed)
}

/// Resets the database by deleting all templates and overrides.
pub fn cmd_reset(store: &Store, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all templates and edits? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.reset()?;
    println!("Database reset successfully.");
    Ok(())
}
