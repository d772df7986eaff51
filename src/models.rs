use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, RecurrenceError};

/// Workflow state of a task or of one occurrence of a recurring task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the transition table allows moving from `self` to `next`.
    ///
    /// `todo -> in_progress -> completed`, anything not already cancelled may be
    /// cancelled, and a cancelled task can be reopened as `todo`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Todo, TaskStatus::InProgress) => true,
            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::Cancelled, TaskStatus::Todo) => true,
            (TaskStatus::Cancelled, TaskStatus::Cancelled) => false,
            (_, TaskStatus::Cancelled) => true,
            _ => false,
        }
    }

    pub fn transition(self, next: TaskStatus) -> Result<TaskStatus, CadenceError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CadenceError::InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(format!(
                "Unknown status '{}'. Supported: todo, in_progress, completed, cancelled.",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!(
                "Unknown priority '{}'. Supported: low, medium, high, urgent.",
                other
            )),
        }
    }
}

/// How often a recurring task repeats.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!(
                "Unknown recurrence pattern '{}'. Supported: daily, weekly, monthly, yearly.",
                other
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    #[default]
    Never,
    After,
    Until,
}

/// Raw end value as stored: an occurrence count or an ISO date string.
///
/// Kept loose on purpose so that a malformed rule still deserializes and only
/// fails when it is expanded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum EndValue {
    Count(i64),
    Date(String),
}

/// End condition resolved against its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBound {
    Never,
    After(u64),
    Until(NaiveDate),
}

/// A repetition pattern anchored at `start_date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Every N periods. Must be at least 1.
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default)]
    pub end_condition: EndCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_value: Option<EndValue>,
    pub start_date: NaiveDate,
}

fn default_interval() -> i64 {
    1
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: i64, start_date: NaiveDate) -> Self {
        RecurrenceRule {
            frequency,
            interval,
            end_condition: EndCondition::Never,
            end_value: None,
            start_date,
        }
    }

    pub fn ending_after(mut self, count: i64) -> Self {
        self.end_condition = EndCondition::After;
        self.end_value = Some(EndValue::Count(count));
        self
    }

    pub fn ending_until(mut self, date: NaiveDate) -> Self {
        self.end_condition = EndCondition::Until;
        self.end_value = Some(EndValue::Date(date.format("%Y-%m-%d").to_string()));
        self
    }

    /// Checks the rule and resolves its end condition.
    pub fn end_bound(&self) -> Result<EndBound, RecurrenceError> {
        if self.interval < 1 {
            return Err(RecurrenceError::InvalidRule(format!(
                "interval must be at least 1, got {}",
                self.interval
            )));
        }
        match (self.end_condition, &self.end_value) {
            (EndCondition::Never, _) => Ok(EndBound::Never),
            (EndCondition::After, Some(EndValue::Count(n))) if *n > 0 => Ok(EndBound::After(*n as u64)),
            (EndCondition::After, Some(EndValue::Count(n))) => Err(RecurrenceError::InvalidRule(
                format!("occurrence count must be positive, got {}", n),
            )),
            (EndCondition::After, Some(EndValue::Date(s))) => Err(RecurrenceError::InvalidRule(
                format!("expected an occurrence count, got '{}'", s),
            )),
            (EndCondition::Until, Some(EndValue::Date(s))) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(EndBound::Until)
                .map_err(|e| RecurrenceError::InvalidRule(format!("invalid end date '{}': {}", s, e))),
            (EndCondition::Until, Some(EndValue::Count(n))) => Err(RecurrenceError::InvalidRule(
                format!("expected an end date, got {}", n),
            )),
            (condition, None) => Err(RecurrenceError::InvalidRule(format!(
                "end condition {:?} requires an end value",
                condition
            ))),
        }
    }
}

/// A persisted task definition. Recurring templates expand into virtual instances.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Owner of the template.
    #[serde(default)]
    pub created_by: Option<String>,
    /// Timestamp when the template was created (ISO 8601).
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
}

impl TaskTemplate {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        TaskTemplate {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            status: TaskStatus::default(),
            assignees: Vec::new(),
            created_by: None,
            created_at: String::new(),
            is_recurring: false,
            recurrence: None,
        }
    }

    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(rule);
        self
    }

    /// The rule to expand, if the template is recurring.
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        if self.is_recurring {
            self.recurrence.as_ref()
        } else {
            None
        }
    }
}

/// Composite identity of one occurrence: `(template id, date)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub template_id: String,
    pub date: NaiveDate,
}

impl InstanceKey {
    pub fn new(template_id: impl Into<String>, date: NaiveDate) -> Self {
        InstanceKey { template_id: template_id.into(), date }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.template_id, self.date.format("%Y-%m-%d"))
    }
}

impl FromStr for InstanceKey {
    type Err = String;

    /// Parses `{template_id}_{YYYY-MM-DD}`. Template ids may contain `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (template_id, date) = s
            .rsplit_once('_')
            .ok_or_else(|| format!("Invalid instance id '{}'", s))?;
        if template_id.is_empty() {
            return Err(format!("Invalid instance id '{}'", s));
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("Invalid instance id '{}': {}", s, e))?;
        Ok(InstanceKey::new(template_id, date))
    }
}

/// Maps a field that is present to `Some`, so an explicit `null` survives as
/// `Some(None)` while a missing field falls back to `None` via `default`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A persisted edit to a single occurrence. Unset fields keep the generated value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskOverride {
    pub template_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `Some(None)` clears the description; stored as `null`.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
}

impl TaskOverride {
    pub fn new(key: &InstanceKey) -> Self {
        TaskOverride {
            template_id: key.template_id.clone(),
            date: key.date,
            status: None,
            title: None,
            description: None,
            priority: None,
            assignees: None,
            skipped: None,
        }
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.template_id.clone(), self.date)
    }

    /// Folds a newer edit into this one; fields set in `newer` win.
    pub fn merge(&mut self, newer: TaskOverride) {
        if newer.status.is_some() { self.status = newer.status; }
        if newer.title.is_some() { self.title = newer.title; }
        if newer.description.is_some() { self.description = newer.description; }
        if newer.priority.is_some() { self.priority = newer.priority; }
        if newer.assignees.is_some() { self.assignees = newer.assignees; }
        if newer.skipped.is_some() { self.skipped = newer.skipped; }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignees.is_none()
            && self.skipped.is_none()
    }
}

pub type OverrideMap = HashMap<InstanceKey, TaskOverride>;

/// Builds the lookup table the reconciler works against.
pub fn override_map(overrides: impl IntoIterator<Item = TaskOverride>) -> OverrideMap {
    overrides.into_iter().map(|o| (o.key(), o)).collect()
}

/// Metadata about the template an instance was generated from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub id: String,
    pub created_by: Option<String>,
    pub frequency: Frequency,
    pub interval: i64,
}

/// One computed occurrence of a recurring template. Never stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VirtualInstance {
    /// `{template_id}_{YYYY-MM-DD}`
    pub id: String,
    pub template_id: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assignees: Vec<String>,
    pub skipped: bool,
    /// Set once an override has been applied.
    pub overridden: bool,
    pub template: TemplateRef,
}

impl VirtualInstance {
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.template_id.clone(), self.due_date)
    }
}
