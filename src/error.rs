use chrono::NaiveDate;
use thiserror::Error;

use crate::models::TaskStatus;

/// Failures raised while expanding a recurrence rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("range end {end} is before range start {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Top-level error type for storage and command operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot move a task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

pub type Result<T> = std::result::Result<T, CadenceError>;
