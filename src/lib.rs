//! Recurring-task engine.
//!
//! Expands recurring task templates into the occurrences ("virtual instances")
//! that fall inside a date window, without storing them, and layers sparse
//! per-occurrence edits on top.
//!
//! ```
//! use cadence::generator::generate;
//! use cadence::models::{Frequency, RecurrenceRule, TaskTemplate};
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//! let standup = TaskTemplate::new("T", "Standup")
//!     .with_rule(RecurrenceRule::new(Frequency::Weekly, 1, start).ending_after(3));
//!
//! let ids: Vec<String> = generate(&standup, start, end).unwrap().map(|i| i.id).collect();
//! assert_eq!(ids, ["T_2024-01-01", "T_2024-01-08", "T_2024-01-15"]);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod pattern;
pub mod reconcile;
pub mod storage;
