use std::path::PathBuf;

use crate::error::{CadenceError, Result};

pub const DATA_DIR_ENV: &str = "CADENCE_DATA_DIR";
pub const AGENDA_DAYS_ENV: &str = "CADENCE_AGENDA_DAYS";
pub const LOG_ENV: &str = "CADENCE_LOG";

const DEFAULT_AGENDA_DAYS: i64 = 14;
pub const MAX_AGENDA_DAYS: i64 = 3660;

/// Runtime settings, passed explicitly to storage and commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `templates.json` and `overrides.json`.
    pub data_dir: PathBuf,
    /// Length of the default agenda window, in days.
    pub agenda_days: i64,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            agenda_days: DEFAULT_AGENDA_DAYS,
        }
    }

    /// Loads settings from the environment.
    ///
    /// The data directory is resolved in the following order:
    /// 1. `CADENCE_DATA_DIR` environment variable.
    /// 2. `~/.local/share/cadence` (on Linux).
    /// 3. `./` (fallback).
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|_| {
            dirs::data_local_dir()
                .map(|p| p.join("cadence"))
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let agenda_days = match std::env::var(AGENDA_DAYS_ENV) {
            Ok(raw) => parse_agenda_days(&raw)?,
            Err(_) => DEFAULT_AGENDA_DAYS,
        };

        tracing::debug!(data_dir = %data_dir.display(), agenda_days, "configuration loaded");
        Ok(Config { data_dir, agenda_days })
    }
}

fn parse_agenda_days(raw: &str) -> Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(days) if (1..=MAX_AGENDA_DAYS).contains(&days) => Ok(days),
        _ => Err(CadenceError::InvalidInput(format!(
            "{} must be between 1 and {} days, got '{}'",
            AGENDA_DAYS_ENV, MAX_AGENDA_DAYS, raw
        ))),
    }
}
