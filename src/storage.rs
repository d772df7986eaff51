use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{CadenceError, Result};
use crate::models::{override_map, InstanceKey, OverrideMap, TaskOverride, TaskTemplate};

/// JSON-file persistence for templates and per-occurrence overrides.
///
/// Virtual instances are never written; only the sparse overrides on top of them.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn templates_path(&self) -> PathBuf {
        self.dir.join("templates.json")
    }

    fn overrides_path(&self) -> PathBuf {
        self.dir.join("overrides.json")
    }

    /// Loads all templates. A missing file reads as empty.
    pub fn load_templates(&self) -> Result<Vec<TaskTemplate>> {
        read_json(&self.templates_path())
    }

    /// Saves the given list of templates, overwriting the existing file.
    pub fn save_templates(&self, templates: &[TaskTemplate]) -> Result<()> {
        write_json(&self.templates_path(), templates)?;
        info!(count = templates.len(), "saved templates");
        Ok(())
    }

    /// Loads a single template by its id.
    pub fn load_template(&self, id: &str) -> Result<TaskTemplate> {
        self.load_templates()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CadenceError::TemplateNotFound(id.to_string()))
    }

    /// Next free numeric id, rendered as a string.
    pub fn next_template_id(&self) -> Result<String> {
        let max = self
            .load_templates()?
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string())
    }

    /// Deletes a template together with every override keyed by it.
    pub fn remove_template(&self, id: &str) -> Result<()> {
        let mut templates = self.load_templates()?;
        let len_before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == len_before {
            return Err(CadenceError::TemplateNotFound(id.to_string()));
        }
        self.save_templates(&templates)?;

        let mut overrides = self.load_overrides()?;
        overrides.retain(|key, _| key.template_id != id);
        self.save_overrides(&overrides)
    }

    pub fn load_overrides(&self) -> Result<OverrideMap> {
        let records: Vec<TaskOverride> = read_json(&self.overrides_path())?;
        Ok(override_map(records))
    }

    /// Saves overrides ordered by key so the file is stable across writes.
    pub fn save_overrides(&self, overrides: &OverrideMap) -> Result<()> {
        let mut records: Vec<&TaskOverride> = overrides.values().collect();
        records.sort_by_key(|o| o.key());
        write_json(&self.overrides_path(), &records)?;
        info!(count = records.len(), "saved overrides");
        Ok(())
    }

    /// Stores an edit for one occurrence, merging into any existing edit for it.
    ///
    /// Returns the stored record.
    pub fn upsert_override(&self, edit: TaskOverride) -> Result<TaskOverride> {
        let mut overrides = self.load_overrides()?;
        let key = edit.key();
        let stored = match overrides.remove(&key) {
            Some(mut existing) => {
                existing.merge(edit);
                existing
            }
            None => edit,
        };
        overrides.insert(key, stored.clone());
        self.save_overrides(&overrides)?;
        Ok(stored)
    }

    /// Returns whether an override existed.
    pub fn remove_override(&self, key: &InstanceKey) -> Result<bool> {
        let mut overrides = self.load_overrides()?;
        let removed = overrides.remove(key).is_some();
        if removed {
            self.save_overrides(&overrides)?;
        }
        Ok(removed)
    }

    /// Drops overrides for occurrences before `before`. Returns how many were removed.
    pub fn prune_overrides(&self, before: NaiveDate) -> Result<usize> {
        let mut overrides = self.load_overrides()?;
        let len_before = overrides.len();
        overrides.retain(|key, _| key.date >= before);
        let removed = len_before - overrides.len();
        if removed > 0 {
            self.save_overrides(&overrides)?;
        }
        Ok(removed)
    }

    /// Deletes the templates and overrides files.
    pub fn reset(&self) -> Result<()> {
        for path in [self.templates_path(), self.overrides_path()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let s = fs::read_to_string(path)?;
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&s)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let s = serde_json::to_string_pretty(value)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
