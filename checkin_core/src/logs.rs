//! JSONL-backed daily log store.
//!
//! Each user owns a directory `<data_dir>/users/<user_id>/` holding one
//! append-only JSON Lines file per log kind. Appends take an exclusive
//! file lock and reads a shared one, so several CLI invocations can log
//! at the same time. Later records supersede earlier ones: per date for
//! weights and manual macros, per meal id for planned meals.

use crate::{
    Error, LogStore, Macros, ManualMacrosLogEntry, PlannedMealEntry, Result, WeightLogEntry,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const WEIGHT_FILE: &str = "weight.jsonl";
const MANUAL_MACROS_FILE: &str = "manual_macros.jsonl";
const MEALS_FILE: &str = "meals.jsonl";

/// Log store rooted at a data directory
#[derive(Clone, Debug)]
pub struct JsonlLogStore {
    users_dir: PathBuf,
}

impl JsonlLogStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            users_dir: data_dir.as_ref().join("users"),
        }
    }

    /// Directory holding one user's files
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.users_dir.join(user_id))
    }

    pub fn append_weight(&self, user_id: &str, entry: &WeightLogEntry) -> Result<()> {
        if !entry.raw_weight_kg.is_finite() || entry.raw_weight_kg <= 0.0 {
            return Err(Error::LogStore(format!(
                "weight must be a positive number, got {}",
                entry.raw_weight_kg
            )));
        }
        let record = WeightLogEntry::new(entry.date, entry.raw_weight_kg);
        append_record(&self.user_dir(user_id)?.join(WEIGHT_FILE), &record)
    }

    pub fn append_manual_macros(&self, user_id: &str, entry: &ManualMacrosLogEntry) -> Result<()> {
        if !entry.macros.is_valid() {
            return Err(Error::LogStore(format!(
                "macros must be finite and non-negative: {:?}",
                entry.macros
            )));
        }
        append_record(&self.user_dir(user_id)?.join(MANUAL_MACROS_FILE), entry)
    }

    pub fn append_meal(&self, user_id: &str, meal: &PlannedMealEntry) -> Result<()> {
        if !meal.servings.is_finite() || meal.servings <= 0.0 {
            return Err(Error::LogStore(format!(
                "servings must be positive, got {}",
                meal.servings
            )));
        }
        append_record(&self.user_dir(user_id)?.join(MEALS_FILE), meal)
    }

    /// Current state of one planned meal
    pub fn meal(&self, user_id: &str, meal_id: Uuid) -> Result<Option<PlannedMealEntry>> {
        Ok(self
            .current_meals(user_id)?
            .into_iter()
            .find(|m| m.id == meal_id))
    }

    /// Every meal id's latest record, in first-logged order
    fn current_meals(&self, user_id: &str) -> Result<Vec<PlannedMealEntry>> {
        let records: Vec<PlannedMealEntry> =
            read_records(&self.user_dir(user_id)?.join(MEALS_FILE))?;

        let mut order = Vec::new();
        let mut latest: HashMap<Uuid, PlannedMealEntry> = HashMap::new();
        for meal in records {
            if !latest.contains_key(&meal.id) {
                order.push(meal.id);
            }
            latest.insert(meal.id, meal);
        }

        Ok(order
            .into_iter()
            .filter_map(|id| latest.remove(&id))
            .collect())
    }
}

impl LogStore for JsonlLogStore {
    fn weight_logs(&self, user_id: &str) -> Result<Vec<WeightLogEntry>> {
        let records: Vec<WeightLogEntry> =
            read_records(&self.user_dir(user_id)?.join(WEIGHT_FILE))?;

        let by_date: BTreeMap<NaiveDate, f64> = records
            .into_iter()
            .map(|e| (e.date, e.raw_weight_kg))
            .collect();

        Ok(by_date
            .into_iter()
            .map(|(date, kg)| WeightLogEntry::new(date, kg))
            .collect())
    }

    fn manual_macros(&self, user_id: &str, date: NaiveDate) -> Result<Option<Macros>> {
        let records: Vec<ManualMacrosLogEntry> =
            read_records(&self.user_dir(user_id)?.join(MANUAL_MACROS_FILE))?;

        Ok(records
            .into_iter()
            .filter(|e| e.date == date)
            .last()
            .map(|e| e.macros))
    }

    fn planned_meals(&self, user_id: &str, date: NaiveDate) -> Result<Vec<PlannedMealEntry>> {
        Ok(self
            .current_meals(user_id)?
            .into_iter()
            .filter(|m| m.date == date)
            .collect())
    }
}

pub(crate) fn validate_user_id(user_id: &str) -> Result<()> {
    let ok = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !ok {
        return Err(Error::LogStore(format!("invalid user id '{}'", user_id)));
    }
    Ok(())
}

/// Append one JSON line under an exclusive lock
fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let mut writer = std::io::BufWriter::new(&file);
    let line = serde_json::to_string(record)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    file.unlock()?;
    tracing::debug!("Appended record to {:?}", path);
    Ok(())
}

/// Read every parseable line under a shared lock; corrupt lines, including
/// torn writes that are not valid UTF-8, are skipped
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.split(b'\n').enumerate() {
        let line = line_result?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping corrupt record at {:?} line {}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;
    Ok(records)
}
