//! CSV import of scale exports into the weight log.
//!
//! Expected columns (header required): `date,weight_kg`, dates in
//! `YYYY-MM-DD`. Rows that fail to parse are skipped with a warning.

use crate::{JsonlLogStore, Result, WeightLogEntry};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    weight_kg: f64,
}

impl TryFrom<CsvRow> for WeightLogEntry {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .map_err(|e| crate::Error::LogStore(format!("invalid date '{}': {}", row.date, e)))?;
        Ok(WeightLogEntry::new(date, row.weight_kg))
    }
}

/// Read weight entries from a CSV file, skipping malformed rows
pub fn read_weight_csv(path: &Path) -> Result<Vec<WeightLogEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (row_num, result) in reader.deserialize::<CsvRow>().enumerate() {
        match result.map_err(crate::Error::from).and_then(WeightLogEntry::try_from) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping CSV row {}: {}", row_num + 2, e);
            }
        }
    }

    Ok(entries)
}

/// Append every valid CSV row to the user's weight log
pub fn import_weights(store: &JsonlLogStore, user_id: &str, csv_path: &Path) -> Result<usize> {
    // Rejects a bad user up front, so per-row errors below are about values
    store.user_dir(user_id)?;
    let entries = read_weight_csv(csv_path)?;

    let mut imported = 0;
    for entry in &entries {
        match store.append_weight(user_id, entry) {
            Ok(()) => imported += 1,
            Err(crate::Error::LogStore(msg)) => {
                tracing::warn!("Skipping weight for {}: {}", entry.date, msg);
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        "Imported {} of {} weight rows from {:?}",
        imported,
        entries.len(),
        csv_path
    );
    Ok(imported)
}
