//! User profile persistence with file locking.
//!
//! The profile lives at `<data_dir>/users/<user_id>/profile.json`. Goal
//! fields are set by the user; `tdee` and `last_check_in_date` are only
//! written by a successful check-in through [`ProfileStore`].

use crate::logs::validate_user_id;
use crate::{
    Error, GoalProfileInput, GoalProfileSource, PrimaryGoal, ProfileStore, ProfileUpdate, Result,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const PROFILE_FILE: &str = "profile.json";

/// On-disk profile; every field is optional
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(default)]
    pub primary_goal: Option<PrimaryGoal>,
    #[serde(default)]
    pub target_weight_change_rate_kg: Option<f64>,
    #[serde(default)]
    pub current_protein_target: Option<f64>,
    #[serde(default)]
    pub current_fat_target: Option<f64>,
    #[serde(default)]
    pub tdee: Option<f64>,
    #[serde(default)]
    pub last_check_in_date: Option<NaiveDate>,
}

impl StoredProfile {
    /// Load a profile, falling back to defaults if missing or unreadable
    pub fn load(path: &Path) -> Result<Self> {
        match Self::read(path) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                tracing::info!("No profile found at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => {
                tracing::warn!("Failed to read profile {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Read a profile under a shared lock; `None` if the file does not exist
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let profile = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded profile from {:?}", path);
        Ok(Some(profile))
    }

    /// Atomically write the profile: temp file, fsync, rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "profile path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load, modify and save under an exclusive lock on a sibling
    /// `.lock` file, so concurrent updates cannot lose each other's fields.
    /// Unlike `load`, a corrupt file is an error here so an update never
    /// clobbers fields it could not read.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut StoredProfile),
    {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path.with_extension("lock"))?;
        lock.lock_exclusive()?;

        let result = Self::read(path).and_then(|existing| {
            let mut profile = existing.unwrap_or_default();
            f(&mut profile);
            profile.save(path)?;
            Ok(profile)
        });

        lock.unlock()?;
        result
    }

    pub fn goal_input(&self) -> GoalProfileInput {
        GoalProfileInput {
            primary_goal: self.primary_goal,
            target_weight_change_rate_kg: self.target_weight_change_rate_kg,
            current_protein_target: self.current_protein_target,
            current_fat_target: self.current_fat_target,
            current_tdee: self.tdee,
        }
    }
}

/// Profile files for every user under a data directory
#[derive(Clone, Debug)]
pub struct ProfileFileStore {
    users_dir: PathBuf,
}

impl ProfileFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            users_dir: data_dir.as_ref().join("users"),
        }
    }

    pub fn profile_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.users_dir.join(user_id).join(PROFILE_FILE))
    }

    pub fn load(&self, user_id: &str) -> Result<StoredProfile> {
        StoredProfile::load(&self.profile_path(user_id)?)
    }

    /// Set the user-owned goal fields, leaving check-in fields untouched
    pub fn set_goals(
        &self,
        user_id: &str,
        goal: PrimaryGoal,
        weekly_rate_kg: f64,
        protein_target: f64,
        fat_target: f64,
    ) -> Result<StoredProfile> {
        StoredProfile::update(&self.profile_path(user_id)?, |profile| {
            profile.primary_goal = Some(goal);
            profile.target_weight_change_rate_kg = Some(weekly_rate_kg);
            profile.current_protein_target = Some(protein_target);
            profile.current_fat_target = Some(fat_target);
        })
    }
}

impl GoalProfileSource for ProfileFileStore {
    fn goal_profile(&self, user_id: &str) -> Result<GoalProfileInput> {
        Ok(self.load(user_id)?.goal_input())
    }
}

impl ProfileStore for ProfileFileStore {
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        let path = self.profile_path(user_id)?;
        StoredProfile::update(&path, |profile| {
            profile.tdee = Some(f64::from(update.tdee));
            profile.last_check_in_date = Some(update.last_check_in_date);
        })
        .map_err(|e| Error::ProfileStore(format!("failed to update {:?}: {}", path, e)))?;

        tracing::info!(
            "Profile updated for {}: tdee {} on {}",
            user_id,
            update.tdee,
            update.last_check_in_date
        );
        Ok(())
    }
}
