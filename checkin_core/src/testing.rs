//! In-memory collaborators shared by the unit tests.

use crate::{
    Error, GoalProfileInput, GoalProfileSource, LogStore, MacroRecommender, Macros,
    PlannedMealEntry, PrimaryGoal, ProfileStore, ProfileUpdate, RecipeCatalog, RecipeMacros,
    Recommendation, RecommendationRequest, Result, TrendSmoother, WeightLogEntry,
};
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// `count` consecutive daily weights ending on `last`, oldest first,
/// moving linearly from `first_kg` to `last_kg`
pub fn daily_weights(last: NaiveDate, count: usize, first_kg: f64, last_kg: f64) -> Vec<WeightLogEntry> {
    let steps = (count.max(2) - 1) as f64;
    (0..count)
        .map(|i| {
            let day = last - Duration::days((count - 1 - i) as i64);
            let kg = if i + 1 == count {
                last_kg
            } else {
                first_kg + (last_kg - first_kg) * i as f64 / steps
            };
            WeightLogEntry::new(day, kg)
        })
        .collect()
}

#[derive(Default)]
pub struct InMemoryLogStore {
    weights: Vec<WeightLogEntry>,
    manual: HashMap<NaiveDate, Macros>,
    meals: Vec<PlannedMealEntry>,
    pub fail_weights: bool,
}

impl InMemoryLogStore {
    pub fn with_weights(mut self, weights: Vec<WeightLogEntry>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_manual(mut self, date: NaiveDate, macros: Macros) -> Self {
        self.manual.insert(date, macros);
        self
    }

    pub fn with_meal(mut self, meal: PlannedMealEntry) -> Self {
        self.meals.push(meal);
        self
    }
}

impl LogStore for InMemoryLogStore {
    fn weight_logs(&self, _user_id: &str) -> Result<Vec<WeightLogEntry>> {
        if self.fail_weights {
            return Err(Error::LogStore("weight log unavailable".into()));
        }
        Ok(self.weights.clone())
    }

    fn manual_macros(&self, _user_id: &str, date: NaiveDate) -> Result<Option<Macros>> {
        Ok(self.manual.get(&date).copied())
    }

    fn planned_meals(&self, _user_id: &str, date: NaiveDate) -> Result<Vec<PlannedMealEntry>> {
        Ok(self.meals.iter().filter(|m| m.date == date).cloned().collect())
    }
}

#[derive(Default)]
pub struct StaticCatalog {
    recipes: HashMap<String, Macros>,
}

impl StaticCatalog {
    pub fn with(mut self, id: &str, per_serving: Macros) -> Self {
        self.recipes.insert(id.to_string(), per_serving);
        self
    }
}

impl RecipeCatalog for StaticCatalog {
    fn macros_per_serving(&self, recipe_id: &str) -> Result<RecipeMacros> {
        let macros = self
            .recipes
            .get(recipe_id)
            .ok_or_else(|| Error::RecipeCatalog(format!("unknown recipe '{}'", recipe_id)))?;
        RecipeMacros::new(*macros)
    }
}

/// Trend weight equals raw weight, after `warmup` leading entries
pub struct RawTrend {
    pub warmup: usize,
}

impl TrendSmoother for RawTrend {
    fn smooth(&self, chronological: &[WeightLogEntry]) -> Result<Vec<WeightLogEntry>> {
        Ok(chronological
            .iter()
            .enumerate()
            .map(|(i, e)| WeightLogEntry {
                trend_weight_kg: (i >= self.warmup).then_some(e.raw_weight_kg),
                ..e.clone()
            })
            .collect())
    }
}

/// Replays a scripted sequence of responses and counts calls
pub struct ScriptedRecommender {
    responses: Mutex<VecDeque<Result<Recommendation>>>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<RecommendationRequest>>,
    pub delay: Option<std::time::Duration>,
}

impl ScriptedRecommender {
    pub fn new(responses: Vec<Result<Recommendation>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            delay: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MacroRecommender for ScriptedRecommender {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Recommender("no scripted response left".into())))
    }
}

pub fn recommendation(calories: f64) -> Recommendation {
    Recommendation {
        new_macro_targets: Macros::new(calories, 160.0, 200.0, 70.0),
        coaching_summary: "Steady progress, keep protein high.".into(),
    }
}

#[derive(Default)]
pub struct RecordingProfileStore {
    pub updates: Mutex<Vec<(String, ProfileUpdate)>>,
    pub fail: bool,
}

impl RecordingProfileStore {
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

impl ProfileStore for RecordingProfileStore {
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        if self.fail {
            return Err(Error::ProfileStore("write rejected".into()));
        }
        self.updates
            .lock()
            .unwrap()
            .push((user_id.to_string(), update.clone()));
        Ok(())
    }
}

pub struct FixedGoals(pub GoalProfileInput);

impl FixedGoals {
    pub fn fat_loss() -> Self {
        FixedGoals(GoalProfileInput {
            primary_goal: Some(PrimaryGoal::FatLoss),
            target_weight_change_rate_kg: Some(-0.5),
            current_protein_target: Some(160.0),
            current_fat_target: Some(70.0),
            current_tdee: Some(2400.0),
        })
    }
}

impl GoalProfileSource for FixedGoals {
    fn goal_profile(&self, _user_id: &str) -> Result<GoalProfileInput> {
        Ok(self.0.clone())
    }
}
