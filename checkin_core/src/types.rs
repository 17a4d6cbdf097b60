//! Core domain types for the weekly check-in.
//!
//! This module defines the fundamental types used throughout the system:
//! - Macro snapshots and per-serving recipe macros
//! - Weight, manual-macro and planned-meal log entries
//! - The user's goal profile (raw and validated)
//! - Recommendation request/response and the check-in result

use crate::{Error, ErrorKind, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use uuid::Uuid;

// ============================================================================
// Macros
// ============================================================================

/// Daily (or per-serving) calories and macronutrients
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macros {
    pub const ZERO: Macros = Macros {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    /// Multiply every field by a serving count
    pub fn scaled(&self, servings: f64) -> Self {
        Self {
            calories: self.calories * servings,
            protein: self.protein * servings,
            carbs: self.carbs * servings,
            fat: self.fat * servings,
        }
    }

    /// True when every field is finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

/// Per-serving macros of a recipe, guaranteed finite and non-negative
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RecipeMacros(Macros);

impl RecipeMacros {
    pub fn new(per_serving: Macros) -> Result<Self> {
        if !per_serving.is_valid() {
            return Err(Error::RecipeCatalog(format!(
                "recipe macros must be finite and non-negative: {:?}",
                per_serving
            )));
        }
        Ok(Self(per_serving))
    }

    pub fn per_serving(&self) -> Macros {
        self.0
    }
}

// ============================================================================
// Log Entries
// ============================================================================

/// One day's scale weight, optionally augmented with a trend weight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightLogEntry {
    pub date: NaiveDate,
    pub raw_weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_weight_kg: Option<f64>,
}

impl WeightLogEntry {
    pub fn new(date: NaiveDate, raw_weight_kg: f64) -> Self {
        Self {
            date,
            raw_weight_kg,
            trend_weight_kg: None,
        }
    }
}

/// A weight log entry whose trend weight is known to be present
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub trend_weight_kg: f64,
}

impl TrendPoint {
    pub fn from_entry(entry: &WeightLogEntry) -> Option<Self> {
        entry.trend_weight_kg.map(|trend_weight_kg| Self {
            date: entry.date,
            trend_weight_kg,
        })
    }
}

/// Authoritative macro override for a single date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualMacrosLogEntry {
    pub date: NaiveDate,
    pub macros: Macros,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealStatus {
    Planned,
    Eaten,
}

/// A planned meal; only `Eaten` entries count as consumption
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedMealEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub recipe_id: String,
    pub servings: f64,
    pub status: MealStatus,
}

impl PlannedMealEntry {
    pub fn new(date: NaiveDate, recipe_id: impl Into<String>, servings: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            recipe_id: recipe_id.into(),
            servings,
            status: MealStatus::Planned,
        }
    }

    pub fn eaten(mut self) -> Self {
        self.status = MealStatus::Eaten;
        self
    }
}

// ============================================================================
// Goal Profile
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    FatLoss,
    MuscleGain,
    Maintenance,
    #[default]
    NotSpecified,
}

/// Goal fields as stored; every field may be missing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalProfileInput {
    #[serde(default)]
    pub primary_goal: Option<PrimaryGoal>,
    #[serde(default)]
    pub target_weight_change_rate_kg: Option<f64>,
    #[serde(default)]
    pub current_protein_target: Option<f64>,
    #[serde(default)]
    pub current_fat_target: Option<f64>,
    #[serde(default)]
    pub current_tdee: Option<f64>,
}

/// Validated goal profile used to build a recommendation request
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalProfile {
    pub primary_goal: PrimaryGoal,
    /// Signed, kg per week
    pub target_weight_change_rate_kg: f64,
    pub current_protein_target: f64,
    pub current_fat_target: f64,
    pub current_tdee: Option<f64>,
}

impl TryFrom<GoalProfileInput> for GoalProfile {
    type Error = Error;

    fn try_from(input: GoalProfileInput) -> Result<Self> {
        let target_weight_change_rate_kg = input
            .target_weight_change_rate_kg
            .filter(|r| r.is_finite())
            .ok_or_else(|| {
                Error::InvalidProfile("target weekly weight change rate is missing".into())
            })?;

        let current_protein_target = non_negative(input.current_protein_target, "protein target")?;
        let current_fat_target = non_negative(input.current_fat_target, "fat target")?;

        if let Some(tdee) = input.current_tdee {
            if !tdee.is_finite() || tdee <= 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "current TDEE must be positive, got {}",
                    tdee
                )));
            }
        }

        Ok(GoalProfile {
            primary_goal: input.primary_goal.unwrap_or_default(),
            target_weight_change_rate_kg,
            current_protein_target,
            current_fat_target,
            current_tdee: input.current_tdee,
        })
    }
}

fn non_negative(value: Option<f64>, what: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(Error::InvalidProfile(format!(
            "{} must be a non-negative number, got {}",
            what, v
        ))),
        None => Err(Error::InvalidProfile(format!("{} is missing", what))),
    }
}

/// The only profile fields the check-in writes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub tdee: u32,
    pub last_check_in_date: NaiveDate,
}

// ============================================================================
// Recommendation
// ============================================================================

/// Everything the macro recommender is told about the user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub dynamic_tdee: u32,
    pub primary_goal: PrimaryGoal,
    pub target_weekly_rate_kg: f64,
    pub average_daily_calories: f64,
    pub actual_weekly_weight_change_kg: f64,
    pub current_protein_target: f64,
    pub current_fat_target: f64,
    pub current_tdee: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub new_macro_targets: Macros,
    pub coaching_summary: String,
}

// ============================================================================
// Check-in Result
// ============================================================================

/// Numbers behind a successful check-in, for display
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckInReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub window_days: usize,
    pub days_with_calorie_data: usize,
    pub average_daily_calories: f64,
    pub weight_change_kg: f64,
    pub actual_weekly_weight_change_kg: f64,
    pub new_tdee: u32,
}

/// Typed outcome of a successful check-in
#[derive(Clone, Debug, PartialEq)]
pub struct CheckInOutcome {
    pub report: CheckInReport,
    pub recommendation: Recommendation,
}

/// Flattened result handed to UI callers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckInResult {
    pub success: bool,
    pub message: String,
    pub recommendation: Option<Recommendation>,
    pub error_kind: Option<ErrorKind>,
    pub report: Option<CheckInReport>,
}

impl From<Result<CheckInOutcome>> for CheckInResult {
    fn from(result: Result<CheckInOutcome>) -> Self {
        match result {
            Ok(outcome) => CheckInResult {
                success: true,
                message: format!(
                    "Check-in complete: new TDEE is {} kcal",
                    outcome.report.new_tdee
                ),
                recommendation: Some(outcome.recommendation),
                error_kind: None,
                report: Some(outcome.report),
            },
            Err(e) => CheckInResult {
                success: false,
                message: e.to_string(),
                recommendation: None,
                error_kind: Some(e.kind()),
                report: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> GoalProfileInput {
        GoalProfileInput {
            primary_goal: Some(PrimaryGoal::FatLoss),
            target_weight_change_rate_kg: Some(-0.5),
            current_protein_target: Some(160.0),
            current_fat_target: Some(70.0),
            current_tdee: None,
        }
    }

    #[test]
    fn test_macros_scale_and_sum() {
        let mut total = Macros::ZERO;
        total += Macros::new(400.0, 30.0, 40.0, 10.0).scaled(1.5);
        total += Macros::new(200.0, 10.0, 20.0, 5.0).scaled(0.5);

        assert_eq!(total, Macros::new(700.0, 50.0, 70.0, 17.5));
    }

    #[test]
    fn test_recipe_macros_reject_negative_and_nan() {
        assert!(RecipeMacros::new(Macros::new(-1.0, 0.0, 0.0, 0.0)).is_err());
        assert!(RecipeMacros::new(Macros::new(f64::NAN, 0.0, 0.0, 0.0)).is_err());
        assert!(RecipeMacros::new(Macros::new(350.0, 20.0, 30.0, 12.0)).is_ok());
    }

    #[test]
    fn test_goal_profile_validation() {
        let profile = GoalProfile::try_from(complete_input()).unwrap();
        assert_eq!(profile.primary_goal, PrimaryGoal::FatLoss);
        assert_eq!(profile.target_weight_change_rate_kg, -0.5);

        let mut missing_goal = complete_input();
        missing_goal.primary_goal = None;
        let profile = GoalProfile::try_from(missing_goal).unwrap();
        assert_eq!(profile.primary_goal, PrimaryGoal::NotSpecified);
    }

    #[test]
    fn test_goal_profile_rejects_bad_fields() {
        let mut no_rate = complete_input();
        no_rate.target_weight_change_rate_kg = None;
        assert!(matches!(
            GoalProfile::try_from(no_rate),
            Err(Error::InvalidProfile(_))
        ));

        let mut negative_fat = complete_input();
        negative_fat.current_fat_target = Some(-5.0);
        assert!(GoalProfile::try_from(negative_fat).is_err());

        let mut zero_tdee = complete_input();
        zero_tdee.current_tdee = Some(0.0);
        assert!(GoalProfile::try_from(zero_tdee).is_err());
    }

    #[test]
    fn test_failed_result_carries_kind_and_message() {
        let result: CheckInResult = Err(Error::InsufficientCalorieData {
            available: 5,
            required: 7,
        })
        .into();

        assert!(!result.success);
        assert!(result.message.contains('5'));
        assert_eq!(result.error_kind, Some(ErrorKind::DataInsufficiency));
        assert!(result.recommendation.is_none());
    }
}
