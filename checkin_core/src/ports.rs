//! Collaborator interfaces consumed by the check-in engine.
//!
//! The engine holds each collaborator as `Arc<dyn Trait>`; implementations
//! must be `Send + Sync` because reads and recommender attempts run on
//! worker threads.

use crate::{
    GoalProfileInput, Macros, PlannedMealEntry, ProfileUpdate, RecipeMacros, Recommendation,
    RecommendationRequest, Result, WeightLogEntry,
};
use chrono::NaiveDate;

/// Read-only access to a user's daily logs
pub trait LogStore: Send + Sync {
    /// All weight logs, oldest first, at most one per date
    fn weight_logs(&self, user_id: &str) -> Result<Vec<WeightLogEntry>>;

    fn manual_macros(&self, user_id: &str, date: NaiveDate) -> Result<Option<Macros>>;

    /// Planned meals of every status for one date
    fn planned_meals(&self, user_id: &str, date: NaiveDate) -> Result<Vec<PlannedMealEntry>>;
}

/// Turns chronological raw weights into trend weights.
///
/// Must return the same entries in the same order, each possibly carrying
/// a `trend_weight_kg`.
pub trait TrendSmoother: Send + Sync {
    fn smooth(&self, chronological: &[WeightLogEntry]) -> Result<Vec<WeightLogEntry>>;
}

pub trait RecipeCatalog: Send + Sync {
    fn macros_per_serving(&self, recipe_id: &str) -> Result<RecipeMacros>;
}

pub trait MacroRecommender: Send + Sync {
    fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation>;
}

/// Source of the user's stored goal fields
pub trait GoalProfileSource: Send + Sync {
    fn goal_profile(&self, user_id: &str) -> Result<GoalProfileInput>;
}

/// Write capability for the two fields a check-in persists
pub trait ProfileStore: Send + Sync {
    fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<()>;
}
