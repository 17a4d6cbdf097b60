//! Weekly check-in orchestration.
//!
//! Stages run strictly in order and any failure stops the run:
//!
//! ```text
//! HISTORY_CHECK -> TREND_CHECK -> WINDOW_CHECK -> CALORIE_CHECK
//!   -> ESTIMATE -> RECOMMEND -> PERSIST
//! ```
//!
//! Only PERSIST writes anything, and it runs only after a validated
//! recommendation is in hand. Each invocation is independent; callers
//! should serialize check-ins for the same user.

use crate::recommend::{recommend_with_retry, RetryPolicy};
use crate::trend::EmaTrendSmoother;
use crate::window::{
    calorie_coverage, check_history, select_recent_window, valid_trend_points, window_intake,
};
use crate::{
    estimate_tdee, CheckInOutcome, CheckInReport, CheckInResult, CommandRecommender, Config,
    ConsumptionAggregator, Error, GoalProfile, GoalProfileSource, JsonlLogStore, LogStore,
    LazyRecipeBook, MacroRecommender, Macros, ProfileFileStore, ProfileStore, ProfileUpdate,
    RecipeCatalog, RecommendationRequest, Result, TrendSmoother,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

/// Recipe catalog file inside the data directory
pub const RECIPES_FILE: &str = "recipes.toml";

/// Everything the engine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub logs: Arc<dyn LogStore>,
    pub smoother: Arc<dyn TrendSmoother>,
    pub recipes: Arc<dyn RecipeCatalog>,
    pub recommender: Arc<dyn MacroRecommender>,
    pub goals: Arc<dyn GoalProfileSource>,
    pub profiles: Arc<dyn ProfileStore>,
}

pub struct CheckInEngine {
    collaborators: Collaborators,
    retry: RetryPolicy,
}

impl CheckInEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            retry: RetryPolicy::default(),
        }
    }

    /// Wire the file-backed stores and external recommender from config.
    ///
    /// The recipe catalog and recommender command are resolved on first
    /// use, so a check-in refused by a data gate never depends on them.
    pub fn from_config(config: &Config) -> Result<Self> {
        let data_dir = &config.data.data_dir;
        let profiles = Arc::new(ProfileFileStore::new(data_dir));

        let collaborators = Collaborators {
            logs: Arc::new(JsonlLogStore::new(data_dir)),
            smoother: Arc::new(EmaTrendSmoother::from_config(&config.trend)?),
            recipes: Arc::new(LazyRecipeBook::new(data_dir.join(RECIPES_FILE))),
            recommender: CommandRecommender::resolve(&config.recommender),
            goals: profiles.clone(),
            profiles,
        };

        Ok(Self::new(collaborators)
            .with_retry_policy(RetryPolicy::from_config(&config.recommender)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn aggregator(&self) -> ConsumptionAggregator<'_> {
        ConsumptionAggregator::new(
            self.collaborators.logs.as_ref(),
            self.collaborators.recipes.as_ref(),
        )
    }

    /// Macros consumed on a date (manual override or eaten meals)
    pub fn consumed_macros(&self, user_id: &str, date: NaiveDate) -> Result<Macros> {
        self.aggregator().consumed_macros(user_id, date)
    }

    /// Macros of all planned meals on a date, for reporting
    pub fn planned_macros(&self, user_id: &str, date: NaiveDate) -> Result<Macros> {
        self.aggregator().planned_macros(user_id, date)
    }

    /// Run the check-in dated today (local time)
    pub fn run_weekly_check_in(&self, user_id: &str) -> CheckInResult {
        self.run_weekly_check_in_on(user_id, Local::now().date_naive())
    }

    /// Run the check-in, recording `today` as the check-in date
    pub fn run_weekly_check_in_on(&self, user_id: &str, today: NaiveDate) -> CheckInResult {
        let result = self.check_in(user_id, today);
        if let Err(ref e) = result {
            tracing::info!("Check-in for {} failed ({:?}): {}", user_id, e.kind(), e);
        }
        result.into()
    }

    /// Typed check-in: the outcome, or the first stage's error
    pub fn check_in(&self, user_id: &str, today: NaiveDate) -> Result<CheckInOutcome> {
        let c = &self.collaborators;
        tracing::info!("Starting weekly check-in for {}", user_id);

        // HISTORY_CHECK
        let mut history = c.logs.weight_logs(user_id)?;
        history.sort_by_key(|e| e.date);
        check_history(&history)?;

        // TREND_CHECK
        let smoothed = c.smoother.smooth(&history)?;
        if smoothed.len() != history.len() {
            return Err(Error::TrendSmoother(format!(
                "returned {} entries for {} weight logs",
                smoothed.len(),
                history.len()
            )));
        }
        let valid = valid_trend_points(&smoothed)?;

        // WINDOW_CHECK
        let window = select_recent_window(&valid)?;

        // CALORIE_CHECK
        let daily = window_intake(&self.aggregator(), user_id, &window)?;
        let coverage = calorie_coverage(&daily)?;

        // ESTIMATE
        let balance = estimate_tdee(&window, &coverage)?;

        // RECOMMEND
        let goals = GoalProfile::try_from(c.goals.goal_profile(user_id)?)?;
        let request = RecommendationRequest {
            user_id: user_id.to_string(),
            dynamic_tdee: balance.new_tdee,
            primary_goal: goals.primary_goal,
            target_weekly_rate_kg: goals.target_weight_change_rate_kg,
            average_daily_calories: balance.average_daily_calories,
            actual_weekly_weight_change_kg: balance.actual_weekly_weight_change_kg,
            current_protein_target: goals.current_protein_target,
            current_fat_target: goals.current_fat_target,
            current_tdee: goals.current_tdee,
        };
        let recommendation = recommend_with_retry(&c.recommender, &request, &self.retry)?;

        // PERSIST
        c.profiles.update_profile(
            user_id,
            &ProfileUpdate {
                tdee: balance.new_tdee,
                last_check_in_date: today,
            },
        )?;

        tracing::info!(
            "Check-in for {} complete: TDEE {} kcal",
            user_id,
            balance.new_tdee
        );

        Ok(CheckInOutcome {
            report: CheckInReport {
                window_start: window.start_date,
                window_end: window.end_date,
                window_days: window.points.len(),
                days_with_calorie_data: coverage.days_with_calorie_data,
                average_daily_calories: balance.average_daily_calories,
                weight_change_kg: balance.weight_change_kg,
                actual_weekly_weight_change_kg: balance.actual_weekly_weight_change_kg,
                new_tdee: balance.new_tdee,
            },
            recommendation,
        })
    }
}
