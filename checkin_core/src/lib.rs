#![forbid(unsafe_code)]

//! Core domain model and business logic for the weekly nutrition check-in.
//!
//! This crate provides:
//! - Domain types (weight logs, macros, planned meals, goal profiles)
//! - Daily consumption aggregation
//! - Analysis window selection and data-sufficiency gates
//! - Energy-balance TDEE estimation
//! - Recommender invocation with timeout and retry
//! - Persistence (JSONL logs, profile files, recipe catalog, CSV import)
//! - The check-in orchestrator

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ports;
pub mod consumption;
pub mod window;
pub mod estimator;
pub mod trend;
pub mod recommend;
pub mod command_recommender;
pub mod logs;
pub mod profile;
pub mod recipes;
pub mod import;
pub mod checkin;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use ports::{
    GoalProfileSource, LogStore, MacroRecommender, ProfileStore, RecipeCatalog, TrendSmoother,
};
pub use config::Config;
pub use consumption::ConsumptionAggregator;
pub use window::{AnalysisWindow, CalorieCoverage};
pub use estimator::{estimate_tdee, EnergyBalance};
pub use trend::EmaTrendSmoother;
pub use recommend::{recommend_with_retry, RetryPolicy};
pub use command_recommender::{CommandRecommender, UnconfiguredRecommender};
pub use logs::JsonlLogStore;
pub use profile::{ProfileFileStore, StoredProfile};
pub use recipes::{LazyRecipeBook, Recipe, RecipeBook};
pub use import::import_weights;
pub use checkin::{CheckInEngine, Collaborators};
