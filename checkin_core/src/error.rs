//! Error types for the checkin_core library.

use serde::{Deserialize, Serialize};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failed check-in.
///
/// Callers branch on this rather than on individual variants: data
/// insufficiency is fixed by logging more, the others are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataInsufficiency,
    ComputationInvalid,
    CollaboratorFailure,
    InvalidInput,
}

/// Core error type for checkin_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient history: need at least {required} weight logs, found {available} ({available} of {required} days)")]
    InsufficientHistory { available: usize, required: usize },

    #[error("Trend not established: need {required} days with a trend weight, found {available} ({available} of {required} days)")]
    TrendNotEstablished { available: usize, required: usize },

    #[error("Not enough trend data in the check-in window: found {available} of {required} days")]
    InsufficientWindowData { available: usize, required: usize },

    #[error("Not enough calorie data in the check-in window: found {available} of {required} days")]
    InsufficientCalorieData { available: usize, required: usize },

    /// The energy-balance estimate came out non-finite or non-positive
    #[error("Invalid TDEE calculated ({value}); check log consistency")]
    InvalidTdee { value: f64 },

    /// Goal profile failed boundary validation
    #[error("Invalid goal profile: {0}")]
    InvalidProfile(String),

    #[error("Log store error: {0}")]
    LogStore(String),

    #[error("Recipe catalog error: {0}")]
    RecipeCatalog(String),

    #[error("Trend smoother error: {0}")]
    TrendSmoother(String),

    #[error("Macro recommender error: {0}")]
    Recommender(String),

    #[error("Macro recommender timed out after {attempts} attempt(s) ({timeout_ms} ms each)")]
    RecommenderTimeout { attempts: u32, timeout_ms: u64 },

    #[error("Profile store error: {0}")]
    ProfileStore(String),
}

impl Error {
    /// Classify this error for callers that only need the broad category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InsufficientHistory { .. }
            | Error::TrendNotEstablished { .. }
            | Error::InsufficientWindowData { .. }
            | Error::InsufficientCalorieData { .. } => ErrorKind::DataInsufficiency,
            Error::InvalidTdee { .. } => ErrorKind::ComputationInvalid,
            Error::InvalidProfile(_) => ErrorKind::InvalidInput,
            Error::Io(_)
            | Error::Json(_)
            | Error::Csv(_)
            | Error::Toml(_)
            | Error::Config(_)
            | Error::LogStore(_)
            | Error::RecipeCatalog(_)
            | Error::TrendSmoother(_)
            | Error::Recommender(_)
            | Error::RecommenderTimeout { .. }
            | Error::ProfileStore(_) => ErrorKind::CollaboratorFailure,
        }
    }

    /// Observed and required counts, for data-insufficiency errors
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            Error::InsufficientHistory {
                available,
                required,
            }
            | Error::TrendNotEstablished {
                available,
                required,
            }
            | Error::InsufficientWindowData {
                available,
                required,
            }
            | Error::InsufficientCalorieData {
                available,
                required,
            } => Some((*available, *required)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_report_counts() {
        let err = Error::InsufficientHistory {
            available: 9,
            required: 14,
        };
        assert_eq!(err.kind(), ErrorKind::DataInsufficiency);
        assert_eq!(err.progress(), Some((9, 14)));
        assert!(err.to_string().contains("9 of 14"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::InvalidTdee { value: -3.0 }.kind(),
            ErrorKind::ComputationInvalid
        );
        assert_eq!(
            Error::Recommender("boom".into()).kind(),
            ErrorKind::CollaboratorFailure
        );
        assert_eq!(
            Error::InvalidProfile("rate missing".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert!(Error::ProfileStore("disk".into()).progress().is_none());
    }
}
