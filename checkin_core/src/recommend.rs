//! Macro recommender invocation with timeout and one bounded retry.
//!
//! Each attempt runs on its own thread and is abandoned when the timeout
//! expires; a late answer from an abandoned attempt is dropped with its
//! channel. Nothing is persisted here, so a failed or timed-out call can
//! never leave a partial profile update behind.

use crate::config::RecommenderConfig;
use crate::{Error, MacroRecommender, Recommendation, RecommendationRequest, Result};
use rand::Rng;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Hard cap on retries after the first attempt
pub const MAX_RETRIES: u32 = 1;

/// Timeout and retry behaviour for recommender calls
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RecommenderConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_jitter: Duration::from_millis(config.retry_jitter_ms),
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.min(MAX_RETRIES) + 1
    }

    /// Base delay plus a uniformly random jitter
    fn backoff(&self) -> Duration {
        let jitter_ms = millis(self.max_jitter);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base_delay.saturating_add(Duration::from_millis(jitter))
    }
}

/// Ask the recommender for new targets, retrying once on any failure
pub fn recommend_with_retry(
    recommender: &Arc<dyn MacroRecommender>,
    request: &RecommendationRequest,
    policy: &RetryPolicy,
) -> Result<Recommendation> {
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match attempt_once(recommender, request, policy.timeout, attempt) {
            Ok(recommendation) => {
                tracing::info!("Macro recommender answered on attempt {}", attempt);
                return Ok(recommendation);
            }
            // A missing configuration will not fix itself on retry
            Err(e) if attempt < attempts && !matches!(e, Error::Config(_)) => {
                let delay = policy.backoff();
                tracing::warn!(
                    "Macro recommender attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt,
                    attempts,
                    e,
                    delay
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("Macro recommender failed after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn attempt_once(
    recommender: &Arc<dyn MacroRecommender>,
    request: &RecommendationRequest,
    timeout: Duration,
    attempt: u32,
) -> Result<Recommendation> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(recommender);
    let request = request.clone();

    std::thread::Builder::new()
        .name(format!("macro-recommender-{}", attempt))
        .spawn(move || {
            // Receiver is gone if the attempt already timed out
            let _ = tx.send(worker.recommend(&request));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.and_then(validate_recommendation),
        Err(RecvTimeoutError::Timeout) => Err(Error::RecommenderTimeout {
            attempts: attempt,
            timeout_ms: millis(timeout),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(Error::Recommender(
            "recommender worker exited without a response".into(),
        )),
    }
}

/// Enforce the recommender's output contract
pub fn validate_recommendation(recommendation: Recommendation) -> Result<Recommendation> {
    if !recommendation.new_macro_targets.is_valid() {
        return Err(Error::Recommender(format!(
            "recommended macros must be finite and non-negative: {:?}",
            recommendation.new_macro_targets
        )));
    }
    if recommendation.coaching_summary.trim().is_empty() {
        return Err(Error::Recommender("coaching summary is empty".into()));
    }
    Ok(recommendation)
}
