//! Exponential-moving-average trend smoother.
//!
//! The check-in engine only relies on the `TrendSmoother` contract; this is
//! the implementation the CLI wires in. The EMA is seeded with the first
//! raw weight and carried across date gaps (one update per logged day). A
//! trend weight is only emitted once `min_history` entries have been seen.

use crate::config::TrendConfig;
use crate::{Error, Result, TrendSmoother, WeightLogEntry};

#[derive(Clone, Debug)]
pub struct EmaTrendSmoother {
    alpha: f64,
    min_history: usize,
}

impl EmaTrendSmoother {
    pub fn new(alpha: f64, min_history: usize) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::Config(format!(
                "trend alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha,
            min_history: min_history.max(1),
        })
    }

    pub fn from_config(config: &TrendConfig) -> Result<Self> {
        Self::new(config.alpha, config.min_history)
    }
}

impl TrendSmoother for EmaTrendSmoother {
    fn smooth(&self, chronological: &[WeightLogEntry]) -> Result<Vec<WeightLogEntry>> {
        let mut ema: Option<f64> = None;
        let mut smoothed = Vec::with_capacity(chronological.len());

        for (i, entry) in chronological.iter().enumerate() {
            if !entry.raw_weight_kg.is_finite() || entry.raw_weight_kg <= 0.0 {
                return Err(Error::TrendSmoother(format!(
                    "invalid raw weight {} on {}",
                    entry.raw_weight_kg, entry.date
                )));
            }

            let next = match ema {
                None => entry.raw_weight_kg,
                Some(prev) => self.alpha * entry.raw_weight_kg + (1.0 - self.alpha) * prev,
            };
            ema = Some(next);

            smoothed.push(WeightLogEntry {
                trend_weight_kg: (i + 1 >= self.min_history).then_some(next),
                ..entry.clone()
            });
        }

        tracing::debug!(
            "Smoothed {} weight logs ({} with trend)",
            smoothed.len(),
            smoothed.iter().filter(|e| e.trend_weight_kg.is_some()).count()
        );

        Ok(smoothed)
    }
}
