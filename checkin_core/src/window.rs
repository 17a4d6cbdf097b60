//! Analysis window selection and data-sufficiency gates.
//!
//! Gates run in a fixed order and the first one to fail aborts the
//! check-in with the observed count:
//! 1. At least 14 weight logs in total
//! 2. At least 7 logs carrying a trend weight
//! 3. At least 14 trend logs within 21 days of the latest trend log
//! 4. At least 7 days in that window with calories logged
//!
//! The window is anchored on the latest *trend* date, not on today, so a
//! user who stopped weighing in gets a window in the past instead of a
//! staleness failure.

use crate::{ConsumptionAggregator, Error, Macros, Result, TrendPoint, WeightLogEntry};
use chrono::{Duration, NaiveDate};

/// Minimum number of weight logs before a check-in is attempted
pub const MIN_HISTORY_DAYS: usize = 14;

/// Minimum number of weight logs with an established trend weight
pub const MIN_TREND_DAYS: usize = 7;

/// Calendar days the window reaches back from the latest trend log
pub const WINDOW_LOOKBACK_DAYS: i64 = 21;

/// Minimum trend logs inside the window
pub const MIN_WINDOW_DAYS: usize = 14;

/// Minimum days inside the window with calories logged
pub const MIN_CALORIE_DAYS: usize = 7;

/// Trend points selected for analysis, newest first
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points: Vec<TrendPoint>,
}

impl AnalysisWindow {
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.first()
    }

    pub fn oldest(&self) -> Option<&TrendPoint> {
        self.points.last()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}

/// Calories summed over the window's covered days
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalorieCoverage {
    pub total_calories: f64,
    pub days_with_calorie_data: usize,
}

/// Gate 1: enough raw weight history
pub fn check_history(history: &[WeightLogEntry]) -> Result<()> {
    if history.len() < MIN_HISTORY_DAYS {
        return Err(Error::InsufficientHistory {
            available: history.len(),
            required: MIN_HISTORY_DAYS,
        });
    }
    Ok(())
}

/// Gate 2: keep only entries with a trend weight, newest first
pub fn valid_trend_points(smoothed_chronological: &[WeightLogEntry]) -> Result<Vec<TrendPoint>> {
    let points: Vec<TrendPoint> = smoothed_chronological
        .iter()
        .rev()
        .filter_map(TrendPoint::from_entry)
        .collect();

    if points.len() < MIN_TREND_DAYS {
        return Err(Error::TrendNotEstablished {
            available: points.len(),
            required: MIN_TREND_DAYS,
        });
    }
    Ok(points)
}

/// Gate 3: carve the 21-day window ending on the newest trend point
pub fn select_recent_window(valid_newest_first: &[TrendPoint]) -> Result<AnalysisWindow> {
    let end_date = match valid_newest_first.first() {
        Some(p) => p.date,
        None => {
            return Err(Error::TrendNotEstablished {
                available: 0,
                required: MIN_TREND_DAYS,
            })
        }
    };
    let start_date = end_date - Duration::days(WINDOW_LOOKBACK_DAYS);

    let points: Vec<TrendPoint> = valid_newest_first
        .iter()
        .filter(|p| p.date >= start_date)
        .copied()
        .collect();

    if points.len() < MIN_WINDOW_DAYS {
        return Err(Error::InsufficientWindowData {
            available: points.len(),
            required: MIN_WINDOW_DAYS,
        });
    }

    tracing::info!(
        "Check-in window {} .. {} holds {} trend logs",
        start_date,
        end_date,
        points.len()
    );

    Ok(AnalysisWindow {
        start_date,
        end_date,
        points,
    })
}

/// Consumed macros for every date in the window, newest first.
///
/// Dates are fetched on scoped worker threads; the scope join is the
/// barrier before any aggregation happens.
pub fn window_intake(
    aggregator: &ConsumptionAggregator<'_>,
    user_id: &str,
    window: &AnalysisWindow,
) -> Result<Vec<(NaiveDate, Macros)>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = window
            .dates()
            .map(|date| scope.spawn(move || (date, aggregator.consumed_macros(user_id, date))))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok((date, macros)) => macros.map(|m| (date, m)),
                Err(_) => Err(Error::LogStore(
                    "worker panicked while reading consumption".into(),
                )),
            })
            .collect()
    })
}

/// Gate 4: a day is covered only when its calories are positive
pub fn calorie_coverage(daily: &[(NaiveDate, Macros)]) -> Result<CalorieCoverage> {
    let mut coverage = CalorieCoverage {
        total_calories: 0.0,
        days_with_calorie_data: 0,
    };

    for (date, macros) in daily {
        if macros.calories > 0.0 {
            coverage.total_calories += macros.calories;
            coverage.days_with_calorie_data += 1;
        } else {
            tracing::debug!("{}: no calorie data", date);
        }
    }

    if coverage.days_with_calorie_data < MIN_CALORIE_DAYS {
        return Err(Error::InsufficientCalorieData {
            available: coverage.days_with_calorie_data,
            required: MIN_CALORIE_DAYS,
        });
    }
    Ok(coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, daily_weights, InMemoryLogStore, StaticCatalog};

    fn points_newest_first(last: NaiveDate, count: usize) -> Vec<TrendPoint> {
        (0..count)
            .map(|i| TrendPoint {
                date: last - Duration::days(i as i64),
                trend_weight_kg: 80.0,
            })
            .collect()
    }

    #[test]
    fn test_history_gate() {
        let last = date(2024, 5, 1);
        assert!(matches!(
            check_history(&daily_weights(last, 13, 80.0, 79.0)),
            Err(Error::InsufficientHistory {
                available: 13,
                required: 14
            })
        ));
        assert!(check_history(&daily_weights(last, 14, 80.0, 79.0)).is_ok());
    }

    #[test]
    fn test_trend_gate_counts_only_defined_trends() {
        let mut logs = daily_weights(date(2024, 5, 1), 20, 80.0, 79.0);
        for entry in logs.iter_mut().skip(14) {
            entry.trend_weight_kg = Some(entry.raw_weight_kg);
        }

        let err = valid_trend_points(&logs).unwrap_err();
        assert_eq!(err.progress(), Some((6, 7)));

        logs[13].trend_weight_kg = Some(79.5);
        let points = valid_trend_points(&logs).unwrap();
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].date, date(2024, 5, 1));
    }

    #[test]
    fn test_window_starts_exactly_21_days_before_latest_trend() {
        let last = date(2024, 5, 30);
        let points = points_newest_first(last, 40);

        let window = select_recent_window(&points).unwrap();

        assert_eq!(window.end_date, last);
        assert_eq!(window.start_date, date(2024, 5, 9));
        assert_eq!(window.points.len(), 22);
        assert_eq!(window.oldest().unwrap().date, date(2024, 5, 9));
    }

    #[test]
    fn test_window_anchors_to_stale_trend_date() {
        // Latest trend log is long past; the window shifts back with it
        let last = date(2023, 1, 31);
        let window = select_recent_window(&points_newest_first(last, 30)).unwrap();
        assert_eq!(window.end_date, last);
        assert_eq!(window.start_date, date(2023, 1, 10));
    }

    #[test]
    fn test_sparse_window_reports_count() {
        let last = date(2024, 5, 30);
        // Every other day: 11 points fall within the 21-day lookback
        let points: Vec<TrendPoint> = (0..30)
            .map(|i| TrendPoint {
                date: last - Duration::days(i * 2),
                trend_weight_kg: 80.0,
            })
            .collect();

        let err = select_recent_window(&points).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientWindowData {
                available: 11,
                required: 14
            }
        ));
        assert!(err.to_string().contains("11"));
    }

    #[test]
    fn test_calorie_coverage_skips_zero_days() {
        let day = date(2024, 5, 1);
        let mut daily: Vec<(NaiveDate, Macros)> = (0..14)
            .map(|i| (day - Duration::days(i), Macros::ZERO))
            .collect();
        for entry in daily.iter_mut().take(5) {
            entry.1 = Macros::new(2000.0, 150.0, 200.0, 70.0);
        }

        let err = calorie_coverage(&daily).unwrap_err();
        assert_eq!(err.progress(), Some((5, 7)));

        for entry in daily.iter_mut().take(8) {
            entry.1 = Macros::new(2000.0, 150.0, 200.0, 70.0);
        }
        let coverage = calorie_coverage(&daily).unwrap();
        assert_eq!(coverage.days_with_calorie_data, 8);
        assert_eq!(coverage.total_calories, 16000.0);
    }

    #[test]
    fn test_window_intake_preserves_window_order() {
        let last = date(2024, 5, 30);
        let window = select_recent_window(&points_newest_first(last, 14)).unwrap();
        let logs = InMemoryLogStore::default()
            .with_manual(last, Macros::new(1800.0, 140.0, 180.0, 60.0));
        let recipes = StaticCatalog::default();
        let aggregator = ConsumptionAggregator::new(&logs, &recipes);

        let daily = window_intake(&aggregator, "u1", &window).unwrap();

        assert_eq!(daily.len(), 14);
        assert_eq!(daily[0], (last, Macros::new(1800.0, 140.0, 180.0, 60.0)));
        assert_eq!(daily[13].1, Macros::ZERO);
        assert!(daily.windows(2).all(|w| w[0].0 > w[1].0));
    }
}
