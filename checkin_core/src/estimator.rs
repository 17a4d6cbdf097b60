//! Energy-balance TDEE estimation.
//!
//! TDEE = average intake - (trend weight change * 7700 kcal/kg) / days.
//! A gaining user ate above expenditure, so the surplus is subtracted;
//! a losing user ate below it, so the deficit is added back.

use crate::{AnalysisWindow, CalorieCoverage, Error, Result};

/// Energy of one kilogram of body-mass change (kcal)
pub const KCAL_PER_KG: f64 = 7700.0;

/// Duration used when the window's boundary dates coincide
pub const ZERO_DURATION_FLOOR_DAYS: i64 = 1;

/// Intermediate values and the resulting TDEE
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyBalance {
    pub average_daily_calories: f64,
    pub latest_trend_weight_kg: f64,
    pub oldest_trend_weight_kg: f64,
    pub weight_change_kg: f64,
    pub duration_days: i64,
    pub actual_weekly_weight_change_kg: f64,
    pub calories_from_weight_change: f64,
    pub average_daily_deficit_or_surplus: f64,
    pub new_tdee: u32,
}

/// Whole calendar days between the window's oldest and latest trend points.
///
/// Identical boundary dates would divide by zero downstream; they are
/// treated as one day instead.
pub fn window_duration_days(window: &AnalysisWindow) -> i64 {
    let days = match (window.latest(), window.oldest()) {
        (Some(latest), Some(oldest)) => (latest.date - oldest.date).num_days(),
        _ => 0,
    };

    if days == 0 {
        tracing::debug!(
            "Window boundaries coincide, using {} day",
            ZERO_DURATION_FLOOR_DAYS
        );
        ZERO_DURATION_FLOOR_DAYS
    } else {
        days
    }
}

/// Estimate a new steady-state TDEE from trend drift and observed intake
pub fn estimate_tdee(window: &AnalysisWindow, coverage: &CalorieCoverage) -> Result<EnergyBalance> {
    let (latest, oldest) = match (window.latest(), window.oldest()) {
        (Some(latest), Some(oldest)) => (latest, oldest),
        _ => return Err(Error::InvalidTdee { value: f64::NAN }),
    };

    let average_daily_calories =
        coverage.total_calories / coverage.days_with_calorie_data as f64;

    let latest_trend_weight_kg = latest.trend_weight_kg;
    let oldest_trend_weight_kg = oldest.trend_weight_kg;
    let weight_change_kg = latest_trend_weight_kg - oldest_trend_weight_kg;

    let duration_days = window_duration_days(window);
    let days = duration_days as f64;

    let actual_weekly_weight_change_kg = (weight_change_kg / days) * 7.0;
    let calories_from_weight_change = weight_change_kg * KCAL_PER_KG;
    let average_daily_deficit_or_surplus = calories_from_weight_change / days;

    let raw_tdee = (average_daily_calories - average_daily_deficit_or_surplus).round();
    if !raw_tdee.is_finite() || raw_tdee <= 0.0 || raw_tdee > f64::from(u32::MAX) {
        tracing::warn!(
            "Rejecting TDEE estimate {} (avg {} kcal, change {} kg over {} days)",
            raw_tdee,
            average_daily_calories,
            weight_change_kg,
            duration_days
        );
        return Err(Error::InvalidTdee { value: raw_tdee });
    }

    let balance = EnergyBalance {
        average_daily_calories,
        latest_trend_weight_kg,
        oldest_trend_weight_kg,
        weight_change_kg,
        duration_days,
        actual_weekly_weight_change_kg,
        calories_from_weight_change,
        average_daily_deficit_or_surplus,
        new_tdee: raw_tdee as u32,
    };

    tracing::info!(
        "Estimated TDEE {} kcal: avg intake {:.0} kcal, trend change {:+.2} kg over {} days",
        balance.new_tdee,
        average_daily_calories,
        weight_change_kg,
        duration_days
    );

    Ok(balance)
}
