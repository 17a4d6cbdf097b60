//! Consumed-macro aggregation for a single date.
//!
//! A manual macro log for the date is authoritative and returned as-is.
//! Otherwise eaten planned meals are resolved against the recipe catalog,
//! scaled by servings and summed without intermediate rounding.

use crate::{Error, LogStore, Macros, MealStatus, PlannedMealEntry, RecipeCatalog, Result};
use chrono::NaiveDate;

/// Borrowing view over the collaborators needed to total a day's intake
pub struct ConsumptionAggregator<'a> {
    logs: &'a dyn LogStore,
    recipes: &'a dyn RecipeCatalog,
}

impl<'a> ConsumptionAggregator<'a> {
    pub fn new(logs: &'a dyn LogStore, recipes: &'a dyn RecipeCatalog) -> Self {
        Self { logs, recipes }
    }

    /// Macros actually consumed on `date`
    pub fn consumed_macros(&self, user_id: &str, date: NaiveDate) -> Result<Macros> {
        if let Some(manual) = self.logs.manual_macros(user_id, date)? {
            tracing::debug!("{}: using manual macro log ({} kcal)", date, manual.calories);
            return Ok(manual);
        }

        let meals = self.logs.planned_meals(user_id, date)?;
        let eaten = meals.iter().filter(|m| m.status == MealStatus::Eaten);
        let total = self.sum_meals(eaten)?;

        tracing::debug!("{}: {} kcal from eaten meals", date, total.calories);
        Ok(total)
    }

    /// Macros of every planned meal on `date`, regardless of status
    pub fn planned_macros(&self, user_id: &str, date: NaiveDate) -> Result<Macros> {
        let meals = self.logs.planned_meals(user_id, date)?;
        self.sum_meals(meals.iter())
    }

    fn sum_meals<'m>(&self, meals: impl Iterator<Item = &'m PlannedMealEntry>) -> Result<Macros> {
        let mut total = Macros::ZERO;
        for meal in meals {
            if !meal.servings.is_finite() || meal.servings <= 0.0 {
                return Err(Error::LogStore(format!(
                    "meal {} has invalid servings {}",
                    meal.id, meal.servings
                )));
            }
            let per_serving = self.recipes.macros_per_serving(&meal.recipe_id)?;
            total += per_serving.per_serving().scaled(meal.servings);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, InMemoryLogStore, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::default()
            .with("oats", Macros::new(300.0, 10.0, 50.0, 6.0))
            .with("chicken_rice", Macros::new(550.0, 45.0, 60.0, 12.0))
    }

    #[test]
    fn test_manual_log_wins_over_eaten_meals() {
        let day = date(2024, 3, 4);
        let manual = Macros::new(2100.0, 150.0, 220.0, 70.0);
        let logs = InMemoryLogStore::default()
            .with_manual(day, manual)
            .with_meal(PlannedMealEntry::new(day, "oats", 2.0).eaten());
        let recipes = catalog();

        let consumed = ConsumptionAggregator::new(&logs, &recipes)
            .consumed_macros("u1", day)
            .unwrap();

        assert_eq!(consumed, manual);
    }

    #[test]
    fn test_only_eaten_meals_are_consumed() {
        let day = date(2024, 3, 4);
        let logs = InMemoryLogStore::default()
            .with_meal(PlannedMealEntry::new(day, "oats", 1.5).eaten())
            .with_meal(PlannedMealEntry::new(day, "chicken_rice", 1.0));
        let recipes = catalog();
        let aggregator = ConsumptionAggregator::new(&logs, &recipes);

        let consumed = aggregator.consumed_macros("u1", day).unwrap();
        assert_eq!(consumed, Macros::new(450.0, 15.0, 75.0, 9.0));

        let planned = aggregator.planned_macros("u1", day).unwrap();
        assert_eq!(planned, Macros::new(1000.0, 60.0, 135.0, 21.0));
    }

    #[test]
    fn test_no_entries_is_zero_not_error() {
        let logs = InMemoryLogStore::default();
        let recipes = catalog();

        let consumed = ConsumptionAggregator::new(&logs, &recipes)
            .consumed_macros("u1", date(2024, 3, 4))
            .unwrap();

        assert_eq!(consumed, Macros::ZERO);
    }

    #[test]
    fn test_unknown_recipe_fails() {
        let day = date(2024, 3, 4);
        let logs =
            InMemoryLogStore::default().with_meal(PlannedMealEntry::new(day, "mystery", 1.0).eaten());
        let recipes = catalog();

        let result = ConsumptionAggregator::new(&logs, &recipes).consumed_macros("u1", day);
        assert!(matches!(result, Err(Error::RecipeCatalog(_))));
    }

    #[test]
    fn test_non_positive_servings_rejected() {
        let day = date(2024, 3, 4);
        let logs =
            InMemoryLogStore::default().with_meal(PlannedMealEntry::new(day, "oats", 0.0).eaten());
        let recipes = catalog();

        let result = ConsumptionAggregator::new(&logs, &recipes).consumed_macros("u1", day);
        assert!(matches!(result, Err(Error::LogStore(_))));
    }
}
