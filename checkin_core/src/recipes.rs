//! Recipe catalog loaded from `recipes.toml`.
//!
//! ```toml
//! [[recipe]]
//! id = "overnight_oats"
//! name = "Overnight oats"
//! calories = 420
//! protein = 24
//! carbs = 55
//! fat = 11
//! ```
//!
//! Values are per serving.

use crate::{Error, Macros, RecipeCatalog, RecipeMacros, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A single recipe with per-serving macros
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Recipe {
    pub fn per_serving(&self) -> Macros {
        Macros::new(self.calories, self.protein, self.carbs, self.fat)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecipeFile {
    #[serde(default)]
    recipe: Vec<Recipe>,
}

/// All known recipes, keyed by id
#[derive(Clone, Debug, Default)]
pub struct RecipeBook {
    pub recipes: HashMap<String, Recipe>,
}

impl RecipeBook {
    /// Load the catalog; a missing file yields an empty catalog
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No recipe catalog at {:?}, starting empty", path);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let book = Self::parse(&contents)?;
        tracing::debug!("Loaded {} recipes from {:?}", book.recipes.len(), path);
        Ok(book)
    }

    /// Parse and validate TOML catalog contents
    pub fn parse(contents: &str) -> Result<Self> {
        let file: RecipeFile = toml::from_str(contents)?;

        let mut errors = Vec::new();
        let mut recipes = HashMap::new();
        for recipe in file.recipe {
            if recipes.contains_key(&recipe.id) {
                errors.push(format!("duplicate recipe id '{}'", recipe.id));
                continue;
            }
            recipes.insert(recipe.id.clone(), recipe);
        }

        let book = Self { recipes };
        errors.extend(book.validate());
        if !errors.is_empty() {
            return Err(Error::RecipeCatalog(errors.join("; ")));
        }
        Ok(book)
    }

    /// Validate catalog integrity, returning every problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, recipe) in &self.recipes {
            if id.is_empty() {
                errors.push("recipe has empty id".to_string());
            }
            if recipe.name.trim().is_empty() {
                errors.push(format!("recipe '{}' has empty name", id));
            }
            if !recipe.per_serving().is_valid() {
                errors.push(format!(
                    "recipe '{}' has negative or non-finite macros",
                    id
                ));
            }
        }

        errors
    }

    pub fn get(&self, recipe_id: &str) -> Option<&Recipe> {
        self.recipes.get(recipe_id)
    }
}

impl RecipeCatalog for RecipeBook {
    fn macros_per_serving(&self, recipe_id: &str) -> Result<RecipeMacros> {
        let recipe = self
            .get(recipe_id)
            .ok_or_else(|| Error::RecipeCatalog(format!("unknown recipe '{}'", recipe_id)))?;
        RecipeMacros::new(recipe.per_serving())
    }
}

/// Catalog file read on first lookup, so a check-in that never resolves
/// a recipe never touches it
#[derive(Debug)]
pub struct LazyRecipeBook {
    path: PathBuf,
    book: OnceLock<std::result::Result<RecipeBook, String>>,
}

impl LazyRecipeBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            book: OnceLock::new(),
        }
    }

    fn book(&self) -> Result<&RecipeBook> {
        self.book
            .get_or_init(|| RecipeBook::load(&self.path).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|msg| Error::RecipeCatalog(format!("{:?}: {}", self.path, msg)))
    }
}

impl RecipeCatalog for LazyRecipeBook {
    fn macros_per_serving(&self, recipe_id: &str) -> Result<RecipeMacros> {
        self.book()?.macros_per_serving(recipe_id)
    }
}
