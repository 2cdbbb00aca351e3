//! # Product and Meal Data Model
//!
//! This module defines the records produced by the import pipeline: parsed
//! ingredient occurrences, per-meal nutrition and imported meal rows.
//!
//! ## Core Concepts
//!
//! - **ParsedProduct**: one normalized ingredient line with quantity and unit
//! - **NutritionalValues**: calories and macros of a meal, validated as a unit
//! - **ParsedMeal**: one named row of an imported sheet
//! - **DayPlan**: the meals of one sheet (one day of a diet)
//!
//! ## Usage
//!
//! ```rust
//! use diet_import::product_model::ParsedProduct;
//!
//! let flour = ParsedProduct::new("mąka", 500.0, "g", "500 g mąka");
//! assert_eq!(flour.to_string(), "500 g mąka");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit assigned when nothing better is known
pub const DEFAULT_UNIT: &str = "szt";

/// Quantity assigned when no number could be read
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Upper bound for every nutrition sub-value
pub const MAX_NUTRITION_VALUE: f64 = 1000.0;

/// A single normalized ingredient occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProduct {
    /// Cleaned, lowercased product name (e.g., "mąka pszenna")
    pub name: String,

    /// Magnitude, always positive
    pub quantity: f64,

    /// Canonical unit code (e.g., "g", "łyżka") or a kept container word
    pub unit: String,

    /// Verbatim input line
    pub original: String,

    /// Whether the unit did not come from the synonym table
    pub has_custom_unit: bool,

    /// Category assigned by the categorizer, if any
    pub category_id: Option<String>,
}

/// Calories and macros of one meal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionalValues {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
}

/// One imported meal row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMeal {
    pub name: String,
    pub instructions: String,
    pub ingredients: Vec<ParsedProduct>,
    pub nutrition: Option<NutritionalValues>,
}

/// Meals imported from one sheet of a multi-day plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Sheet label, usually the day name
    pub label: String,
    pub meals: Vec<ParsedMeal>,
}

impl ParsedProduct {
    /// Create an uncategorized product with a known unit
    pub fn new(name: &str, quantity: f64, unit: &str, original: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            original: original.to_string(),
            has_custom_unit: false,
            category_id: None,
        }
    }

    /// Safe default record for a line nothing could be read from
    pub fn fallback(name: &str, original: &str) -> Self {
        Self::new(name, DEFAULT_QUANTITY, DEFAULT_UNIT, original)
    }

    /// Mark the unit as custom
    pub fn with_custom_unit(mut self, custom: bool) -> Self {
        self.has_custom_unit = custom;
        self
    }

    /// Attach a category id
    pub fn with_category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id.filter(|c| !c.trim().is_empty());
        self
    }

    /// Check whether the quantity came from the default rather than the text
    pub fn is_default_quantity(&self) -> bool {
        self.quantity == DEFAULT_QUANTITY && self.unit == DEFAULT_UNIT
    }
}

impl NutritionalValues {
    /// Create a record with all four values present
    pub fn new(calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            calories: Some(calories),
            protein: Some(protein),
            fat: Some(fat),
            carbs: Some(carbs),
        }
    }

    /// Check that every present value lies in `[0, MAX_NUTRITION_VALUE]`
    pub fn is_valid(&self) -> bool {
        [self.calories, self.protein, self.fat, self.carbs]
            .iter()
            .flatten()
            .all(|v| v.is_finite() && (0.0..=MAX_NUTRITION_VALUE).contains(v))
    }
}

impl ParsedMeal {
    /// Create a meal without ingredients or nutrition
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instructions: String::new(),
            ingredients: Vec::new(),
            nutrition: None,
        }
    }

    /// Number of ingredients that received a category
    pub fn categorized_count(&self) -> usize {
        self.ingredients
            .iter()
            .filter(|p| p.category_id.is_some())
            .count()
    }
}

impl fmt::Display for ParsedProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity.fract() == 0.0 {
            write!(f, "{} {} {}", self.quantity as i64, self.unit, self.name)
        } else {
            write!(f, "{} {} {}", self.quantity, self.unit, self.name)
        }
    }
}

impl fmt::Display for ParsedMeal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} ingredients):", self.name, self.ingredients.len())?;

        for product in &self.ingredients {
            writeln!(f, "  • {}", product)?;
        }

        Ok(())
    }
}
