//! # Shopping List Aggregation
//!
//! Folds the ingredients of imported meals into a shopping list:
//!
//! - a flat list of distinct ingredient lines, sorted case-insensitively
//! - the same lines grouped by category
//! - quantity totals per `(name, unit)` pair
//!
//! The visible lists are deduplicated by exact text; totals are kept alongside
//! and are not merged into the list text.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::product_model::{DayPlan, ParsedMeal, ParsedProduct};

/// Grouping key for quantity totals
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub name: String,
    pub unit: String,
}

impl ProductKey {
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }

    fn of(product: &ParsedProduct) -> Self {
        Self::new(&product.name, &product.unit)
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.unit)
    }
}

/// Aggregated shopping list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    /// Distinct ingredient lines, case-insensitively sorted
    pub flat_list: Vec<String>,
    /// Ingredient lines per category, in first-occurrence order
    pub by_category: BTreeMap<String, Vec<String>>,
    /// Summed quantities per product and unit
    #[serde(with = "totals_serde")]
    pub totals: BTreeMap<ProductKey, f64>,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.flat_list.is_empty()
    }

    pub fn total_for(&self, name: &str, unit: &str) -> Option<f64> {
        self.totals.get(&ProductKey::new(name, unit)).copied()
    }
}

/// Totals as a list of `{name, unit, quantity}` objects, since JSON map keys
/// must be strings.
mod totals_serde {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ProductKey;

    #[derive(Serialize, Deserialize)]
    struct TotalEntry {
        name: String,
        unit: String,
        quantity: f64,
    }

    pub fn serialize<S: Serializer>(
        totals: &BTreeMap<ProductKey, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        totals
            .iter()
            .map(|(key, quantity)| TotalEntry {
                name: key.name.clone(),
                unit: key.unit.clone(),
                quantity: *quantity,
            })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ProductKey, f64>, D::Error> {
        let entries = Vec::<TotalEntry>::deserialize(deserializer)?;
        let mut totals = BTreeMap::new();
        for entry in entries {
            *totals
                .entry(ProductKey {
                    name: entry.name,
                    unit: entry.unit,
                })
                .or_insert(0.0) += entry.quantity;
        }
        Ok(totals)
    }
}

/// Builds [`ShoppingList`]s from imported meals
#[derive(Debug, Clone, Copy, Default)]
pub struct ShoppingListAggregator;

impl ShoppingListAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate the ingredients of `meals`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diet_import::product_model::{ParsedMeal, ParsedProduct};
    /// use diet_import::shopping_list::ShoppingListAggregator;
    ///
    /// let mut meal = ParsedMeal::new("Sałatka");
    /// meal.ingredients.push(ParsedProduct::new("pomidor", 2.0, "szt", "2 pomidory"));
    /// meal.ingredients.push(ParsedProduct::new("ogórek", 1.0, "szt", "1 ogórek"));
    ///
    /// let list = ShoppingListAggregator::new().aggregate(&[meal]);
    /// assert_eq!(list.flat_list, vec!["1 ogórek", "2 pomidory"]);
    /// ```
    pub fn aggregate(&self, meals: &[ParsedMeal]) -> ShoppingList {
        self.aggregate_iter(meals.iter())
    }

    /// Aggregate every meal of every day
    pub fn aggregate_days(&self, days: &[DayPlan]) -> ShoppingList {
        self.aggregate_iter(days.iter().flat_map(|day| day.meals.iter()))
    }

    fn aggregate_iter<'a>(&self, meals: impl Iterator<Item = &'a ParsedMeal>) -> ShoppingList {
        let mut list = ShoppingList::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for product in meals.flat_map(|meal| meal.ingredients.iter()) {
            if product.original.trim().is_empty() {
                continue;
            }

            if seen.insert(product.original.as_str()) {
                list.flat_list.push(product.original.clone());
            }

            *list.totals.entry(ProductKey::of(product)).or_insert(0.0) += product.quantity;

            if let Some(category) = product
                .category_id
                .as_deref()
                .filter(|c| !c.trim().is_empty())
            {
                let lines = list.by_category.entry(category.to_string()).or_default();
                if !lines.contains(&product.original) {
                    lines.push(product.original.clone());
                }
            }
        }

        // Stable: case-insensitive ties keep first-occurrence order
        list.flat_list.sort_by_cached_key(|line| line.to_lowercase());

        debug!(
            items = list.flat_list.len(),
            categories = list.by_category.len(),
            totals = list.totals.len(),
            "Aggregated shopping list"
        );
        list
    }
}
