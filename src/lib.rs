//! # Diet Plan Import
//!
//! Normalizes free-typed Polish diet plan spreadsheets: ingredient lines
//! become structured products, nutrition cells become validated macros, and
//! the meals of a whole plan fold into a categorized shopping list.
//!
//! ```rust
//! use diet_import::product_parser::ProductParser;
//!
//! let product = ProductParser::new().parse("pół kg mąki");
//! assert_eq!((product.quantity, product.unit.as_str()), (0.5, "kg"));
//! ```

pub mod categorizer;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod grid;
pub mod logging;
pub mod nutrition_parser;
pub mod product_model;
pub mod product_parser;
pub mod quantity_parser;
pub mod sheet_importer;
pub mod shopping_list;
pub mod unit_detector;

pub use errors::{CategorizerError, ImportError, ImportResult};
pub use product_model::{DayPlan, NutritionalValues, ParsedMeal, ParsedProduct};
pub use sheet_importer::SheetImporter;
pub use shopping_list::{ShoppingList, ShoppingListAggregator};
