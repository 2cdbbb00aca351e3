//! # Nutrition Parser
//!
//! Parses the compact nutrition cell of a meal row: four numbers in the fixed
//! order calories, protein, fat, carbs ("350,15,7,60").
//!
//! Commas double as field separators and decimal separators, so
//! "350, 15,5, 7, 60" is read as protein 15.5. The text is split on commas and
//! neighbouring pieces are merged back into decimal numbers until exactly four
//! fields remain. When more than one reading is possible the cell is rejected.
//! A semicolon-separated cell ("350;15,5;7;60") is read without guessing.
//!
//! Validation is atomic: one bad field rejects the whole cell.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::product_model::NutritionalValues;

lazy_static! {
    static ref NUMBER: Regex =
        Regex::new(r"^-?\d+(?:[.,]\d+)?$").expect("Number pattern should be valid");
}

const FIELD_COUNT: usize = 4;

/// Cells split into more pieces than this are not worth disambiguating
const MAX_PIECES: usize = 12;

/// Parser for nutrition cells
#[derive(Debug, Clone, Copy, Default)]
pub struct NutritionParser;

impl NutritionParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a nutrition cell.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diet_import::nutrition_parser::NutritionParser;
    ///
    /// let parser = NutritionParser::new();
    /// let values = parser.parse(Some("350,15,7,60")).unwrap();
    /// assert_eq!(values.calories, Some(350.0));
    /// assert_eq!(values.carbs, Some(60.0));
    ///
    /// assert!(parser.parse(Some("100,200,300,1500")).is_none());
    /// assert!(parser.parse(None).is_none());
    /// ```
    pub fn parse(&self, text: Option<&str>) -> Option<NutritionalValues> {
        let text = text?.trim();
        if text.is_empty() {
            return None;
        }

        let fields = if text.contains(';') {
            text.split(';').map(str::to_string).collect()
        } else {
            resolve_comma_fields(text)?
        };

        if fields.len() != FIELD_COUNT {
            debug!(text, fields = fields.len(), "Nutrition cell has wrong field count");
            return None;
        }

        let values = fields
            .iter()
            .map(|field| parse_value(field))
            .collect::<Option<Vec<f64>>>()?;

        let nutrition = NutritionalValues::new(values[0], values[1], values[2], values[3]);
        if nutrition.is_valid() {
            trace!(text, "Parsed nutrition cell");
            Some(nutrition)
        } else {
            debug!(text, "Nutrition value out of range");
            None
        }
    }
}

fn parse_value(field: &str) -> Option<f64> {
    let field = field.trim();
    if !NUMBER.is_match(field) {
        return None;
    }
    field.replace(',', ".").parse::<f64>().ok()
}

/// Group comma-separated pieces into exactly four fields, if unambiguous
fn resolve_comma_fields(text: &str) -> Option<Vec<String>> {
    let pieces: Vec<&str> = text.split(',').collect();
    if pieces.len() < FIELD_COUNT || pieces.len() > MAX_PIECES {
        return None;
    }

    let mut solutions = Vec::new();
    collect_groupings(
        &pieces,
        0,
        pieces.len() - FIELD_COUNT,
        &mut Vec::new(),
        &mut solutions,
    );

    if solutions.len() == 1 {
        solutions.pop()
    } else {
        debug!(text, readings = solutions.len(), "Ambiguous nutrition cell");
        None
    }
}

/// Enumerate readings; stops once two are found since that already means ambiguity
fn collect_groupings(
    pieces: &[&str],
    index: usize,
    merges_left: usize,
    current: &mut Vec<String>,
    solutions: &mut Vec<Vec<String>>,
) {
    if solutions.len() > 1 {
        return;
    }
    if index == pieces.len() {
        if merges_left == 0 {
            solutions.push(current.clone());
        }
        return;
    }

    current.push(pieces[index].to_string());
    collect_groupings(pieces, index + 1, merges_left, current, solutions);
    current.pop();

    if merges_left > 0 && index + 1 < pieces.len() && can_merge(pieces[index], pieces[index + 1]) {
        current.push(format!("{},{}", pieces[index], pieces[index + 1]));
        collect_groupings(pieces, index + 2, merges_left - 1, current, solutions);
        current.pop();
    }
}

/// A decimal comma sits between digits with no whitespace around it
fn can_merge(left: &str, right: &str) -> bool {
    let whole = left.trim_start();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && !right.is_empty()
        && right.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_cell() {
        let values = NutritionParser::new().parse(Some("350,15,7,60")).unwrap();
        assert_eq!(values, NutritionalValues::new(350.0, 15.0, 7.0, 60.0));
    }

    #[test]
    fn test_out_of_range_rejects_whole_cell() {
        let parser = NutritionParser::new();
        assert!(parser.parse(Some("100,200,300,1500")).is_none());
        assert!(parser.parse(Some("-1,20,30,40")).is_none());
        assert!(parser.parse(Some("1000,1000,0,0")).is_some());
    }

    #[test]
    fn test_missing_or_blank() {
        let parser = NutritionParser::new();
        assert!(parser.parse(None).is_none());
        assert!(parser.parse(Some("")).is_none());
        assert!(parser.parse(Some("   ")).is_none());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let values = NutritionParser::new().parse(Some(" 350 , 15 , 7 , 60 ")).unwrap();
        assert_eq!(values.protein, Some(15.0));
    }

    #[test]
    fn test_decimal_dot_fields() {
        let values = NutritionParser::new().parse(Some("350.5,15.2,7,60")).unwrap();
        assert_eq!(values.calories, Some(350.5));
        assert_eq!(values.protein, Some(15.2));
    }

    #[test]
    fn test_decimal_comma_disambiguated_by_spacing() {
        let values = NutritionParser::new().parse(Some("350, 15,5, 7, 60")).unwrap();
        assert_eq!(values, NutritionalValues::new(350.0, 15.5, 7.0, 60.0));
    }

    #[test]
    fn test_ambiguous_decimal_comma_fails() {
        let parser = NutritionParser::new();
        assert!(parser.parse(Some("350,15,5,7,60")).is_none());
        assert!(parser.parse(Some("350,15,7,60,1")).is_none());
    }

    #[test]
    fn test_semicolon_fields() {
        let values = NutritionParser::new().parse(Some("350;15,5;7;60,2")).unwrap();
        assert_eq!(values, NutritionalValues::new(350.0, 15.5, 7.0, 60.2));
        assert!(NutritionParser::new().parse(Some("350;15;7")).is_none());
    }

    #[test]
    fn test_malformed_cells() {
        let parser = NutritionParser::new();
        assert!(parser.parse(Some("350,15,7")).is_none());
        assert!(parser.parse(Some("abc,15,7,60")).is_none());
        assert!(parser.parse(Some("350,15,,60")).is_none());
        assert!(parser.parse(Some("nan,1,2,3")).is_none());
        assert!(parser.parse(Some("350 kcal")).is_none());
    }
}
