//! # Quantity Parser
//!
//! Extracts a numeric magnitude from a single text token.
//!
//! Supported forms:
//!
//! - Integers and decimals with either `.` or `,` as separator ("500", "2,5", "0.25")
//! - Simple fractions ("1/2") and single vulgar fraction characters ("½")
//! - A closed set of Polish fraction words ("pół", "półtora", "ćwierć")
//!
//! Anything else yields `None`, which callers read as "no quantity in this token".

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

lazy_static! {
    static ref DECIMAL: Regex =
        Regex::new(r"^\d+(?:[.,]\d+)?$").expect("Decimal pattern should be valid");
    static ref FRACTION: Regex =
        Regex::new(r"^(\d+)[/⁄](\d+)$").expect("Fraction pattern should be valid");
}

/// Fraction words and their values
const FRACTION_WORDS: &[(&str, f64)] = &[
    ("pół", 0.5),
    ("pol", 0.5),
    ("połowa", 0.5),
    ("polowa", 0.5),
    ("półtora", 1.5),
    ("półtorej", 1.5),
    ("ćwierć", 0.25),
];

/// Unicode vulgar fractions
const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('½', 0.5),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
];

/// Parser for quantity tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityParser;

impl QuantityParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a token into a positive magnitude.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diet_import::quantity_parser::QuantityParser;
    ///
    /// let parser = QuantityParser::new();
    /// assert_eq!(parser.parse("2,5"), Some(2.5));
    /// assert_eq!(parser.parse("pół"), Some(0.5));
    /// assert_eq!(parser.parse("garść"), None);
    /// ```
    pub fn parse(&self, token: &str) -> Option<f64> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let value = parse_number(token)
            .or_else(|| parse_fraction(token))
            .or_else(|| parse_fraction_word(token))?;

        // Zero and negative magnitudes never leave the parser
        if value.is_finite() && value > 0.0 {
            trace!(token, value, "Parsed quantity token");
            Some(value)
        } else {
            None
        }
    }
}

fn parse_number(token: &str) -> Option<f64> {
    if !DECIMAL.is_match(token) {
        return None;
    }
    token.replace(',', ".").parse::<f64>().ok()
}

fn parse_fraction(token: &str) -> Option<f64> {
    if let Some(captures) = FRACTION.captures(token) {
        let numerator: f64 = captures[1].parse().ok()?;
        let denominator: f64 = captures[2].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    let mut chars = token.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    VULGAR_FRACTIONS
        .iter()
        .find(|(c, _)| *c == first)
        .map(|(_, value)| *value)
}

fn parse_fraction_word(token: &str) -> Option<f64> {
    let word = token.to_lowercase();
    FRACTION_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, value)| *value)
}
