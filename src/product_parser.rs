//! # Product Parser
//!
//! This module turns one free-typed ingredient line into a [`ParsedProduct`].
//! It handles bullets, decimal commas, fraction words, quantities written
//! before or after the product name, and unit synonyms.
//!
//! ## Features
//!
//! - Leading bullets and dashes are ignored ("• 500 g mąka")
//! - Numbers glued to units are split ("500g" → "500 g")
//! - Quantity at the start or at the end of the line ("jabłko 2 szt")
//! - Parenthetical annotations are dropped from the name ("jabłko (zielone)")
//! - Container words are kept as units ("1 opakowanie jogurtu")
//! - Never fails: unreadable lines become `1 szt <line>`
//!
//! ## Usage
//!
//! ```rust
//! use diet_import::product_parser::ProductParser;
//!
//! let parser = ProductParser::new();
//! let product = parser.parse("• 500 g mąka pszenna");
//!
//! assert_eq!(product.name, "mąka pszenna");
//! assert_eq!(product.quantity, 500.0);
//! assert_eq!(product.unit, "g");
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::product_model::{ParsedProduct, DEFAULT_QUANTITY, DEFAULT_UNIT};
use crate::quantity_parser::QuantityParser;
use crate::unit_detector::{normalize_token, UnitDetector};

lazy_static! {
    static ref BULLET_PREFIX: Regex =
        Regex::new(r"^[\s•·◦▪\-–—*]+").expect("Bullet pattern should be valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("Whitespace pattern should be valid");
    static ref CLOSED_PARENTHETICAL: Regex =
        Regex::new(r"\([^()]*\)").expect("Parenthetical pattern should be valid");
    static ref OPEN_PARENTHETICAL: Regex =
        Regex::new(r"\(.*$").expect("Open parenthetical pattern should be valid");
    static ref NUMERIC_TOKEN: Regex = Regex::new(r"^\d+(?:[.,]\d+)?$|^\d+[/⁄]\d+$")
        .expect("Numeric token pattern should be valid");
    static ref GLUED_QUANTITY: Regex = Regex::new(r"^(\d+(?:[.,]\d+)?)([^\d\s.,/]+\.?)$")
        .expect("Glued quantity pattern should be valid");
}

/// Stems of container and serving words kept as units when unrecognized
const CONTAINER_STEMS: &[&str] = &[
    "opak", "paczk", "paczek", "puszk", "puszek", "słoik", "sloik", "słoicz", "butel", "kostk",
    "kostek", "toreb", "woreczk", "woreczek", "porcj",
];

/// Configuration options for product parsing
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Report kept container words with `has_custom_unit = true`.
    ///
    /// Off by default: downstream consumers expect `false` for these units.
    pub flag_container_units_as_custom: bool,
}

/// Quantity found in a token list
#[derive(Debug, Clone, Copy, PartialEq)]
struct QuantityHit {
    index: usize,
    value: f64,
    candidate: Option<usize>,
}

/// Parser for single ingredient lines
#[derive(Debug, Clone, Default)]
pub struct ProductParser {
    quantities: QuantityParser,
    units: UnitDetector,
    config: ParserConfig,
}

impl ProductParser {
    /// Create a parser with the built-in unit table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser over a specific unit detector
    pub fn with_units(units: UnitDetector) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse one ingredient line.
    ///
    /// Always returns a complete record; `original` is `line` unchanged.
    pub fn parse(&self, line: &str) -> ParsedProduct {
        let cleaned = self.clean_input(line);
        trace!(line, cleaned = %cleaned, "Parsing ingredient line");

        match self.resolve(&cleaned, line) {
            Some(product) => product,
            None => {
                debug!(line, "Falling back to default product");
                ParsedProduct::fallback(&clean_product_name(&cleaned), line)
            }
        }
    }

    /// Parse every line of an ingredients cell, in order
    pub fn parse_cell(&self, cell: &str) -> Vec<ParsedProduct> {
        split_ingredient_lines(cell)
            .iter()
            .map(|line| self.parse(line))
            .collect()
    }

    /// Strip bullets, collapse whitespace and split numbers glued to units
    fn clean_input(&self, line: &str) -> String {
        let without_bullet = BULLET_PREFIX.replace(line, "");
        without_bullet
            .split_whitespace()
            .map(|token| self.split_glued_quantity(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn split_glued_quantity(&self, token: &str) -> String {
        if let Some(captures) = GLUED_QUANTITY.captures(token) {
            if self.units.lookup(&captures[2]).is_some() {
                return format!("{} {}", &captures[1], &captures[2]);
            }
        }
        token.to_string()
    }

    fn resolve(&self, cleaned: &str, original: &str) -> Option<ParsedProduct> {
        let masked = strip_parenthetical(cleaned);
        // Numbers the quantity parser refused ("0", "1/0") are not part of the name
        let tokens: Vec<&str> = masked
            .split_whitespace()
            .filter(|token| !self.is_rejected_number(token))
            .collect();

        let Some(hit) = self.locate_quantity(&tokens) else {
            return Some(self.resolve_embedded_unit(&tokens, DEFAULT_QUANTITY, original));
        };

        if !(hit.value.is_finite() && hit.value > 0.0) {
            return None;
        }

        let Some(candidate) = hit.candidate else {
            let rest = without(&tokens, &[hit.index]);
            return Some(self.resolve_embedded_unit(&rest, hit.value, original));
        };

        let candidate_token = tokens[candidate];
        if let Some(unit) = self.units.lookup(candidate_token) {
            let name = without(&tokens, &[hit.index, candidate]).join(" ");
            trace!(unit = %unit.canonical_unit, "Candidate unit recognized");
            return Some(ParsedProduct::new(
                &clean_product_name(&name),
                hit.value,
                &unit.canonical_unit,
                original,
            ));
        }

        if is_container_word(candidate_token) {
            let unit = candidate_token.trim_end_matches(|c: char| !c.is_alphanumeric());
            let name = without(&tokens, &[hit.index, candidate]).join(" ");
            debug!(unit, "Keeping container word as unit");
            return Some(
                ParsedProduct::new(&clean_product_name(&name), hit.value, unit, original)
                    .with_custom_unit(self.config.flag_container_units_as_custom),
            );
        }

        // Unrecognized neighbour belongs to the name; a unit may still follow
        let rest = without(&tokens, &[hit.index]);
        Some(self.resolve_embedded_unit(&rest, hit.value, original))
    }

    fn is_rejected_number(&self, token: &str) -> bool {
        NUMERIC_TOKEN.is_match(token) && self.quantities.parse(token).is_none()
    }

    /// Quantity at the start of the line wins, then the last one from the end
    fn locate_quantity(&self, tokens: &[&str]) -> Option<QuantityHit> {
        let leading = tokens
            .first()
            .and_then(|token| self.quantities.parse(token))
            .map(|value| (0, value));

        let (index, value) = leading.or_else(|| {
            tokens
                .iter()
                .enumerate()
                .rev()
                .find_map(|(i, token)| self.quantities.parse(token).map(|value| (i, value)))
        })?;

        let candidate = if index + 1 < tokens.len() {
            Some(index + 1)
        } else if index > 0 {
            Some(index - 1)
        } else {
            None
        };

        Some(QuantityHit {
            index,
            value,
            candidate,
        })
    }

    /// Pull a recognized unit out of the name text, defaulting to `szt`.
    ///
    /// A count written right before the unit ("jajka 3 szt") is dropped with
    /// it; the quantity already found wins.
    fn resolve_embedded_unit(&self, tokens: &[&str], quantity: f64, original: &str) -> ParsedProduct {
        let text = tokens.join(" ");
        match self.units.find_unit(&text) {
            Some(found) => {
                let mut skip = vec![found.token_index];
                if found.token_index > 0
                    && self.quantities.parse(tokens[found.token_index - 1]).is_some()
                {
                    skip.push(found.token_index - 1);
                }
                let name = without(tokens, &skip).join(" ");
                ParsedProduct::new(
                    &clean_product_name(&name),
                    quantity,
                    &found.result.canonical_unit,
                    original,
                )
            }
            None => ParsedProduct::new(&clean_product_name(&text), quantity, DEFAULT_UNIT, original),
        }
    }
}

fn without<'a>(tokens: &[&'a str], skip: &[usize]) -> Vec<&'a str> {
    tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(_, token)| *token)
        .collect()
}

fn is_container_word(token: &str) -> bool {
    let word = normalize_token(token);
    CONTAINER_STEMS.iter().any(|stem| word.starts_with(stem))
}

/// Remove parenthetical groups, including nested and unclosed ones
fn strip_parenthetical(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = CLOSED_PARENTHETICAL.replace_all(&current, " ").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    OPEN_PARENTHETICAL
        .replace(&current, " ")
        .replace(')', " ")
}

/// Normalize a product name: lowercase, no parentheticals, single spaces.
///
/// Applying it to an already clean name returns the name unchanged.
///
/// # Examples
///
/// ```rust
/// use diet_import::product_parser::clean_product_name;
///
/// assert_eq!(clean_product_name("Jabłko (zielone)"), "jabłko");
/// assert_eq!(clean_product_name("jabłko"), "jabłko");
/// ```
pub fn clean_product_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = strip_parenthetical(&lowered);
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '–' | '—' | '•' | '·'))
        .to_string()
}

/// Split an ingredients cell into trimmed, non-empty lines.
///
/// Lines are separated by line breaks and by commas, except a comma between
/// two digits, which is a decimal comma ("2,5 kg cukru"). The price is that a
/// separator typed without a space before a number ("ryż 100,2 jajka") is
/// read as a decimal comma and the two items stay on one line.
pub fn split_ingredient_lines(cell: &str) -> Vec<String> {
    let chars: Vec<char> = cell.chars().collect();
    let mut lines = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let is_separator = match c {
            '\n' | '\r' => true,
            ',' => {
                let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
                let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                !(prev_digit && next_digit)
            }
            _ => false,
        };

        if is_separator {
            push_line(&mut lines, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_line(&mut lines, &current);

    lines
}

fn push_line(lines: &mut Vec<String>, line: &str) {
    let trimmed = line.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}
