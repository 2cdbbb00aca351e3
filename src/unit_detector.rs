//! # Unit Detector
//!
//! Recognizes written unit forms and maps them to canonical unit codes.
//!
//! The synonym table is an explicit, immutable [`UnitTable`] owned by the
//! detector. It is either the built-in Polish table or loaded from JSON:
//!
//! ```json
//! {
//!   "units": [
//!     { "canonical": "g", "category": "weight", "synonyms": ["g", "gr", "gram"] }
//!   ]
//! }
//! ```
//!
//! Lookup is case-insensitive and ignores trailing punctuation, so "Łyż." and
//! "łyż" resolve to the same unit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{ImportError, ImportResult};
use crate::product_model::DEFAULT_UNIT;

/// Broad family of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Weight,
    Volume,
    Count,
    Kitchen,
    Serving,
    Unknown,
}

impl UnitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Weight => "weight",
            UnitCategory::Volume => "volume",
            UnitCategory::Count => "count",
            UnitCategory::Kitchen => "kitchen",
            UnitCategory::Serving => "serving",
            UnitCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a unit lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDetectionResult {
    pub canonical_unit: String,
    pub category: UnitCategory,
    pub is_known: bool,
}

impl UnitDetectionResult {
    fn unknown() -> Self {
        Self {
            canonical_unit: DEFAULT_UNIT.to_string(),
            category: UnitCategory::Unknown,
            is_known: false,
        }
    }
}

/// A recognized unit together with its token position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMatch {
    /// Index of the matching whitespace-separated token
    pub token_index: usize,
    pub result: UnitDetectionResult,
}

/// One canonical unit and its written forms, as stored in JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UnitDefinition {
    pub canonical: String,
    pub category: UnitCategory,
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct UnitTableFile {
    units: Vec<UnitDefinition>,
}

#[derive(Debug, Clone)]
struct UnitEntry {
    canonical: String,
    category: UnitCategory,
}

/// Immutable synonym → canonical unit lookup
#[derive(Debug, Clone)]
pub struct UnitTable {
    entries: HashMap<String, UnitEntry>,
}

/// Built-in Polish units: (canonical, category, synonyms)
const POLISH_UNITS: &[(&str, UnitCategory, &[&str])] = &[
    ("mg", UnitCategory::Weight, &["mg", "miligram", "miligramy", "miligramów"]),
    ("g", UnitCategory::Weight, &["g", "gr", "gram", "gramy", "gramów", "gramow", "grama"]),
    ("dag", UnitCategory::Weight, &["dag", "dkg", "deko", "dekagram", "dekagramy", "dekagramów"]),
    ("kg", UnitCategory::Weight, &["kg", "kilo", "kilogram", "kilogramy", "kilogramów", "kilograma"]),
    ("ml", UnitCategory::Volume, &["ml", "mililitr", "mililitry", "mililitrów"]),
    ("l", UnitCategory::Volume, &["l", "litr", "litry", "litrów", "litra"]),
    ("szt", UnitCategory::Count, &["szt", "sz", "sztuka", "sztuki", "sztuk", "sztukę"]),
    ("łyżka", UnitCategory::Kitchen, &["łyżka", "łyżki", "łyżek", "łyżkę", "łyż", "lyzka", "lyzki"]),
    ("łyżeczka", UnitCategory::Kitchen, &["łyżeczka", "łyżeczki", "łyżeczek", "łyżeczkę", "łyżecz", "lyzeczka", "lyzeczki"]),
    ("szklanka", UnitCategory::Kitchen, &["szklanka", "szklanki", "szklanek", "szklankę", "szkl"]),
    ("szczypta", UnitCategory::Kitchen, &["szczypta", "szczypty", "szczyptę", "szczypt"]),
    ("garść", UnitCategory::Kitchen, &["garść", "garści", "garśc"]),
    ("plaster", UnitCategory::Count, &["plaster", "plastry", "plastrów", "plasterek", "plasterki", "plasterków"]),
    ("ząbek", UnitCategory::Count, &["ząbek", "ząbki", "ząbków", "zabek", "zabki"]),
    ("porcja", UnitCategory::Serving, &["porcja", "porcje", "porcji", "porcję"]),
];

/// Lowercase a token and drop trailing punctuation
pub fn normalize_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

impl UnitTable {
    /// The built-in Polish unit table
    pub fn polish() -> Self {
        let definitions = POLISH_UNITS
            .iter()
            .map(|(canonical, category, synonyms)| UnitDefinition {
                canonical: canonical.to_string(),
                category: *category,
                synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        // Built-in definitions are validated in tests
        Self::build(definitions)
    }

    /// Build a validated table from unit definitions
    pub fn from_definitions(definitions: Vec<UnitDefinition>) -> ImportResult<Self> {
        validate_definitions(&definitions)?;
        Ok(Self::build(definitions))
    }

    /// Parse and validate a table from JSON text
    pub fn from_json_str(json: &str) -> ImportResult<Self> {
        let file: UnitTableFile = serde_json::from_str(json)
            .map_err(|e| ImportError::UnitTable(format!("invalid unit table JSON: {e}")))?;
        Self::from_definitions(file.units)
    }

    /// Load a table from a JSON file
    pub fn from_file(path: &Path) -> ImportResult<Self> {
        info!(path = %path.display(), "Loading unit table");
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn build(definitions: Vec<UnitDefinition>) -> Self {
        let mut entries = HashMap::new();
        for definition in definitions {
            let canonical = definition.canonical.trim().to_string();
            let mut forms = definition.synonyms;
            forms.push(canonical.clone());
            for form in forms {
                entries.insert(
                    normalize_token(&form),
                    UnitEntry {
                        canonical: canonical.clone(),
                        category: definition.category,
                    },
                );
            }
        }
        debug!(synonyms = entries.len(), "Built unit table");
        Self { entries }
    }

    fn get(&self, token: &str) -> Option<&UnitEntry> {
        let key = normalize_token(token);
        if key.is_empty() {
            return None;
        }
        self.entries.get(&key)
    }

    /// Number of written forms in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::polish()
    }
}

fn validate_definitions(definitions: &[UnitDefinition]) -> ImportResult<()> {
    if definitions.is_empty() {
        return Err(ImportError::UnitTable("units cannot be empty".to_string()));
    }

    let mut owners: HashMap<String, String> = HashMap::new();
    for (i, definition) in definitions.iter().enumerate() {
        let canonical = definition.canonical.trim();
        if canonical.is_empty() {
            return Err(ImportError::UnitTable(format!(
                "units[{i}].canonical cannot be empty"
            )));
        }
        if definition.synonyms.is_empty() {
            return Err(ImportError::UnitTable(format!(
                "units[{i}] '{canonical}' has no synonyms"
            )));
        }
        for (j, synonym) in definition.synonyms.iter().enumerate() {
            if synonym.chars().any(|c| c.is_control()) {
                return Err(ImportError::UnitTable(format!(
                    "units[{i}].synonyms[{j}] '{synonym}' contains control characters"
                )));
            }
            let key = normalize_token(synonym);
            if key.is_empty() {
                return Err(ImportError::UnitTable(format!(
                    "units[{i}].synonyms[{j}] cannot be empty"
                )));
            }
            if let Some(owner) = owners.get(&key) {
                if owner != canonical {
                    return Err(ImportError::UnitTable(format!(
                        "synonym '{key}' maps to both '{owner}' and '{canonical}'"
                    )));
                }
            }
            owners.insert(key, canonical.to_string());
        }
    }
    Ok(())
}

/// Unit detector over an owned synonym table
#[derive(Debug, Clone, Default)]
pub struct UnitDetector {
    table: UnitTable,
}

impl UnitDetector {
    pub fn new(table: UnitTable) -> Self {
        Self { table }
    }

    /// Look up a single token
    pub fn lookup(&self, token: &str) -> Option<UnitDetectionResult> {
        self.table.get(token).map(|entry| UnitDetectionResult {
            canonical_unit: entry.canonical.clone(),
            category: entry.category,
            is_known: true,
        })
    }

    /// Find the first recognized unit token in `text`
    pub fn find_unit(&self, text: &str) -> Option<UnitMatch> {
        text.split_whitespace()
            .enumerate()
            .find_map(|(token_index, token)| {
                self.lookup(token)
                    .map(|result| UnitMatch { token_index, result })
            })
    }

    /// Detect a unit anywhere in `text`.
    ///
    /// Falls back to `szt` with `is_known = false` when no token matches.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diet_import::unit_detector::UnitDetector;
    ///
    /// let detector = UnitDetector::default();
    /// assert_eq!(detector.detect("2 łyżki").canonical_unit, "łyżka");
    /// assert!(!detector.detect("opakowanie").is_known);
    /// ```
    pub fn detect(&self, text: &str) -> UnitDetectionResult {
        self.find_unit(text)
            .map(|m| m.result)
            .unwrap_or_else(UnitDetectionResult::unknown)
    }
}
