//! # Product Categorizer
//!
//! The importer asks a [`ProductCategorizer`] for a shopping category of every
//! parsed ingredient. Real deployments plug in their own backend (database,
//! remote service); this module also ships a keyword-based implementation
//! used by the CLI and a no-op one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::CategorizerError;
use crate::product_model::ParsedProduct;

/// Source of category suggestions for parsed products
#[async_trait]
pub trait ProductCategorizer: Send + Sync {
    async fn suggest_category(
        &self,
        product: &ParsedProduct,
    ) -> Result<Option<String>, CategorizerError>;
}

/// Categorizer that never suggests anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCategorizer;

#[async_trait]
impl ProductCategorizer for NoopCategorizer {
    async fn suggest_category(
        &self,
        _product: &ParsedProduct,
    ) -> Result<Option<String>, CategorizerError> {
        Ok(None)
    }
}

/// One category and the name stems that select it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Rule-based categorizer matching keyword stems against product names.
///
/// Rules are checked in order; the first rule with a stem contained in any
/// word of the name wins.
#[derive(Debug, Clone)]
pub struct KeywordCategorizer {
    rules: Vec<CategoryRule>,
}

const POLISH_RULES: &[(&str, &[&str])] = &[
    ("przyprawy", &["sól", "soli", "pieprz", "papryka słodka", "cynamon", "oregano", "bazyli", "kurkum", "imbir", "zioła", "ziół"]),
    ("nabiał", &["mlek", "mleko", "ser", "jogurt", "kefir", "masło", "masła", "śmietan", "twaróg", "twarog", "jaj", "maślank"]),
    ("mięso", &["kurczak", "kurczaka", "pierś", "piersi", "indyk", "wołow", "wieprz", "szynk", "schab", "mięs"]),
    ("ryby", &["łosoś", "łososia", "tuńczyk", "dorsz", "pstrąg", "makrel", "krewet", "ryb"]),
    ("pieczywo", &["chleb", "bułk", "bagiet", "tortill", "pieczyw"]),
    ("produkty-sypkie", &["mąk", "cukier", "cukru", "ryż", "kasz", "makaron", "płatki", "otręb", "mąka"]),
    ("tłuszcze", &["oliw", "olej", "margaryn", "smalec"]),
    ("owoce", &["jabłk", "jabłek", "banan", "grusz", "trusk", "malin", "borów", "cytryn", "pomarańcz", "kiwi", "winogron", "śliwk"]),
    ("warzywa", &["marchew", "marchw", "cebul", "czosn", "pomidor", "ogór", "papryk", "sałat", "ziemniak", "brokuł", "szpinak", "cukini", "kapust", "pietrusz", "seler"]),
];

impl KeywordCategorizer {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Default Polish grocery categories
    pub fn polish() -> Self {
        let rules = POLISH_RULES
            .iter()
            .map(|(category, keywords)| CategoryRule {
                category: category.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            })
            .collect();
        Self::new(rules)
    }

    /// Category for a product name, if any rule matches
    pub fn categorize(&self, name: &str) -> Option<&str> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| {
                rule.keywords.iter().any(|keyword| {
                    let keyword = keyword.to_lowercase();
                    if keyword.contains(' ') {
                        name.contains(&keyword)
                    } else {
                        name.split_whitespace().any(|word| word.starts_with(&keyword))
                    }
                })
            })
            .map(|rule| rule.category.as_str())
    }
}

impl Default for KeywordCategorizer {
    fn default() -> Self {
        Self::polish()
    }
}

#[async_trait]
impl ProductCategorizer for KeywordCategorizer {
    async fn suggest_category(
        &self,
        product: &ParsedProduct,
    ) -> Result<Option<String>, CategorizerError> {
        let category = self.categorize(&product.name).map(str::to_string);
        trace!(name = %product.name, category = ?category, "Keyword categorization");
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matching() {
        let categorizer = KeywordCategorizer::polish();
        assert_eq!(categorizer.categorize("mąka pszenna"), Some("produkty-sypkie"));
        assert_eq!(categorizer.categorize("jabłka"), Some("owoce"));
        assert_eq!(categorizer.categorize("Marchew"), Some("warzywa"));
        assert_eq!(categorizer.categorize("jogurt naturalny"), Some("nabiał"));
        assert_eq!(categorizer.categorize("sól"), Some("przyprawy"));
        assert_eq!(categorizer.categorize("woda"), None);
        assert_eq!(categorizer.categorize(""), None);
    }

    #[test]
    fn test_stem_matches_word_start_only() {
        let categorizer = KeywordCategorizer::new(vec![CategoryRule {
            category: "nabiał".to_string(),
            keywords: vec!["ser".to_string()],
        }]);
        assert_eq!(categorizer.categorize("ser żółty"), Some("nabiał"));
        assert_eq!(categorizer.categorize("deser"), None);
    }

    #[tokio::test]
    async fn test_trait_implementations() {
        let product = ParsedProduct::new("cukier", 1.0, "kg", "1 kg cukier");

        let category = KeywordCategorizer::polish().suggest_category(&product).await;
        assert_eq!(category, Ok(Some("produkty-sypkie".to_string())));

        let category = NoopCategorizer.suggest_category(&product).await;
        assert_eq!(category, Ok(None));
    }
}
