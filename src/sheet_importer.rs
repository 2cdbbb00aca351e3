//! # Sheet Importer
//!
//! Walks a decoded spreadsheet grid of meal rows and produces [`ParsedMeal`]s.
//!
//! ## Row layout
//!
//! With `skip_columns = s` the columns `[0, s)` are skipped (the last of them
//! conventionally holds the order number, which is not retained), then:
//!
//! | column | field        |
//! |--------|--------------|
//! | s      | meal name    |
//! | s + 1  | instructions |
//! | s + 2  | ingredients  |
//! | s + 3  | nutrition    |
//!
//! Rows that are entirely blank or have no name are skipped. Rows are
//! processed concurrently and returned in sheet order. Categorizer failures
//! leave products uncategorized and never abort a row.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::categorizer::ProductCategorizer;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::ImportConfig;
use crate::errors::{CategorizerError, ImportError, ImportResult};
use crate::nutrition_parser::NutritionParser;
use crate::product_model::{DayPlan, ParsedMeal, ParsedProduct};
use crate::product_parser::ProductParser;

/// One spreadsheet row of string cells
pub type Row = Vec<String>;

/// Column positions of the logical row fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: usize,
    pub instructions: usize,
    pub ingredients: usize,
    pub nutrition: usize,
}

impl ColumnLayout {
    pub fn with_skip(skip_columns: usize) -> Self {
        Self {
            name: skip_columns,
            instructions: skip_columns + 1,
            ingredients: skip_columns + 2,
            nutrition: skip_columns + 3,
        }
    }
}

/// Non-blank, trimmed cell content
fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
}

/// Per-row work shared by all worker tasks
#[derive(Clone)]
struct RowWorker {
    parser: Arc<ProductParser>,
    nutrition: NutritionParser,
    categorizer: Arc<dyn ProductCategorizer>,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl RowWorker {
    fn parse_row(&self, row: &[String], layout: ColumnLayout) -> Option<ParsedMeal> {
        if row.iter().all(|c| c.trim().is_empty()) {
            return None;
        }
        let name = cell(row, layout.name)?;

        Some(ParsedMeal {
            name: name.to_string(),
            instructions: cell(row, layout.instructions).unwrap_or_default().to_string(),
            ingredients: cell(row, layout.ingredients)
                .map(|c| self.parser.parse_cell(c))
                .unwrap_or_default(),
            nutrition: self.nutrition.parse(cell(row, layout.nutrition)),
        })
    }

    async fn categorize(&self, product: &ParsedProduct) -> Option<String> {
        if self.breaker.is_open() {
            debug!(product = %product.name, error = %CategorizerError::CircuitOpen, "Skipping categorization");
            return None;
        }

        let outcome =
            match tokio::time::timeout(self.timeout, self.categorizer.suggest_category(product)).await {
                Ok(result) => result,
                Err(_) => Err(CategorizerError::Timeout(self.timeout)),
            };

        match outcome {
            Ok(category) => {
                self.breaker.record_success();
                category
            }
            Err(e) => {
                self.breaker.record_failure();
                warn!(product = %product.name, error = %e, "Categorization failed, product left uncategorized");
                None
            }
        }
    }

    async fn process(&self, row: &[String], layout: ColumnLayout) -> Option<ParsedMeal> {
        let mut meal = self.parse_row(row, layout)?;
        let mut categorized = Vec::with_capacity(meal.ingredients.len());
        for product in std::mem::take(&mut meal.ingredients) {
            let category = self.categorize(&product).await;
            categorized.push(product.with_category(category));
        }
        meal.ingredients = categorized;
        Some(meal)
    }
}

/// Importer turning sheet grids into meals
pub struct SheetImporter {
    worker: RowWorker,
    config: ImportConfig,
}

impl SheetImporter {
    /// Create an importer; fails only on invalid configuration
    pub fn new(
        parser: ProductParser,
        categorizer: Arc<dyn ProductCategorizer>,
        config: ImportConfig,
    ) -> ImportResult<Self> {
        config.validate()?;
        info!(
            skip_columns = config.skip_columns,
            concurrency = config.concurrency,
            timeout_ms = config.recovery.categorizer_timeout_ms,
            "Creating SheetImporter"
        );

        Ok(Self {
            worker: RowWorker {
                parser: Arc::new(parser),
                nutrition: NutritionParser::new(),
                categorizer,
                breaker: Arc::new(CircuitBreaker::new(&config.recovery)),
                timeout: config.recovery.categorizer_timeout(),
            },
            config,
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Parse one row without categorization
    pub fn parse_row(&self, row: &[String], skip_columns: usize) -> Option<ParsedMeal> {
        self.worker.parse_row(row, ColumnLayout::with_skip(skip_columns))
    }

    /// Import every named row of `grid`, in row order.
    ///
    /// Out-of-range `skip_columns` values fall back to the configured one.
    /// Dropping the returned future aborts rows still in progress.
    pub async fn import(&self, grid: &[Row], skip_columns: i64) -> ImportResult<Vec<ParsedMeal>> {
        let layout = ColumnLayout::with_skip(self.config.resolve_skip_columns(skip_columns));
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (index, row) in grid.iter().enumerate() {
            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);
            let row = row.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ImportError::Worker(e.to_string()))?;
                Ok::<_, ImportError>((index, worker.process(&row, layout).await))
            });
        }

        let mut imported = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, meal) = joined??;
            if let Some(meal) = meal {
                imported.push((index, meal));
            } else {
                debug!(row = index, "Skipping empty or unnamed row");
            }
        }
        imported.sort_by_key(|(index, _)| *index);

        info!(
            rows = grid.len(),
            meals = imported.len(),
            skipped = grid.len() - imported.len(),
            categorized = imported.iter().map(|(_, m)| m.categorized_count()).sum::<usize>(),
            "Sheet import completed"
        );

        Ok(imported.into_iter().map(|(_, meal)| meal).collect())
    }

    /// Import several labelled sheets, one per diet day
    pub async fn import_days(
        &self,
        sheets: &[(String, Vec<Row>)],
        skip_columns: i64,
    ) -> ImportResult<Vec<DayPlan>> {
        let mut days = Vec::with_capacity(sheets.len());
        for (label, grid) in sheets {
            debug!(day = %label, rows = grid.len(), "Importing day");
            days.push(DayPlan {
                label: label.clone(),
                meals: self.import(grid, skip_columns).await?,
            });
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::{KeywordCategorizer, NoopCategorizer};
    use crate::config::RecoveryConfig;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn importer(categorizer: Arc<dyn ProductCategorizer>) -> SheetImporter {
        SheetImporter::new(ProductParser::new(), categorizer, ImportConfig::default()).unwrap()
    }

    struct FailingCategorizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductCategorizer for FailingCategorizer {
        async fn suggest_category(
            &self,
            _product: &ParsedProduct,
        ) -> Result<Option<String>, CategorizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CategorizerError::Unavailable("backend down".to_string()))
        }
    }

    struct SlowCategorizer;

    #[async_trait]
    impl ProductCategorizer for SlowCategorizer {
        async fn suggest_category(
            &self,
            _product: &ParsedProduct,
        ) -> Result<Option<String>, CategorizerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some("never".to_string()))
        }
    }

    #[test]
    fn test_column_layout() {
        let layout = ColumnLayout::with_skip(2);
        assert_eq!(layout.name, 2);
        assert_eq!(layout.instructions, 3);
        assert_eq!(layout.ingredients, 4);
        assert_eq!(layout.nutrition, 5);
    }

    #[test]
    fn test_parse_row_fields() {
        let importer = importer(Arc::new(NoopCategorizer));
        let meal = importer
            .parse_row(
                &row(&["1", "Owsianka", "Wymieszać", "50 g płatki owsiane, 1 banan", "350,15,7,60"]),
                1,
            )
            .unwrap();

        assert_eq!(meal.name, "Owsianka");
        assert_eq!(meal.instructions, "Wymieszać");
        assert_eq!(meal.ingredients.len(), 2);
        assert_eq!(meal.ingredients[0].name, "płatki owsiane");
        assert_eq!(meal.ingredients[1].name, "banan");
        assert_eq!(meal.nutrition.unwrap().calories, Some(350.0));
    }

    #[test]
    fn test_parse_row_with_missing_cells() {
        let importer = importer(Arc::new(NoopCategorizer));
        let meal = importer.parse_row(&row(&["2", "Kanapka"]), 1).unwrap();
        assert_eq!(meal.instructions, "");
        assert!(meal.ingredients.is_empty());
        assert!(meal.nutrition.is_none());
    }

    #[test]
    fn test_parse_row_skips() {
        let importer = importer(Arc::new(NoopCategorizer));
        assert!(importer.parse_row(&row(&["", " ", ""]), 1).is_none());
        assert!(importer.parse_row(&row(&["3", "  ", "opis", "1 jabłko"]), 1).is_none());
        assert!(importer.parse_row(&row(&[]), 1).is_none());
    }

    #[tokio::test]
    async fn test_import_attaches_categories() {
        let importer = importer(Arc::new(KeywordCategorizer::polish()));
        let grid = vec![row(&["1", "Placki", "", "500 g mąka, 2 jajka, woda", ""])];

        let meals = importer.import(&grid, 1).await.unwrap();
        let ingredients = &meals[0].ingredients;
        assert_eq!(ingredients[0].category_id.as_deref(), Some("produkty-sypkie"));
        assert_eq!(ingredients[1].category_id.as_deref(), Some("nabiał"));
        assert_eq!(ingredients[2].category_id, None);
    }

    #[tokio::test]
    async fn test_categorizer_failure_does_not_abort_rows() {
        let categorizer = Arc::new(FailingCategorizer {
            calls: AtomicUsize::new(0),
        });
        let config = ImportConfig {
            recovery: RecoveryConfig {
                circuit_breaker_threshold: 2,
                ..Default::default()
            },
            concurrency: 1,
            ..Default::default()
        };
        let importer =
            SheetImporter::new(ProductParser::new(), categorizer.clone(), config).unwrap();
        let grid = vec![
            row(&["1", "A", "", "1 jabłko, 2 gruszki", ""]),
            row(&["2", "B", "", "3 banany", ""]),
        ];

        let meals = importer.import(&grid, 1).await.unwrap();
        assert_eq!(meals.len(), 2);
        assert!(meals
            .iter()
            .flat_map(|m| m.ingredients.iter())
            .all(|p| p.category_id.is_none()));
        // Circuit opens after two failures, the third product is never sent
        assert_eq!(categorizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_categorizer_timeout_leaves_uncategorized() {
        let config = ImportConfig {
            recovery: RecoveryConfig {
                categorizer_timeout_ms: 20,
                ..Default::default()
            },
            ..Default::default()
        };
        let importer =
            SheetImporter::new(ProductParser::new(), Arc::new(SlowCategorizer), config).unwrap();
        let grid = vec![row(&["1", "Sałatka", "", "1 pomidor", ""])];

        let meals = importer.import(&grid, 1).await.unwrap();
        assert_eq!(meals[0].ingredients[0].category_id, None);
    }

    #[tokio::test]
    async fn test_out_of_range_skip_columns_uses_default() {
        let importer = importer(Arc::new(NoopCategorizer));
        let grid = vec![row(&["1", "Obiad", "", "200 g ryżu", ""])];

        let meals = importer.import(&grid, 42).await.unwrap();
        assert_eq!(meals[0].name, "Obiad");

        let meals = importer.import(&grid, -1).await.unwrap();
        assert_eq!(meals[0].name, "Obiad");

        let meals = importer.import(&grid, 0).await.unwrap();
        assert_eq!(meals[0].name, "1");
    }

    #[tokio::test]
    async fn test_out_of_range_skip_uses_configured_skip() {
        let config = ImportConfig {
            skip_columns: 2,
            ..Default::default()
        };
        let importer =
            SheetImporter::new(ProductParser::new(), Arc::new(NoopCategorizer), config).unwrap();
        assert_eq!(importer.config().skip_columns, 2);
        let grid = vec![row(&["A", "7", "Zupa", "", "1 l wody", ""])];

        for requested in [42, -3] {
            let meals = importer.import(&grid, requested).await.unwrap();
            assert_eq!(meals[0].name, "Zupa");
            assert_eq!(meals[0].ingredients[0].unit, "l");
        }
    }

    #[tokio::test]
    async fn test_import_days() {
        let importer = importer(Arc::new(NoopCategorizer));
        let sheets = vec![
            ("Poniedziałek".to_string(), vec![row(&["1", "Śniadanie", "", "2 jajka", ""])]),
            ("Wtorek".to_string(), vec![row(&["1", "Obiad", "", "", ""]), row(&["", "", "", "", ""])]),
        ];

        let days = importer.import_days(&sheets, 1).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].label, "Poniedziałek");
        assert_eq!(days[1].meals.len(), 1);
    }
}
