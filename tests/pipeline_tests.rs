//! # Pipeline Integration Tests
//!
//! End-to-end import of sheet grids into meals and shopping lists.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diet_import::categorizer::{KeywordCategorizer, NoopCategorizer, ProductCategorizer};
use diet_import::config::ImportConfig;
use diet_import::grid::read_csv_grid;
use diet_import::product_parser::ProductParser;
use diet_import::sheet_importer::Row;
use diet_import::{CategorizerError, ParsedProduct, SheetImporter, ShoppingListAggregator};

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

fn importer_with(categorizer: Arc<dyn ProductCategorizer>, config: ImportConfig) -> SheetImporter {
    SheetImporter::new(ProductParser::new(), categorizer, config).unwrap()
}

/// Delays answers so rows finish out of order
struct JitterCategorizer;

#[async_trait]
impl ProductCategorizer for JitterCategorizer {
    async fn suggest_category(
        &self,
        product: &ParsedProduct,
    ) -> Result<Option<String>, CategorizerError> {
        let delay = (product.quantity as u64 % 7) * 3;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(None)
    }
}

#[tokio::test]
async fn test_blank_and_unnamed_rows_are_skipped() {
    let importer = importer_with(Arc::new(NoopCategorizer), ImportConfig::default());
    let grid = vec![
        row(&["1", "Śniadanie", "Wymieszać", "2 jajka", "300,20,20,5"]),
        row(&["", "", "", "", ""]),
        row(&["3", "", "bez nazwy", "1 jabłko", ""]),
        row(&["4", "Kolacja", "", "200 g ryżu", ""]),
    ];

    let meals = importer.import(&grid, 1).await.unwrap();
    let names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Śniadanie", "Kolacja"]);
}

#[tokio::test]
async fn test_row_order_restored_after_concurrent_processing() {
    let config = ImportConfig {
        concurrency: 3,
        ..Default::default()
    };
    let importer = importer_with(Arc::new(JitterCategorizer), config);
    let grid: Vec<Row> = (0..20)
        .map(|i| {
            vec![
                String::new(),
                format!("Posiłek {}", i),
                String::new(),
                format!("{} g mąki", i + 1),
                String::new(),
            ]
        })
        .collect();

    let meals = importer.import(&grid, 1).await.unwrap();
    assert_eq!(meals.len(), 20);
    for (i, meal) in meals.iter().enumerate() {
        assert_eq!(meal.name, format!("Posiłek {}", i));
        assert_eq!(meal.ingredients[0].quantity, (i + 1) as f64);
    }
}

#[tokio::test]
async fn test_wider_skip_columns_shift_layout() {
    let importer = importer_with(Arc::new(NoopCategorizer), ImportConfig::default());
    let grid = vec![row(&["A", "7", "Zupa", "Gotować", "1 l wody", "120,3,2,20"])];

    let meals = importer.import(&grid, 2).await.unwrap();
    assert_eq!(meals[0].name, "Zupa");
    assert_eq!(meals[0].instructions, "Gotować");
    assert_eq!(meals[0].ingredients[0].unit, "l");
    assert_eq!(meals[0].nutrition.unwrap().calories, Some(120.0));
}

#[tokio::test]
async fn test_csv_plan_to_shopping_list() {
    let monday = "1,Owsianka,Wymieszać,\"50 g płatki owsiane\n1 banan\",\"350,12,7,60\"\n";
    let tuesday = "1,Koktajl,,\"1 banan, 200 ml mleka\",\n,,,,\n";
    let sheets = vec![
        ("pon".to_string(), read_csv_grid(monday.as_bytes()).unwrap()),
        ("wt".to_string(), read_csv_grid(tuesday.as_bytes()).unwrap()),
    ];

    let importer = importer_with(Arc::new(KeywordCategorizer::polish()), ImportConfig::default());
    let days = importer.import_days(&sheets, 1).await.unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0].meals[0].nutrition.unwrap().carbs, Some(60.0));
    assert_eq!(days[1].meals.len(), 1);

    let list = ShoppingListAggregator::new().aggregate_days(&days);
    assert_eq!(
        list.flat_list,
        vec!["1 banan", "200 ml mleka", "50 g płatki owsiane"]
    );
    assert_eq!(list.total_for("banan", "szt"), Some(2.0));
    assert_eq!(list.by_category["owoce"], vec!["1 banan"]);
    assert_eq!(list.by_category["nabiał"], vec!["200 ml mleka"]);
    assert_eq!(list.by_category["produkty-sypkie"], vec!["50 g płatki owsiane"]);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let config = ImportConfig {
        concurrency: 0,
        ..Default::default()
    };
    let result = SheetImporter::new(ProductParser::new(), Arc::new(NoopCategorizer), config);
    assert!(result.is_err());
}
