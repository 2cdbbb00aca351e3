//! # Diet Plan Import Example
//!
//! Imports a small two-day plan from inline CSV, then prints the parsed meals
//! and the aggregated shopping list.

use std::sync::Arc;

use diet_import::categorizer::KeywordCategorizer;
use diet_import::config::ImportConfig;
use diet_import::grid::read_csv_grid;
use diet_import::logging::init_tracing;
use diet_import::product_parser::ProductParser;
use diet_import::{SheetImporter, ShoppingListAggregator};

const MONDAY: &str = r#"1,Owsianka,"Zalać płatki mlekiem, dodać banana","50 g płatki owsiane
1 szklanka mleka
1 banan","350,12,7,60"
2,Sałatka,Pokroić warzywa,"2 pomidory, ogórek 1 szt, oliwa 1 łyżka","180;4,5;12;14"
"#;

const TUESDAY: &str = r#"1,Omlet,Usmażyć,"3 jajka, szczypta soli, 1 łyżeczka masła","320,20,24,2"
,,,,
2,Kanapki,,"4 plastry chleba, 100g twarogu, pół ogórka",
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    println!("🥗 Diet Plan Import Example");
    println!("===========================\n");

    let importer = SheetImporter::new(
        ProductParser::new(),
        Arc::new(KeywordCategorizer::polish()),
        ImportConfig::default(),
    )?;

    let sheets = vec![
        ("Poniedziałek".to_string(), read_csv_grid(MONDAY.as_bytes())?),
        ("Wtorek".to_string(), read_csv_grid(TUESDAY.as_bytes())?),
    ];
    let days = importer.import_days(&sheets, 1).await?;

    for day in &days {
        println!("📅 {}", day.label);
        for meal in &day.meals {
            print!("{}", meal);
            match meal.nutrition {
                Some(n) => println!(
                    "  kcal {:?}, B {:?}, T {:?}, W {:?}",
                    n.calories, n.protein, n.fat, n.carbs
                ),
                None => println!("  (no nutrition data)"),
            }
        }
        println!();
    }

    let list = ShoppingListAggregator::new().aggregate_days(&days);

    println!("🛒 Shopping list");
    println!("---------------");
    for item in &list.flat_list {
        println!("  • {}", item);
    }

    println!("\n📦 By category");
    for (category, items) in &list.by_category {
        println!("  {}: {}", category, items.join("; "));
    }

    Ok(())
}
