use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use diet_import::categorizer::KeywordCategorizer;
use diet_import::config::AppConfig;
use diet_import::grid::load_csv_grid;
use diet_import::logging::init_tracing;
use diet_import::product_parser::ProductParser;
use diet_import::unit_detector::{UnitDetector, UnitTable};
use diet_import::{DayPlan, SheetImporter, ShoppingList, ShoppingListAggregator};

/// Import diet plan sheets exported as CSV and print meals plus a shopping list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV exports, one per day of the plan
    #[arg(required = true)]
    sheets: Vec<PathBuf>,

    /// Leading columns before the meal name column
    #[arg(long, allow_negative_numbers = true)]
    skip_columns: Option<i64>,

    /// JSON unit table replacing the built-in one
    #[arg(long)]
    units: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct Output {
    days: Vec<DayPlan>,
    shopping_list: ShoppingList,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Invalid configuration")?;

    let table = match cli.units.as_ref().or(config.unit_table_path.as_ref()) {
        Some(path) => UnitTable::from_file(path)
            .with_context(|| format!("Failed to load unit table from {}", path.display()))?,
        None => UnitTable::polish(),
    };
    let parser = ProductParser::with_units(UnitDetector::new(table));

    let importer = SheetImporter::new(
        parser,
        Arc::new(KeywordCategorizer::polish()),
        config.import,
    )?;

    let mut sheets = Vec::with_capacity(cli.sheets.len());
    for path in &cli.sheets {
        let grid = load_csv_grid(path)
            .with_context(|| format!("Failed to read sheet {}", path.display()))?;
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        sheets.push((label, grid));
    }

    let skip_columns = cli
        .skip_columns
        .unwrap_or(importer.config().skip_columns as i64);
    let days = importer.import_days(&sheets, skip_columns).await?;
    let shopping_list = ShoppingListAggregator::new().aggregate_days(&days);
    if shopping_list.is_empty() {
        warn!("No ingredients found in the imported sheets");
    }

    info!(
        days = days.len(),
        meals = days.iter().map(|d| d.meals.len()).sum::<usize>(),
        items = shopping_list.flat_list.len(),
        "Import finished"
    );

    let output = Output {
        days,
        shopping_list,
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");

    Ok(())
}
