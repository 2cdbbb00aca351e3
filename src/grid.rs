//! Reading sheet grids from CSV exports.
//!
//! Sheets are exported without a header row and rows may have different
//! lengths, so the reader is header-less and flexible.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::errors::{ImportError, ImportResult};
use crate::sheet_importer::Row;

/// Read every record of a CSV source as a row of string cells
pub fn read_csv_grid<R: Read>(reader: R) -> ImportResult<Vec<Row>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

/// Load a CSV file as a grid
pub fn load_csv_grid(path: &Path) -> ImportResult<Vec<Row>> {
    let file = File::open(path).map_err(|e| {
        ImportError::Grid(format!("failed to open {}: {}", path.display(), e))
    })?;
    let grid = read_csv_grid(file)?;
    debug!(path = %path.display(), rows = grid.len(), "Loaded CSV grid");
    Ok(grid)
}
