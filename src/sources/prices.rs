use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::grid::load_grids;
use crate::ahsp::{is_numeric_text, normalize_number};
use crate::model::PriceTable;

const NAME_HEADER_WORDS: [&str; 6] = ["nama", "uraian", "item", "deskripsi", "name", "komponen"];
const PRICE_HEADER_WORDS: [&str; 2] = ["harga", "price"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceLoad {
    pub table: PriceTable,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Reads a basic-price table file. Without a recognizable header the first
/// column is the resource name and the second the price.
pub fn load_price_table(path: &Path) -> Result<PriceLoad> {
    let grids = load_grids(path, &[])?;

    let mut load = PriceLoad::default();
    for grid in &grids {
        let sheet = parse_price_grid(&grid.rows);
        debug!(sheet = %grid.name, prices = sheet.rows_read, "read price sheet");
        for entry in sheet.table.iter() {
            load.table.insert(&entry.name, entry.price);
        }
        load.rows_read += sheet.rows_read;
        load.rows_skipped += sheet.rows_skipped;
    }

    if load.table.is_empty() {
        warn!(path = %path.display(), "price file yielded no prices");
    }
    info!(
        path = %path.display(),
        prices = load.table.len(),
        skipped = load.rows_skipped,
        "loaded price table"
    );
    Ok(load)
}

pub fn parse_price_grid(rows: &[Vec<String>]) -> PriceLoad {
    let mut load = PriceLoad::default();

    let mut data_rows = rows
        .iter()
        .skip_while(|row| row.iter().all(|cell| cell.trim().is_empty()))
        .peekable();

    let (name_col, price_col) = match data_rows.peek().and_then(|row| header_columns(row)) {
        Some(columns) => {
            data_rows.next();
            columns
        }
        None => (0, 1),
    };

    for row in data_rows {
        let name = row.get(name_col).map(|cell| cell.trim()).unwrap_or_default();
        let price = row.get(price_col).map(|cell| cell.trim()).unwrap_or_default();

        if name.is_empty() && price.is_empty() {
            continue;
        }
        if !name.chars().any(char::is_alphabetic) || !is_numeric_text(price) {
            load.rows_skipped += 1;
            continue;
        }

        load.table.insert(name, normalize_number(price));
        load.rows_read += 1;
    }

    load
}

fn header_columns(row: &[String]) -> Option<(usize, usize)> {
    if row.iter().any(|cell| is_numeric_text(cell)) {
        return None;
    }
    let lowered: Vec<String> = row.iter().map(|cell| cell.trim().to_lowercase()).collect();

    let price_col = lowered
        .iter()
        .position(|cell| PRICE_HEADER_WORDS.iter().any(|word| cell.contains(word)))?;

    let name_col = lowered
        .iter()
        .enumerate()
        .find(|(index, cell)| {
            *index != price_col && NAME_HEADER_WORDS.iter().any(|word| cell.contains(word))
        })
        .map(|(index, _)| index)
        .unwrap_or(if price_col == 0 { 1 } else { 0 });

    Some((name_col, price_col))
}
