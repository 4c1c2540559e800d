//! File adapters: raw cell grids, master catalog tables and price tables.

mod grid;
mod master;
mod prices;

pub use grid::load_grids;
pub use master::{MasterColumns, read_master_table, write_master_csv};
pub use prices::load_price_table;

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::ahsp::{GridScanner, ResourceLineParser, ScanStats};
use crate::cli::Layout;
use crate::model::WorkItem;

/// Work items read from one source file, before duplicate filtering.
#[derive(Debug, Default)]
pub struct SourceCatalog {
    pub items: Vec<WorkItem>,
    pub sheets: Vec<String>,
    pub layout: String,
    pub stats: ScanStats,
}

pub fn load_catalog_source(path: &Path, layout: Layout, sheets: &[String]) -> Result<SourceCatalog> {
    let grids = load_grids(path, sheets)?;
    let scanner = GridScanner::new()?;
    let parser = ResourceLineParser::new()?;

    let mut catalog = SourceCatalog::default();
    let mut layouts_used: Vec<&'static str> = Vec::new();

    for grid in &grids {
        let master_columns = match layout {
            Layout::Analysis => None,
            Layout::Master | Layout::Auto => MasterColumns::detect(&grid.rows),
        };

        let used = match (layout, master_columns) {
            (Layout::Master, None) => {
                debug!(sheet = %grid.name, "sheet has no master table header; skipped");
                continue;
            }
            (_, Some(columns)) => {
                let items = read_master_table(&grid.rows, &columns, &parser);
                info!(sheet = %grid.name, items = items.len(), "read master table");
                catalog.items.extend(items);
                Layout::Master
            }
            (_, None) => {
                let (items, stats) = scanner.extract_with_stats(&grid.rows);
                info!(
                    sheet = %grid.name,
                    items = items.len(),
                    rows = stats.rows_scanned,
                    rejected_headers = stats.headers_rejected,
                    "scanned analysis sheet"
                );
                accumulate_stats(&mut catalog.stats, &stats);
                catalog.items.extend(items);
                Layout::Analysis
            }
        };

        if !layouts_used.contains(&used.as_str()) {
            layouts_used.push(used.as_str());
        }
        catalog.sheets.push(grid.name.clone());
    }

    catalog.layout = if layouts_used.is_empty() {
        layout.as_str().to_string()
    } else {
        layouts_used.join("+")
    };

    Ok(catalog)
}

fn accumulate_stats(total: &mut ScanStats, sheet: &ScanStats) {
    total.rows_scanned += sheet.rows_scanned;
    total.headers_accepted += sheet.headers_accepted;
    total.headers_rejected += sheet.headers_rejected;
    total.category_switches += sheet.category_switches;
    total.resources_read += sheet.resources_read;
    total.blocks_closed += sheet.blocks_closed;
}
