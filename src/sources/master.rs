use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ahsp::{ResourceLineParser, format_resource_detail};
use crate::model::{Category, WorkItem};
use crate::util::ensure_parent_directory;

const MASTER_HEADER: [&str; 6] = ["kode", "uraian", "satuan", "tenaga", "bahan", "alat"];
const HEADER_SEARCH_ROWS: usize = 5;

/// Column positions of a flat master catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterColumns {
    pub code: usize,
    pub description: usize,
    pub unit: Option<usize>,
    pub labor: Option<usize>,
    pub material: Option<usize>,
    pub equipment: Option<usize>,
    header_row: usize,
}

impl MasterColumns {
    /// Looks for a header naming at least code, description and one
    /// resource column within the first non-empty rows.
    pub fn detect(rows: &[Vec<String>]) -> Option<Self> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
            .take(HEADER_SEARCH_ROWS)
            .find_map(|(index, row)| Self::from_header_row(index, row))
    }

    fn from_header_row(header_row: usize, row: &[String]) -> Option<Self> {
        let keys: Vec<String> = row.iter().map(|cell| header_key(cell)).collect();
        let find = |names: &[&str]| keys.iter().position(|key| names.contains(&key.as_str()));

        let columns = Self {
            code: find(&["kode", "kode_ahsp"])?,
            description: find(&["uraian", "uraian_pekerjaan"])?,
            unit: find(&["satuan"]),
            labor: find(&["tenaga", "tenaga_detail"]),
            material: find(&["bahan", "bahan_detail"]),
            equipment: find(&["alat", "alat_detail"]),
            header_row,
        };

        if columns.labor.is_none() && columns.material.is_none() && columns.equipment.is_none() {
            return None;
        }
        Some(columns)
    }

    fn category(&self, category: Category) -> Option<usize> {
        match category {
            Category::Labor => self.labor,
            Category::Material => self.material,
            Category::Equipment => self.equipment,
        }
    }
}

fn header_key(cell: &str) -> String {
    cell.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

pub fn read_master_table(
    rows: &[Vec<String>],
    columns: &MasterColumns,
    parser: &ResourceLineParser,
) -> Vec<WorkItem> {
    let mut items = Vec::new();

    for row in rows.iter().skip(columns.header_row + 1) {
        let Some(code) = cell(row, columns.code) else {
            continue;
        };
        let description = cell(row, columns.description).unwrap_or_default();
        let unit = columns.unit.and_then(|index| cell(row, index));

        let mut item = WorkItem::new(code, description, unit);
        for category in Category::ALL {
            if let Some(index) = columns.category(category) {
                *item.resources.get_mut(category) = parser.parse(cell(row, index));
            }
        }

        debug!(
            code = %item.code,
            resources = item.resources.resource_count(),
            "master row read"
        );
        items.push(item);
    }

    items
}

/// Flat catalog CSV: one row per work item, resources as `;`-joined
/// detail strings and `-` for an empty category.
pub fn write_master_csv(path: &Path, items: &[WorkItem]) -> Result<()> {
    ensure_parent_directory(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer
        .write_record(MASTER_HEADER)
        .with_context(|| format!("failed to write header to {}", path.display()))?;

    for item in items {
        writer
            .write_record([
                item.code.as_str(),
                item.description.as_str(),
                item.unit.as_str(),
                &format_resource_detail(&item.resources.labor),
                &format_resource_detail(&item.resources.material),
                &format_resource_detail(&item.resources.equipment),
            ])
            .with_context(|| format!("failed to write row {} to {}", item.code, path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    info!(path = %path.display(), items = items.len(), "wrote master catalog csv");
    Ok(())
}
