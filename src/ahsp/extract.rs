use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, trace};

use super::numeric::{is_numeric_text, normalize_number};
use crate::model::{Category, WorkItem};

/// Leading cells searched for a work-item code.
pub const HEADER_WINDOW: usize = 5;

const MAX_CODE_LEN: usize = 24;
const MIN_DESCRIPTION_CHARS: usize = 5;
const MIN_RESOURCE_NAME_CHARS: usize = 2;
const MAX_RESOURCE_CODE_CHARS: usize = 8;

const UNIT_VOCABULARY: [&str; 11] = [
    "m", "m2", "m3", "kg", "set", "unit", "ls", "buah", "bh", "titik", "m'",
];
const BARE_UNIT_TOKENS: [&str; 9] = ["oh", "ls", "bh", "set", "unit", "m3", "kg", "sewa", "jam"];

const HEADER_REJECT_MARKERS: [&str; 5] = ["total", "jumlah", "analisa", "analisis", "harga satuan"];
const CATEGORY_REJECT_MARKERS: [&str; 2] = ["total", "jumlah"];
const RESOURCE_STOP_MARKERS: [&str; 4] = ["total", "jumlah", "harga", "biaya"];

const LABOR_WORDS: [&str; 4] = ["tenaga", "upah", "labor", "labour"];
const MATERIAL_WORDS: [&str; 2] = ["bahan", "material"];
const EQUIPMENT_WORDS: [&str; 3] = ["peralatan", "alat", "equipment"];
const CATEGORY_FILLER_WORDS: [&str; 2] = ["kerja", "pekerjaan"];

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub code: String,
    pub description: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderProbe {
    Accepted(HeaderMatch),
    /// Code and description found, but the description marks a summary line.
    Rejected { code: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub rows_scanned: usize,
    pub headers_accepted: usize,
    pub headers_rejected: usize,
    pub category_switches: usize,
    pub resources_read: usize,
    pub blocks_closed: usize,
}

/// Single-pass work-item scanner over a raw cell grid.
pub struct GridScanner {
    code_regex: Regex,
}

#[derive(Default)]
struct ScanState {
    mode: Option<Category>,
    current: Option<WorkItem>,
    items: Vec<WorkItem>,
    stats: ScanStats,
}

impl ScanState {
    fn flush(&mut self) {
        if let Some(item) = self.current.take() {
            debug!(
                code = %item.code,
                resources = item.resources.resource_count(),
                "work item closed"
            );
            self.items.push(item);
        }
    }
}

impl GridScanner {
    pub fn new() -> Result<Self> {
        let code_regex = Regex::new(r"^[A-Za-z0-9]+(?:\.[A-Za-z0-9]+)+\.?$")
            .context("failed to compile work-item code regex")?;
        Ok(Self { code_regex })
    }

    pub fn extract_with_stats(&self, grid: &[Vec<String>]) -> (Vec<WorkItem>, ScanStats) {
        let mut state = ScanState::default();

        for (row_index, row) in grid.iter().enumerate() {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            state.stats.rows_scanned += 1;

            if state.mode.is_none() {
                match self.match_header(row) {
                    Some(HeaderProbe::Accepted(header)) => {
                        state.flush();
                        trace!(row = row_index, code = %header.code, "work item header");
                        state.current = Some(WorkItem::new(
                            &header.code,
                            &header.description,
                            header.unit.as_deref(),
                        ));
                        state.mode = None;
                        state.stats.headers_accepted += 1;
                        continue;
                    }
                    Some(HeaderProbe::Rejected { code }) => {
                        trace!(row = row_index, code = %code, "header rejected by marker");
                        state.stats.headers_rejected += 1;
                    }
                    None => {}
                }
            }

            if state.current.is_none() {
                continue;
            }

            if let Some(category) = self.detect_category(row) {
                state.mode = Some(category);
                state.stats.category_switches += 1;
                continue;
            }

            let Some(mode) = state.mode else {
                continue;
            };

            if closes_resource_block(row) {
                state.mode = None;
                state.stats.blocks_closed += 1;
                continue;
            }

            if let Some((name, coefficient)) = self.match_resource_row(row)
                && let Some(item) = state.current.as_mut()
            {
                item.resources.get_mut(mode).upsert(&name, coefficient);
                state.stats.resources_read += 1;
            }
        }

        state.flush();
        (state.items, state.stats)
    }

    pub fn match_header(&self, row: &[String]) -> Option<HeaderProbe> {
        let code_index = row
            .iter()
            .take(HEADER_WINDOW)
            .position(|cell| self.is_work_item_code(cell))?;
        let description_index = find_description(row, code_index)?;

        let code = row[code_index].trim().trim_end_matches('.').to_string();
        let description = row[description_index].trim().to_string();
        if has_header_reject_marker(&description) {
            return Some(HeaderProbe::Rejected { code });
        }

        let unit = row
            .get(description_index + 1)
            .map(|cell| cell.trim())
            .filter(|cell| is_unit_token(cell))
            .map(ToOwned::to_owned);

        Some(HeaderProbe::Accepted(HeaderMatch {
            code,
            description,
            unit,
        }))
    }

    pub fn is_work_item_code(&self, cell: &str) -> bool {
        let token = cell.trim();
        if token.is_empty() || token.len() >= MAX_CODE_LEN || !self.code_regex.is_match(token) {
            return false;
        }

        // "0.750" is a coefficient, not a code.
        let lead = token.split('.').next().unwrap_or_default();
        !lead.chars().all(|ch| ch == '0')
    }

    pub fn detect_category(&self, row: &[String]) -> Option<Category> {
        let text = row_text(row);
        if CATEGORY_REJECT_MARKERS
            .iter()
            .any(|marker| text.contains(marker))
        {
            return None;
        }

        let words = text
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect::<Vec<&str>>();
        let has_any = |candidates: &[&str]| words.iter().any(|word| candidates.contains(word));

        let category = if has_any(&LABOR_WORDS) {
            Category::Labor
        } else if has_any(&MATERIAL_WORDS) {
            Category::Material
        } else if has_any(&EQUIPMENT_WORDS) {
            Category::Equipment
        } else {
            return None;
        };

        // "Alat Bantu | ls | 1" is an equipment line; "TENAGA | 93.750" is
        // still a marker carrying its block amount.
        if let Some((name, _)) = self.match_resource_row(row)
            && !is_category_label(&name)
        {
            return None;
        }

        Some(category)
    }

    pub fn match_resource_row(&self, row: &[String]) -> Option<(String, f64)> {
        let mut name = None;

        for (index, cell) in row.iter().enumerate() {
            let value = cell.trim();
            if value.is_empty() {
                continue;
            }
            if has_resource_stop_marker(value) {
                return None;
            }
            if self.is_resource_name(value) {
                name = Some((index, value));
                break;
            }
        }

        let (name_index, name) = name?;
        let coefficient = row
            .iter()
            .skip(name_index + 1)
            .map(|cell| cell.trim())
            .filter(|cell| is_numeric_text(cell))
            .map(normalize_number)
            .find(|value| *value > 0.0)?;

        Some((name.to_string(), coefficient))
    }

    fn is_resource_name(&self, value: &str) -> bool {
        if is_numeric_text(value)
            || value.chars().count() <= MIN_RESOURCE_NAME_CHARS
            || is_bare_unit_token(value)
        {
            return false;
        }

        // Resource codes such as "L.01" sit next to the name in some layouts.
        !(value.len() <= MAX_RESOURCE_CODE_CHARS
            && value.chars().any(|ch| ch.is_ascii_digit())
            && self.code_regex.is_match(value))
    }
}

fn find_description(row: &[String], code_index: usize) -> Option<usize> {
    row.iter()
        .enumerate()
        .skip(code_index + 1)
        .find(|(_, cell)| {
            let value = cell.trim();
            value.chars().count() > MIN_DESCRIPTION_CHARS && !is_numeric_text(value)
        })
        .map(|(index, _)| index)
}

fn is_category_label(name: &str) -> bool {
    let folded = name.to_lowercase();
    folded
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .all(|word| {
            LABOR_WORDS.contains(&word)
                || MATERIAL_WORDS.contains(&word)
                || EQUIPMENT_WORDS.contains(&word)
                || CATEGORY_FILLER_WORDS.contains(&word)
        })
}

fn row_text(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

fn has_header_reject_marker(description: &str) -> bool {
    let folded = description.to_lowercase();
    HEADER_REJECT_MARKERS
        .iter()
        .any(|marker| folded.contains(marker))
}

fn has_resource_stop_marker(value: &str) -> bool {
    let folded = value.to_lowercase();
    RESOURCE_STOP_MARKERS
        .iter()
        .any(|marker| folded.contains(marker))
}

/// A "Jumlah Harga Tenaga" style row ends the open resource block so the
/// next work-item header can be recognised.
fn closes_resource_block(row: &[String]) -> bool {
    let text = row_text(row);
    CATEGORY_REJECT_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
}

fn is_unit_token(value: &str) -> bool {
    let folded = value.trim().to_lowercase();
    UNIT_VOCABULARY.contains(&folded.as_str())
}

fn is_bare_unit_token(value: &str) -> bool {
    let folded = value.trim().to_lowercase();
    BARE_UNIT_TOKENS.contains(&folded.as_str())
}
