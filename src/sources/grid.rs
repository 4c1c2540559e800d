use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use tracing::{debug, info, warn};

use crate::ahsp::format_coefficient;

const DELIMITER_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;
const NOISE_SHEET_MARKERS: [&str; 3] = ["rekap", "recap", "bbs"];

/// One sheet of raw text cells; CSV sources yield a single grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

enum SourceKind {
    Delimited,
    Workbook,
}

fn source_kind(path: &Path) -> Result<SourceKind> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => Ok(SourceKind::Delimited),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceKind::Workbook),
        other => bail!(
            "unsupported source file type '{}' for {}",
            other,
            path.display()
        ),
    }
}

/// Reads every usable sheet of `path`. With `sheets` empty, workbook sheets
/// named like recap or bar-bending schedules are skipped; otherwise exactly
/// the named sheets are read.
pub fn load_grids(path: &Path, sheets: &[String]) -> Result<Vec<SheetGrid>> {
    match source_kind(path)? {
        SourceKind::Delimited => {
            let rows = read_delimited_grid(path)?;
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("csv")
                .to_string();
            info!(path = %path.display(), rows = rows.len(), "read delimited grid");
            Ok(vec![SheetGrid { name, rows }])
        }
        SourceKind::Workbook => read_workbook_grids(path, sheets),
    }
}

pub fn is_noise_sheet(name: &str) -> bool {
    let lowered = name.to_lowercase();
    NOISE_SHEET_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn read_workbook_grids(path: &Path, sheets: &[String]) -> Result<Vec<SheetGrid>> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        bail!("workbook {} contains no sheets", path.display());
    }

    let selected: Vec<String> = if sheets.is_empty() {
        sheet_names
            .into_iter()
            .filter(|name| {
                let noise = is_noise_sheet(name);
                if noise {
                    debug!(sheet = %name, "skipping recap sheet");
                }
                !noise
            })
            .collect()
    } else {
        let mut selected = Vec::with_capacity(sheets.len());
        for wanted in sheets {
            match sheet_names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(wanted.trim()))
            {
                Some(name) => selected.push(name.clone()),
                None => bail!(
                    "sheet '{}' not found in {} (available: {})",
                    wanted,
                    path.display(),
                    sheet_names.join(", ")
                ),
            }
        }
        selected
    };

    if selected.is_empty() {
        warn!(path = %path.display(), "every sheet was skipped as a recap sheet");
    }

    let mut grids = Vec::with_capacity(selected.len());
    for sheet_name in selected {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("failed to read sheet '{}'", sheet_name))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();

        info!(sheet = %sheet_name, rows = rows.len(), "read workbook sheet");
        grids.push(SheetGrid {
            name: sheet_name,
            rows,
        });
    }

    Ok(grids)
}

/// Text form of a spreadsheet cell. Numbers use a decimal comma so the
/// number normalizer never mistakes `1.047` for a thousands group.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) => format_coefficient(*value),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => String::from(if *value { "TRUE" } else { "FALSE" }),
        Data::Error(err) => format!("#{err:?}"),
        Data::DateTime(value) => format_coefficient(value.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
    }
}

fn read_delimited_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    debug!(delimiter = %(delimiter as char).escape_default(), "sniffed delimiter");
    parse_delimited(&content, delimiter)
        .with_context(|| format!("failed to parse delimited file {}", path.display()))
}

pub(super) fn parse_delimited(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed delimited record")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// UTF-8 first, Windows-1252 for spreadsheet exports that are not.
pub(super) fn read_file_as_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            debug!(path = %path.display(), "decoded as windows-1252");
            Ok(decoded.into_owned())
        }
    }
}

/// Candidate giving the most consistent multi-field split over the first
/// lines wins; wider splits break ties.
pub(super) fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = b',';
    let mut best_score = 0_usize;

    for delimiter in DELIMITER_CANDIDATES {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| field_count(line, delimiter))
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&count| count == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|record| record.ok())
        .map(|record| record.len())
        .unwrap_or(1)
}
