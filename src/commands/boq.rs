use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::default_db_path;
use crate::ahsp::{ProjectRollup, format_coefficient};
use crate::cli::BoqArgs;
use crate::model::{LineItem, RollupTotals};
use crate::store::ProjectStore;
use crate::util::{ensure_parent_directory, format_rupiah, write_json_stdout};

const EXPORT_HEADER: [&str; 10] = [
    "no",
    "code",
    "description",
    "unit",
    "volume",
    "labor",
    "material",
    "equipment",
    "unit_price",
    "line_total",
];

#[derive(Debug, Serialize)]
struct BoqReport<'a> {
    line_items: &'a [LineItem],
    totals: RollupTotals,
    unresolved_resources: usize,
}

pub fn run(args: BoqArgs) -> Result<()> {
    let db_path = args
        .db_path
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let mut store = ProjectStore::open(&db_path)?;

    let mut rollup = store.load_rollup()?;
    if args.reset {
        let cleared_total = rollup.grand_total();
        let removed = store.clear()?;
        rollup.clear();
        info!(path = %db_path.display(), removed, cleared_total, "project cleared");
    } else if rollup.is_empty() {
        warn!(path = %db_path.display(), "project has no line items");
    }
    if rollup.unresolved_count() > 0 {
        warn!(
            unresolved = rollup.unresolved_count(),
            "some resources had no price and were counted at 0"
        );
    }

    if let Some(export_path) = &args.export_csv {
        export_csv(export_path, &rollup)?;
    }

    if args.json {
        return write_json_stdout(&BoqReport {
            line_items: rollup.line_items(),
            totals: rollup.totals(),
            unresolved_resources: rollup.unresolved_count(),
        });
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_boq_text(&mut output, &rollup)?;
    output.flush()?;
    Ok(())
}

pub fn write_boq_text<W: Write>(output: &mut W, rollup: &ProjectRollup) -> Result<()> {
    writeln!(output, "Line items: {}", rollup.len())?;
    for (index, line) in rollup.line_items().iter().enumerate() {
        let flag = if line.unresolved_resources().is_empty() {
            ""
        } else {
            "\t(unresolved prices)"
        };
        writeln!(
            output,
            "{}.\t{}\t{}\t{} {}\t@ {}\t= {}{}",
            index + 1,
            line.code,
            line.description,
            format_coefficient(line.volume),
            line.unit,
            format_rupiah(line.unit_price_final),
            format_rupiah(line.line_total),
            flag
        )?;
    }

    let totals = rollup.totals();
    writeln!(output, "Labor:\t{}", format_rupiah(totals.labor))?;
    writeln!(output, "Material:\t{}", format_rupiah(totals.material))?;
    writeln!(output, "Equipment:\t{}", format_rupiah(totals.equipment))?;
    writeln!(output, "Direct cost:\t{}", format_rupiah(totals.direct_cost))?;
    writeln!(output, "Overhead:\t{}", format_rupiah(totals.overhead))?;
    writeln!(output, "Tax:\t{}", format_rupiah(totals.tax))?;
    writeln!(output, "Grand total:\t{}", format_rupiah(totals.grand_total))?;
    Ok(())
}

/// One row per line item with per-unit category subtotals, then labelled
/// project totals in the description and line-total columns.
pub fn export_csv(path: &Path, rollup: &ProjectRollup) -> Result<()> {
    ensure_parent_directory(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(EXPORT_HEADER)?;

    for (index, line) in rollup.line_items().iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            line.code.clone(),
            line.description.clone(),
            line.unit.clone(),
            amount(line.volume),
            amount(line.subtotal_labor),
            amount(line.subtotal_material),
            amount(line.subtotal_equipment),
            amount(line.unit_price_final),
            amount(line.line_total),
        ])?;
    }

    let totals = rollup.totals();
    for (label, value) in [
        ("Total labor", totals.labor),
        ("Total material", totals.material),
        ("Total equipment", totals.equipment),
        ("Direct cost", totals.direct_cost),
        ("Overhead", totals.overhead),
        ("Tax", totals.tax),
        ("Grand total", totals.grand_total),
    ] {
        let mut record = vec![String::new(); EXPORT_HEADER.len()];
        record[2] = label.to_string();
        record[EXPORT_HEADER.len() - 1] = amount(value);
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    info!(path = %path.display(), lines = rollup.len(), "exported bill of quantities");
    Ok(())
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}
