use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use super::{default_db_path, load_catalog};
use crate::ahsp::{MarkupRates, format_coefficient, price_work_item};
use crate::cli::{AddArgs, PriceOverride};
use crate::model::{Category, LineItem, PriceResolution, PriceTable};
use crate::sources::load_price_table;
use crate::store::ProjectStore;
use crate::util::{format_rupiah, write_json_stdout};

pub fn run(args: AddArgs) -> Result<()> {
    let loaded = load_catalog(&args.source)?;
    let prices = assemble_prices(&loaded.base_prices, &args.price_files, &args.price_overrides)?;
    info!(origin = %loaded.origin, prices = prices.len(), "pricing session ready");

    let item = loaded.catalog.get(&args.code)?;
    let rates = MarkupRates {
        overhead_pct: args.overhead_pct,
        tax_pct: args.tax_pct,
    };
    let line = price_work_item(item, args.volume, &prices, rates)?;

    for (category, resource) in line.unresolved_resources() {
        warn!(
            code = %line.code,
            category = %category,
            resource,
            "no price found; resource counted at 0"
        );
    }

    if args.json {
        write_json_stdout(&line)?;
    } else {
        let mut output = io::BufWriter::new(io::stdout().lock());
        write_line_text(&mut output, &line)?;
        output.flush()?;
    }

    if args.dry_run {
        info!(code = %line.code, line_total = line.line_total, "add dry-run complete");
        return Ok(());
    }

    let db_path = args
        .db_path
        .unwrap_or_else(|| default_db_path(&args.source.cache_root));
    let mut store = ProjectStore::open(&db_path)?;
    let seq = store.append(&line)?;
    let rollup = store.load_rollup()?;

    info!(
        seq,
        code = %line.code,
        lines = rollup.len(),
        grand_total = rollup.grand_total(),
        "line item added to project"
    );
    Ok(())
}

/// Preset defaults, then price files in order, then single overrides; a
/// later source replaces an earlier price for the same name.
pub fn assemble_prices(
    base: &PriceTable,
    price_files: &[PathBuf],
    overrides: &[PriceOverride],
) -> Result<PriceTable> {
    let mut prices = base.clone();

    for path in price_files {
        let load = load_price_table(path)?;
        prices.extend_from(&load.table);
    }
    for entry in overrides {
        prices.insert(&entry.name, entry.price);
    }

    if prices.is_empty() {
        warn!("price table is empty; every resource will be unresolved");
    }
    Ok(prices)
}

pub fn write_line_text<W: Write>(output: &mut W, line: &LineItem) -> Result<()> {
    writeln!(output, "{} {}", line.code, line.description)?;
    writeln!(
        output,
        "Volume: {} {}",
        format_coefficient(line.volume),
        line.unit
    )?;

    for category in Category::ALL {
        let resources = line.resolved_prices.get(category);
        if resources.is_empty() {
            continue;
        }

        writeln!(output, "  {category}:")?;
        for resource in resources {
            let price = match resource.resolution {
                PriceResolution::Resolved(price) => format_rupiah(price),
                PriceResolution::Unresolved => "UNRESOLVED".to_string(),
            };
            writeln!(
                output,
                "    {}\t{} x {}\t= {}",
                resource.name,
                format_coefficient(resource.coefficient),
                price,
                format_rupiah(resource.cost)
            )?;
        }
        writeln!(
            output,
            "    subtotal\t{}",
            format_rupiah(line.subtotal(category))
        )?;
    }

    writeln!(output, "Direct cost:\t{}", format_rupiah(line.base_direct_cost))?;
    writeln!(
        output,
        "Overhead ({}%):\t{}",
        format_coefficient(line.overhead_pct),
        format_rupiah(line.overhead_amount)
    )?;
    writeln!(output, "Before tax:\t{}", format_rupiah(line.unit_price_pre_tax))?;
    writeln!(
        output,
        "Tax ({}%):\t{}",
        format_coefficient(line.tax_pct),
        format_rupiah(line.tax_amount)
    )?;
    writeln!(output, "Unit price:\t{}", format_rupiah(line.unit_price_final))?;
    writeln!(output, "Line total:\t{}", format_rupiah(line.line_total))?;
    Ok(())
}
