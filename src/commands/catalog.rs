use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use super::load_catalog;
use crate::ahsp::format_coefficient;
use crate::cli::CatalogArgs;
use crate::model::{Category, WorkItem};
use crate::util::write_json_stdout;

pub fn run(args: CatalogArgs) -> Result<()> {
    let loaded = load_catalog(&args.source)?;
    info!(origin = %loaded.origin, items = loaded.catalog.len(), "catalog loaded");

    if let Some(code) = &args.code {
        let item = loaded.catalog.get(code)?;
        if args.json {
            return write_json_stdout(item);
        }

        let mut output = io::BufWriter::new(io::stdout().lock());
        write_item_text(&mut output, item)?;
        output.flush()?;
        return Ok(());
    }

    if args.json {
        return write_json_stdout(&loaded.catalog.items());
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    write_listing_text(&mut output, loaded.catalog.items())?;
    output.flush()?;
    Ok(())
}

pub fn write_listing_text<W: Write>(output: &mut W, items: &[WorkItem]) -> Result<()> {
    writeln!(output, "Work items: {}", items.len())?;
    for item in items {
        writeln!(
            output,
            "{}\t{}\t{}\tL{}/M{}/E{}",
            item.code,
            item.unit,
            item.description,
            item.resources.labor.len(),
            item.resources.material.len(),
            item.resources.equipment.len(),
        )?;
    }
    Ok(())
}

pub fn write_item_text<W: Write>(output: &mut W, item: &WorkItem) -> Result<()> {
    writeln!(output, "{} {} [{}]", item.code, item.description, item.unit)?;

    for category in Category::ALL {
        let resources = item.resources.get(category);
        writeln!(output, "  {category}:")?;
        if resources.is_empty() {
            writeln!(output, "    -")?;
            continue;
        }
        for entry in resources.iter() {
            writeln!(
                output,
                "    {}\t{}",
                entry.name,
                format_coefficient(entry.coefficient)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Preset;
    use crate::presets::preset_catalog;

    #[test]
    fn item_text_lists_every_category() {
        let items = preset_catalog(Preset::CiptaKarya);
        let mut buffer = Vec::new();
        write_item_text(&mut buffer, &items[1]).expect("render");

        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with("A.4.1.1 Beton Mutu fc = 19.3 MPa (K-225) [m3]"));
        assert!(text.contains("    Semen PC\t371\n"));
        assert!(text.contains("    Concrete Mixer\t0,25\n"));
    }

    #[test]
    fn listing_text_counts_resources_per_category() {
        let items = preset_catalog(Preset::Sda);
        let mut buffer = Vec::new();
        write_listing_text(&mut buffer, &items).expect("render");

        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with("Work items: 3\n"));
        assert!(text.contains("T.01\tm3\tGalian Tanah Biasa (Manual)\tL2/M0/E0\n"));
    }
}
