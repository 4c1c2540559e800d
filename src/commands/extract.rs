use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::default_catalog_path;
use crate::ahsp::Catalog;
use crate::cli::{ExtractArgs, Layout};
use crate::model::{CATALOG_MANIFEST_VERSION, CatalogManifest};
use crate::sources::{load_catalog_source, write_master_csv};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let manifest = build_manifest(&args.source, args.layout, &args.sheets)?;

    if manifest.items.is_empty() {
        warn!(source = %args.source.display(), "no analysis rows found");
    }

    if args.dry_run {
        info!(
            items = manifest.item_count,
            sheets = manifest.sheets.len(),
            layout = %manifest.layout,
            warnings = manifest.warnings.len(),
            "extract dry-run complete"
        );
        return Ok(());
    }

    let catalog_path = args
        .catalog_path
        .unwrap_or_else(|| default_catalog_path(&args.cache_root));
    write_json_pretty(&catalog_path, &manifest)?;
    info!(path = %catalog_path.display(), "wrote catalog manifest");

    if let Some(master_path) = &args.master_csv {
        write_master_csv(master_path, &manifest.items)?;
    }

    info!(items = manifest.item_count, "extract completed");
    Ok(())
}

pub fn build_manifest(source: &Path, layout: Layout, sheets: &[String]) -> Result<CatalogManifest> {
    if !source.is_file() {
        bail!("source file {} does not exist", source.display());
    }

    let loaded = load_catalog_source(source, layout, sheets)?;
    let (catalog, warnings) = Catalog::from_items(loaded.items);
    for warning in &warnings {
        warn!(warning = %warning, "catalog warning");
    }

    info!(
        items = catalog.len(),
        headers = loaded.stats.headers_accepted,
        rejected_headers = loaded.stats.headers_rejected,
        resources = loaded.stats.resources_read,
        "catalog built"
    );

    let items = catalog.into_items();
    Ok(CatalogManifest {
        manifest_version: CATALOG_MANIFEST_VERSION,
        generated_at: now_utc_string(),
        source_path: source.display().to_string(),
        source_sha256: sha256_file(source)?,
        layout: loaded.layout,
        sheets: loaded.sheets,
        item_count: items.len(),
        warnings,
        items,
    })
}
