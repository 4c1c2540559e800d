use anyhow::Result;
use tracing::{info, warn};

use super::{default_catalog_path, default_db_path, read_catalog_manifest};
use crate::cli::StatusArgs;
use crate::model::Category;
use crate::store::ProjectStore;

pub fn run(args: StatusArgs) -> Result<()> {
    let catalog_path = args
        .catalog_path
        .unwrap_or_else(|| default_catalog_path(&args.cache_root));
    let db_path = args
        .db_path
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if catalog_path.exists() {
        let manifest = read_catalog_manifest(&catalog_path)?;
        info!(
            generated_at = %manifest.generated_at,
            source = %manifest.source_path,
            source_sha256 = %manifest.source_sha256,
            layout = %manifest.layout,
            sheets = %manifest.sheets.join(","),
            items = manifest.item_count,
            warnings = manifest.warnings.len(),
            "loaded catalog manifest"
        );
        for warning in &manifest.warnings {
            warn!(warning = %warning, "catalog warning");
        }
    } else {
        warn!(path = %catalog_path.display(), "catalog manifest missing");
    }

    if db_path.exists() {
        let store = ProjectStore::open(&db_path)?;
        let rollup = store.load_rollup()?;
        info!(
            path = %db_path.display(),
            lines = store.line_count()?,
            updated_at = %store.metadata("project_updated_at")?.unwrap_or_default(),
            schema_version = %store.metadata("store_schema_version")?.unwrap_or_default(),
            labor = rollup.category_total(Category::Labor),
            material = rollup.category_total(Category::Material),
            equipment = rollup.category_total(Category::Equipment),
            grand_total = rollup.grand_total(),
            unresolved = rollup.unresolved_count(),
            "project status"
        );
    } else {
        warn!(path = %db_path.display(), "project database missing");
    }

    Ok(())
}
