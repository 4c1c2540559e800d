pub mod add;
pub mod advise;
pub mod boq;
pub mod catalog;
pub mod extract;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, warn};

use crate::ahsp::Catalog;
use crate::cli::CatalogSourceArgs;
use crate::model::{CATALOG_MANIFEST_VERSION, CatalogManifest, PriceTable};
use crate::presets::{preset_catalog, preset_prices};
use crate::util::read_json;

pub fn default_catalog_path(cache_root: &Path) -> PathBuf {
    cache_root.join("catalog.json")
}

pub fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("project.sqlite")
}

/// A catalog ready for pricing, plus the prices its source ships with.
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub base_prices: PriceTable,
    pub origin: String,
}

pub fn load_catalog(source: &CatalogSourceArgs) -> Result<LoadedCatalog> {
    if let Some(preset) = source.preset {
        let (catalog, _) = Catalog::from_items(preset_catalog(preset));
        debug!(preset = preset.as_str(), items = catalog.len(), "loaded preset catalog");
        return Ok(LoadedCatalog {
            catalog,
            base_prices: preset_prices(preset),
            origin: format!("preset:{}", preset.as_str()),
        });
    }

    let path = source
        .catalog_path
        .clone()
        .unwrap_or_else(|| default_catalog_path(&source.cache_root));
    if !path.exists() {
        bail!(
            "catalog {} not found; run `ahsp extract --source <file>` first or pass --preset",
            path.display()
        );
    }

    let manifest = read_catalog_manifest(&path)?;
    let (catalog, warnings) = Catalog::from_items(manifest.items);
    for warning in &warnings {
        warn!(warning = %warning, "catalog file carries a duplicate code");
    }
    if catalog.is_empty() {
        warn!(path = %path.display(), "catalog is empty: no analysis rows found");
    }

    Ok(LoadedCatalog {
        catalog,
        base_prices: PriceTable::new(),
        origin: path.display().to_string(),
    })
}

pub fn read_catalog_manifest(path: &Path) -> Result<CatalogManifest> {
    let manifest: CatalogManifest = read_json(path)?;
    if manifest.manifest_version != CATALOG_MANIFEST_VERSION {
        bail!(
            "catalog {} has manifest version {}, expected {}; re-run extract",
            path.display(),
            manifest.manifest_version,
            CATALOG_MANIFEST_VERSION
        );
    }
    Ok(manifest)
}
