//! `tessera rename`

use super::{open_catalog, print_entry};
use anyhow::{Context, Result};
use std::path::Path;
use tessera_asset::{CatalogConfig, ResourceKind};

pub fn run(config: CatalogConfig, kind: ResourceKind, name: &str, new_path: &Path) -> Result<()> {
    let mut catalog = open_catalog(config)?;

    let Some(handle) = catalog.lookup(Some(kind), name) else {
        anyhow::bail!("{} '{}' not found", kind, name);
    };
    catalog
        .rename(&handle, new_path)
        .with_context(|| format!("Failed to rename {} '{}'", kind, name))?;

    if let Some(entry) = catalog.entry(&handle) {
        println!("Renamed:");
        print_entry(entry);
    }
    Ok(())
}
