//! `tessera info`

use super::{open_catalog, print_entry};
use anyhow::Result;
use tessera_asset::{CatalogConfig, ResourceKind};

pub fn run(config: CatalogConfig, name: &str, kind: Option<ResourceKind>) -> Result<()> {
    let catalog = open_catalog(config)?;

    let Some(handle) = catalog.lookup(kind, name) else {
        anyhow::bail!("Resource '{}' not found", name);
    };
    if let Some(entry) = catalog.entry(&handle) {
        print_entry(entry);
    }
    Ok(())
}
