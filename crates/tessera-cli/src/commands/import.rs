//! `tessera import`

use super::{open_catalog, print_entry};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tessera_asset::{AddOptions, AssetLocation, CatalogConfig};

pub struct ImportArgs {
    pub path: PathBuf,
    pub engine: bool,
    pub no_cache: bool,
}

pub fn run(config: CatalogConfig, args: ImportArgs) -> Result<()> {
    let mut options = AddOptions::from_config(&config);
    if args.no_cache {
        options.cache = false;
    }
    if args.engine {
        options.location = AssetLocation::Engine;
    }

    let mut catalog = open_catalog(config)?;
    let handle = catalog
        .add_to_database(&args.path, &options)
        .with_context(|| format!("Failed to import {}", args.path.display()))?;

    if let Some(entry) = catalog.entry(&handle) {
        print_entry(entry);
    }
    Ok(())
}
