//! `tessera new`

use super::{open_catalog, print_entry};
use anyhow::Result;
use std::path::Path;
use tessera_asset::{Asset, Catalog, CatalogConfig, Material, Mesh, ResourceKind, Shader, Texture};

pub fn run(
    config: CatalogConfig,
    kind: ResourceKind,
    name: Option<&str>,
    dir: Option<&Path>,
) -> Result<()> {
    let mut catalog = open_catalog(config)?;
    let name = name.unwrap_or("");

    match kind {
        ResourceKind::Mesh => create::<Mesh>(&mut catalog, name, dir),
        ResourceKind::Texture => create::<Texture>(&mut catalog, name, dir),
        ResourceKind::Material => create::<Material>(&mut catalog, name, dir),
        ResourceKind::Shader => create::<Shader>(&mut catalog, name, dir),
    }
}

fn create<T: Asset>(
    catalog: &mut Catalog,
    name: &str,
    dir: Option<&Path>,
) -> Result<()> {
    let (handle, _) = catalog.construct_asset::<T>(name, dir)?;
    catalog.save_asset(&handle)?;

    if let Some(entry) = catalog.entry(&handle) {
        println!("Created:");
        print_entry(entry);
    }
    Ok(())
}
