//! CLI command implementations

pub mod import;
pub mod info;
pub mod list;
pub mod new;
pub mod rename;
pub mod scan;

use anyhow::{Context, Result};
use std::path::Path;
use tessera_asset::{Catalog, CatalogConfig, CatalogEntry};

/// Explicit config file if given, layered lookup otherwise
pub fn load_config(path: Option<&Path>) -> Result<CatalogConfig> {
    let config = match path {
        Some(p) => CatalogConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display()))?,
        None => CatalogConfig::load()?,
    };
    Ok(config)
}

/// Catalog with built-in loaders and the cache directory loaded
pub fn open_catalog(config: CatalogConfig) -> Result<Catalog> {
    Ok(Catalog::open(config)?)
}

/// JSON view of an entry, shared by `list` and `info`
pub fn entry_json(entry: &CatalogEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "name": entry.name,
        "kind": entry.kind,
        "status": entry.status,
        "location": entry.location,
        "loader": entry.loader,
        "path": entry.path.display().to_string(),
        "source": entry.source.as_ref().map(|s| s.path.display().to_string()),
        "source_hash": entry.source.as_ref().map(|s| s.hash.to_string()),
    })
}

/// Multi-line human-readable view of an entry
pub fn print_entry(entry: &CatalogEntry) {
    println!("{}: {}", entry.kind.type_name(), entry.name);
    println!("  Id: {}", entry.id);
    println!("  Status: {}", entry.status);
    println!("  Path: {}", entry.path.display());
    println!("  Loader: {}", entry.loader);
    if let Some(source) = &entry.source {
        println!("  Source: {}", source.path.display());
        println!("  Hash: {}", source.hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_asset::Mesh;

    #[test]
    fn test_entry_json_fields() {
        let root = std::env::temp_dir().join(format!("tessera_cli_{}", uuid::Uuid::new_v4()));
        let mut catalog = Catalog::with_builtin_loaders(CatalogConfig::rooted_at(&root)).unwrap();
        let (handle, _) = catalog.construct_asset::<Mesh>("Slab", None).unwrap();

        let value = entry_json(catalog.entry(&handle).unwrap());
        assert_eq!(value["name"], "Slab");
        assert_eq!(value["kind"], "mesh");
        assert_eq!(value["status"], "incomplete");
        assert_eq!(value["id"], handle.id().unwrap().to_string());
        assert!(value["source"].is_null());

        std::fs::remove_dir_all(&root).ok();
    }
}
