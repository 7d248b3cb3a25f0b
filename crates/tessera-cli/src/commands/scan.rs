//! `tessera scan`

use anyhow::Result;
use tessera_asset::{Catalog, CatalogConfig};

pub fn run(config: CatalogConfig) -> Result<()> {
    let mut catalog = Catalog::with_builtin_loaders(config)?;
    let scan = catalog.load_cache()?;

    for root in catalog.scan_roots() {
        println!("Scanned {}", root.display());
    }
    println!("  Loaded: {}", scan.loaded.len());
    for path in &scan.loaded {
        println!("    {}", path.display());
    }
    if !scan.skipped.is_empty() {
        println!("  Skipped: {}", scan.skipped.len());
        for (path, reason) in &scan.skipped {
            println!("    {} ({})", path.display(), reason);
        }
    }
    Ok(())
}
