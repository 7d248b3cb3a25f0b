//! `tessera list`

use super::{entry_json, open_catalog};
use anyhow::Result;
use tessera_asset::{CatalogConfig, CatalogEntry, ResourceKind};

pub fn run(config: CatalogConfig, kind: Option<ResourceKind>, format: &str) -> Result<()> {
    let catalog = open_catalog(config)?;
    let entries: Vec<&CatalogEntry> = match kind {
        Some(k) => catalog.records_of(k),
        None => catalog.all_records(),
    };

    if format == "json" {
        let items: Vec<serde_json::Value> = entries.iter().map(|e| entry_json(e)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No resources in {}", catalog.config().cache_dir().display());
        return Ok(());
    }

    println!("{} resource(s):\n", entries.len());
    for entry in &entries {
        println!(
            "  {:<8} {:<24} {:<10} {}",
            entry.kind.to_string(),
            entry.name,
            entry.status.to_string(),
            entry.id
        );
    }
    Ok(())
}
