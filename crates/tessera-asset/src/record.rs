//! Catalog entry records and reference types

use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tessera_core::{ContentHash, ContentId};

/// Lifecycle of a catalog entry.
///
/// `Unregistered -> Loaded -> Incomplete -> Persisted -> Destroyed`. An
/// entry stays `Incomplete` until its first save; the catalog lists those
/// through [`crate::Catalog::unsaved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// Never resolved against the catalog
    Unregistered,
    /// Resident in memory, read from a source file or cache
    Loaded,
    /// Constructed in memory and waiting for its first save
    Incomplete,
    /// Written to its recorded path
    Persisted,
    /// Removed from the catalog
    Destroyed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStatus::Unregistered => "unregistered",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Incomplete => "incomplete",
            LoadStatus::Persisted => "persisted",
            LoadStatus::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// Which asset root a relative path is resolved against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetLocation {
    /// Provided by the application's project
    #[default]
    Application,
    /// Shipped with the engine itself
    Engine,
}

/// Metadata for one registered resource; the searchable index
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: ContentId,
    /// Unique within the entry's resource kind
    pub name: String,
    pub display_name: String,
    /// Where the resource is saved and cached
    pub path: PathBuf,
    pub status: LoadStatus,
    pub kind: ResourceKind,
    /// Name of the loader strategy that owns the resource
    pub loader: &'static str,
    pub location: AssetLocation,
    /// Where the resource was imported from, if it was imported
    pub source: Option<SourceStamp>,
    pub is_default: bool,
}

/// Import provenance: the source file and its fingerprint at import time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    pub path: PathBuf,
    pub hash: ContentHash,
}

/// A reference to a resource, supporting multiple resolution methods
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    /// Reference by name within the resource kind
    ByName(String),
    /// Reference by identity
    ById { id: ContentId },
    /// Reference by recorded or source path
    ByPath { path: PathBuf },
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::ByName(name) => write!(f, "name '{}'", name),
            AssetRef::ById { id } => write!(f, "id {}", id),
            AssetRef::ByPath { path } => write!(f, "path {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_ref_by_name() {
        let val = toml::Value::String("brick_wall".to_string());
        let asset_ref: AssetRef = val.try_into().unwrap();
        assert!(matches!(asset_ref, AssetRef::ByName(name) if name == "brick_wall"));
    }

    #[test]
    fn test_asset_ref_by_id() {
        let id = ContentId::generate();
        let val: AssetRef = toml::from_str(&format!("id = \"{}\"", id)).unwrap();
        assert_eq!(val, AssetRef::ById { id });
    }

    #[test]
    fn test_asset_ref_by_path() {
        let val: AssetRef = toml::from_str(r#"path = "meshes/chair.obj""#).unwrap();
        assert!(matches!(val, AssetRef::ByPath { path } if path == PathBuf::from("meshes/chair.obj")));
    }

    #[test]
    fn test_status_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            status: LoadStatus,
            location: AssetLocation,
        }
        let w: Wrapper = toml::from_str("status = \"incomplete\"\nlocation = \"engine\"").unwrap();
        assert_eq!(w.status, LoadStatus::Incomplete);
        assert_eq!(w.location, AssetLocation::Engine);
        assert_eq!(LoadStatus::Persisted.to_string(), "persisted");
    }
}
