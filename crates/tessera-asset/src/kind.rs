//! Resource type tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tessera_core::TesseraError;

/// The concrete resource types the catalog can manage.
///
/// Each kind owns one loader, one name namespace and one cache file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Mesh,
    Texture,
    Material,
    Shader,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Mesh,
        ResourceKind::Texture,
        ResourceKind::Material,
        ResourceKind::Shader,
    ];

    /// Type name written into cache files, e.g. `Mesh`
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "Mesh",
            ResourceKind::Texture => "Texture",
            ResourceKind::Material => "Material",
            ResourceKind::Shader => "Shader",
        }
    }

    /// Base name for resources constructed without an explicit name
    pub fn default_prefix(&self) -> String {
        format!("New{}", self.type_name())
    }

    /// Extension (without the dot) of this kind's cache files
    pub fn cache_extension(&self) -> &'static str {
        match self {
            ResourceKind::Mesh => "tmesh",
            ResourceKind::Texture => "ttex",
            ResourceKind::Material => "tmat",
            ResourceKind::Shader => "tshader",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    pub fn from_cache_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.cache_extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ResourceKind {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.type_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                TesseraError::NotFound(format!(
                    "unknown resource type '{}' (expected mesh, texture, material or shader)",
                    s
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_extensions_unique() {
        for a in ResourceKind::ALL {
            for b in ResourceKind::ALL {
                if a != b {
                    assert_ne!(a.cache_extension(), b.cache_extension());
                    assert_ne!(a.type_name(), b.type_name());
                }
            }
        }
    }

    #[test]
    fn test_lookups() {
        assert_eq!(ResourceKind::from_type_name("Texture"), Some(ResourceKind::Texture));
        assert_eq!(ResourceKind::from_type_name("texture"), None);
        assert_eq!(ResourceKind::from_cache_extension("TMAT"), Some(ResourceKind::Material));
        assert_eq!("shader".parse::<ResourceKind>().unwrap(), ResourceKind::Shader);
        assert!("font".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::Mesh.default_prefix(), "NewMesh");
    }
}
