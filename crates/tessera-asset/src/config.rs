//! Layered catalog configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `TESSERA_ASSETS_DIR`, `TESSERA_ENGINE_ASSETS_DIR`,
//!    `TESSERA_MISSING_ASSET_POLICY`
//! 2. Project-local: `.tessera/config.toml`
//! 3. Global: `~/.tessera/config.toml`

use crate::record::AssetLocation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::{Result, TesseraError};

/// What a lookup does when nothing matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAssetPolicy {
    /// Fail with `NotFound`
    Strict,
    /// Hand back the kind's default resource and log a warning
    #[default]
    #[serde(rename = "default")]
    UseDefault,
}

impl MissingAssetPolicy {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "default" => Ok(Self::UseDefault),
            other => Err(TesseraError::ConfigError(format!(
                "unknown missing asset policy '{}' (expected strict or default)",
                other
            ))),
        }
    }
}

/// `[paths]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PathsSection {
    #[serde(default)]
    assets: Option<PathBuf>,
    #[serde(default)]
    engine_assets: Option<PathBuf>,
    #[serde(default)]
    cache: Option<String>,
}

/// `[catalog]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogSection {
    #[serde(default)]
    missing_asset_policy: Option<MissingAssetPolicy>,
    #[serde(default)]
    cache_on_import: Option<bool>,
}

/// Config file structure; every field is optional so files can be layered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogConfigFile {
    #[serde(default)]
    paths: PathsSection,
    #[serde(default)]
    catalog: CatalogSection,
}

/// Resolved configuration with every layer applied
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub assets_dir: PathBuf,
    pub engine_assets_dir: PathBuf,
    /// Name of the cache directory inside `assets_dir`
    pub cache_dir_name: String,
    pub missing_asset_policy: MissingAssetPolicy,
    /// Whether imports write a cache file immediately
    pub cache_on_import: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            engine_assets_dir: PathBuf::from("engine").join("assets"),
            cache_dir_name: "Cache".to_string(),
            missing_asset_policy: MissingAssetPolicy::default(),
            cache_on_import: true,
        }
    }
}

impl CatalogConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.apply_file(Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".tessera").join("config.toml");
        if local_path.exists() {
            config.apply_file(Self::load_file(&local_path)?);
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load config from a specific file path only (plus env overrides)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(Self::load_file(path)?);
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults with both asset roots placed under `root`
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            assets_dir: root.join("assets"),
            engine_assets_dir: root.join("engine"),
            ..Self::default()
        }
    }

    pub fn with_missing_asset_policy(mut self, policy: MissingAssetPolicy) -> Self {
        self.missing_asset_policy = policy;
        self
    }

    /// Directory holding the binary cache files
    pub fn cache_dir(&self) -> PathBuf {
        self.assets_dir.join(&self.cache_dir_name)
    }

    /// Root that relative paths for `location` are resolved against
    pub fn root_for(&self, location: AssetLocation) -> &Path {
        match location {
            AssetLocation::Application => &self.assets_dir,
            AssetLocation::Engine => &self.engine_assets_dir,
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tessera").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<CatalogConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            TesseraError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn apply_file(&mut self, file: CatalogConfigFile) {
        if let Some(assets) = file.paths.assets {
            self.assets_dir = assets;
        }
        if let Some(engine) = file.paths.engine_assets {
            self.engine_assets_dir = engine;
        }
        if let Some(cache) = file.paths.cache {
            self.cache_dir_name = cache;
        }
        if let Some(policy) = file.catalog.missing_asset_policy {
            self.missing_asset_policy = policy;
        }
        if let Some(cache_on_import) = file.catalog.cache_on_import {
            self.cache_on_import = cache_on_import;
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = std::env::var("TESSERA_ASSETS_DIR") {
            self.assets_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TESSERA_ENGINE_ASSETS_DIR") {
            self.engine_assets_dir = PathBuf::from(dir);
        }
        if let Ok(policy) = std::env::var("TESSERA_MISSING_ASSET_POLICY") {
            self.missing_asset_policy = MissingAssetPolicy::parse(&policy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tessera_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let config_str = r#"
[paths]
assets = "game/assets"
cache = "Baked"

[catalog]
missing_asset_policy = "strict"
cache_on_import = false
"#;
        let path = temp_config(config_str);
        let config = CatalogConfig::load_from_file(&path).unwrap();

        assert_eq!(config.assets_dir, PathBuf::from("game/assets"));
        assert_eq!(config.cache_dir(), PathBuf::from("game/assets").join("Baked"));
        assert_eq!(config.missing_asset_policy, MissingAssetPolicy::Strict);
        assert!(!config.cache_on_import);

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let path = temp_config("");
        let config = CatalogConfig::load_from_file(&path).unwrap();
        assert_eq!(config.cache_dir_name, "Cache");
        assert!(config.cache_on_import);

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_env_var_override() {
        let path = temp_config("[paths]\nengine_assets = \"from/file\"\n");

        std::env::set_var("TESSERA_ENGINE_ASSETS_DIR", "from/env");
        let config = CatalogConfig::load_from_file(&path).unwrap();
        std::env::remove_var("TESSERA_ENGINE_ASSETS_DIR");

        assert_eq!(config.engine_assets_dir, PathBuf::from("from/env"));
        assert_eq!(config.root_for(AssetLocation::Engine), Path::new("from/env"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_malformed_file() {
        let path = temp_config("[catalog]\nmissing_asset_policy = \"sometimes\"\n");
        assert!(matches!(
            CatalogConfig::load_from_file(&path),
            Err(TesseraError::ConfigError(_))
        ));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(MissingAssetPolicy::parse("STRICT").unwrap(), MissingAssetPolicy::Strict);
        assert_eq!(MissingAssetPolicy::parse("default").unwrap(), MissingAssetPolicy::UseDefault);
        assert!(MissingAssetPolicy::parse("loose").is_err());
    }
}
