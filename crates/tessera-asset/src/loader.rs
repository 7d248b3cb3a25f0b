//! Loader strategies and the per-kind sub-catalog that owns their resources

use crate::cache;
use crate::kind::ResourceKind;
use crate::record::{AssetLocation, CatalogEntry, LoadStatus, SourceStamp};
use crate::resource::{AssetHeader, Resource};
use slotmap::SlotMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tessera_core::{ByteBuffer, ContentId, Result, TesseraError};

slotmap::new_key_type! {
    /// Arena slot of a resource inside its loader (index + generation)
    pub struct AssetKey;
}

/// Per-type logic for reading, defaulting and saving one resource kind.
///
/// Strategies are stateless; the [`Loader`] wrapping each one owns the
/// resources and the name/identity indices for its kind.
pub trait LoaderStrategy {
    /// The resource kind this strategy produces
    fn kind(&self) -> ResourceKind;

    /// Human-readable loader name, recorded on catalog entries
    fn name(&self) -> &'static str;

    /// Lowercase source file extensions (without the dot) this strategy claims
    fn accepted_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a new, unregistered resource.
    ///
    /// Fails with `IoError` when the file cannot be read and `ParseError`
    /// when its content is malformed. The catalog assigns the header.
    fn load_from_file(&self, path: &Path) -> Result<Box<dyn Resource>>;

    /// Build the canonical default instance of this kind
    fn default_resource(&self) -> Box<dyn Resource>;

    /// Serialize a resource to the path recorded in its header
    fn save(
        &self,
        resource: &dyn Resource,
        location: AssetLocation,
        source: Option<&SourceStamp>,
    ) -> Result<()> {
        cache::write_cache_file(resource, location, source)
    }

    /// Rebuild a resource payload from a cache buffer positioned after the frame
    fn read_cached(&self, buffer: &mut ByteBuffer) -> Result<Box<dyn Resource>> {
        let mut resource = self.default_resource();
        resource.deserialize_data(buffer)?;
        Ok(resource)
    }

    /// Whether the path's extension is one this strategy claims
    fn accepts(&self, path: &Path) -> bool {
        extension_of(path)
            .map(|ext| self.accepted_extensions().iter().any(|e| *e == ext))
            .unwrap_or(false)
    }
}

/// Lowercased extension of a path
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub(crate) struct Slot {
    pub(crate) entry: CatalogEntry,
    pub(crate) resource: Box<dyn Resource>,
}

/// A registered strategy together with the sub-catalog of its kind.
///
/// The default instance lives in the arena like any other resource and is
/// indexed by identity but not by name.
pub struct Loader {
    strategy: Box<dyn LoaderStrategy>,
    slots: SlotMap<AssetKey, Slot>,
    by_name: HashMap<String, AssetKey>,
    by_id: HashMap<ContentId, AssetKey>,
    default_key: AssetKey,
}

impl Loader {
    /// Wrap a strategy, building and caching its default resource
    pub(crate) fn new(strategy: Box<dyn LoaderStrategy>) -> Self {
        let kind = strategy.kind();
        let mut resource = strategy.default_resource();
        *resource.header_mut() = AssetHeader::default_for(kind);

        let header = resource.header();
        let entry = CatalogEntry {
            id: header.id(),
            name: header.name().to_string(),
            display_name: header.name().to_string(),
            path: PathBuf::new(),
            status: LoadStatus::Loaded,
            kind,
            loader: strategy.name(),
            location: AssetLocation::Engine,
            source: None,
            is_default: true,
        };
        let id = entry.id;

        let mut slots = SlotMap::with_key();
        let default_key = slots.insert(Slot { entry, resource });
        let mut by_id = HashMap::new();
        by_id.insert(id, default_key);

        Self {
            strategy,
            slots,
            by_name: HashMap::new(),
            by_id,
            default_key,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.strategy.kind()
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn strategy(&self) -> &dyn LoaderStrategy {
        self.strategy.as_ref()
    }

    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        self.strategy.accepted_extensions()
    }

    pub fn default_key(&self) -> AssetKey {
        self.default_key
    }

    pub fn default_id(&self) -> ContentId {
        self.slots[self.default_key].entry.id
    }

    /// Number of registered resources, not counting the default
    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: AssetKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn entry(&self, key: AssetKey) -> Option<&CatalogEntry> {
        self.slots.get(key).map(|s| &s.entry)
    }

    pub fn resource(&self, key: AssetKey) -> Option<&dyn Resource> {
        self.slots.get(key).map(|s| s.resource.as_ref())
    }

    pub(crate) fn resource_mut(&mut self, key: AssetKey) -> Option<&mut dyn Resource> {
        match self.slots.get_mut(key) {
            Some(slot) => Some(slot.resource.as_mut()),
            None => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, key: AssetKey) -> Option<&mut Slot> {
        self.slots.get_mut(key)
    }

    pub fn key_by_name(&self, name: &str) -> Option<AssetKey> {
        self.by_name.get(name).copied()
    }

    pub fn key_by_id(&self, id: &ContentId) -> Option<AssetKey> {
        self.by_id.get(id).copied()
    }

    /// Find a resource by its recorded path or the source it was imported from
    pub fn key_by_path(&self, path: &Path) -> Option<AssetKey> {
        self.slots
            .iter()
            .find(|(_, s)| {
                (!s.entry.path.as_os_str().is_empty() && s.entry.path == path)
                    || s.entry.source.as_ref().map(|src| src.path.as_path()) == Some(path)
            })
            .map(|(k, _)| k)
    }

    /// Registered entries, excluding the default
    pub fn entries(&self) -> impl Iterator<Item = (AssetKey, &CatalogEntry)> {
        self.slots
            .iter()
            .filter(|(_, s)| !s.entry.is_default)
            .map(|(k, s)| (k, &s.entry))
    }

    /// Pick the first name of the form `base`, `base1`, `base2`, ... that is
    /// free both in this kind's namespace and as a cache file under `dir`
    pub(crate) fn unique_name(&self, base: &str, dir: &Path) -> (String, PathBuf) {
        let ext = self.kind().cache_extension();
        let mut index = 0u32;
        let mut name = base.to_string();

        loop {
            let path = dir.join(format!("{}.{}", name, ext));
            let taken = self.by_name.contains_key(&name)
                || path.exists()
                || self.slots.values().any(|s| s.entry.path == path);
            if !taken {
                return (name, path);
            }
            index += 1;
            name = format!("{}{}", base, index);
        }
    }

    /// Copy the default resource under a fresh identity and a unique name in `dir`.
    ///
    /// Returns `Incomplete`: the new resource exists only in memory until saved.
    pub(crate) fn construct(&mut self, name: &str, dir: &Path) -> Result<(AssetKey, LoadStatus)> {
        let kind = self.kind();
        let base = if name.is_empty() {
            kind.default_prefix()
        } else {
            name.to_string()
        };
        let (used_name, path) = self.unique_name(&base, dir);

        let mut resource = self.slots[self.default_key].resource.clone_boxed();
        *resource.header_mut() = AssetHeader::registered(kind, used_name.clone(), path.clone());

        let entry = CatalogEntry {
            id: resource.header().id(),
            name: used_name.clone(),
            display_name: used_name,
            path,
            status: LoadStatus::Incomplete,
            kind,
            loader: self.name(),
            location: AssetLocation::Application,
            source: None,
            is_default: false,
        };

        let key = self.insert(resource, entry)?;
        Ok((key, LoadStatus::Incomplete))
    }

    /// Add a resource and its entry to the indices
    pub(crate) fn insert(
        &mut self,
        resource: Box<dyn Resource>,
        entry: CatalogEntry,
    ) -> Result<AssetKey> {
        if self.by_id.contains_key(&entry.id) {
            return Err(TesseraError::AlreadyExists(format!(
                "{} with id {}",
                entry.kind, entry.id
            )));
        }
        if self.by_name.contains_key(&entry.name) {
            return Err(TesseraError::AlreadyExists(format!(
                "{} named '{}'",
                entry.kind, entry.name
            )));
        }

        let id = entry.id;
        let name = entry.name.clone();
        let key = self.slots.insert(Slot { entry, resource });
        self.by_id.insert(id, key);
        self.by_name.insert(name, key);
        Ok(key)
    }

    /// Drop a resource from the arena and indices
    pub(crate) fn remove(&mut self, key: AssetKey) -> Option<CatalogEntry> {
        if key == self.default_key {
            return None;
        }
        let slot = self.slots.remove(key)?;
        self.by_id.remove(&slot.entry.id);
        self.by_name.remove(&slot.entry.name);
        Some(slot.entry)
    }

    /// Move a resource to a new name and path, re-indexing the name map
    pub(crate) fn rename(&mut self, key: AssetKey, name: String, path: PathBuf) -> Result<()> {
        let current = match self.slots.get(key) {
            Some(slot) => slot.entry.name.clone(),
            None => return Err(TesseraError::NotFound(format!("{} slot", self.kind()))),
        };

        if name != current {
            if self.by_name.contains_key(&name) {
                return Err(TesseraError::AlreadyExists(format!(
                    "{} named '{}'",
                    self.kind(),
                    name
                )));
            }
            self.by_name.remove(&current);
            self.by_name.insert(name.clone(), key);
        }

        let slot = &mut self.slots[key];
        slot.resource.header_mut().set_name(name.clone());
        slot.resource.header_mut().set_path(path.clone());
        slot.entry.name = name.clone();
        slot.entry.display_name = name;
        slot.entry.path = path;
        Ok(())
    }

    /// Persist a resource through the strategy and mark it `Persisted`
    pub(crate) fn save(&mut self, key: AssetKey) -> Result<()> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| TesseraError::NotFound(format!("{} slot", self.strategy.kind())))?;
        if slot.entry.is_default {
            return Err(TesseraError::InvalidOperation(format!(
                "the default {} is never saved",
                slot.entry.kind
            )));
        }
        self.strategy
            .save(slot.resource.as_ref(), slot.entry.location, slot.entry.source.as_ref())?;
        slot.entry.status = LoadStatus::Persisted;
        log::debug!(
            "Saved {} '{}' to {}",
            slot.entry.kind,
            slot.entry.name,
            slot.entry.path.display()
        );
        Ok(())
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("resources", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Mesh, MeshLoader, ShaderLoader};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tessera_loader_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_is_cached_once() {
        let loader = Loader::new(Box::new(MeshLoader));
        let key = loader.default_key();
        let entry = loader.entry(key).unwrap();
        assert!(entry.is_default);
        assert_eq!(loader.key_by_id(&entry.id), Some(key));
        assert_eq!(loader.key_by_name(&entry.name), None);
        assert!(loader.is_empty());
        assert_eq!(loader.default_key(), key);
    }

    #[test]
    fn test_accepts_case_insensitive() {
        let strategy = ShaderLoader;
        assert!(strategy.accepts(Path::new("lit.FRAG")));
        assert!(strategy.accepts(Path::new("dir/skin.vert")));
        assert!(!strategy.accepts(Path::new("model.obj")));
        assert!(!strategy.accepts(Path::new("no_extension")));
    }

    #[test]
    fn test_construct_copies_default_with_new_identity() {
        let dir = temp_dir();
        let mut loader = Loader::new(Box::new(MeshLoader));

        let (key, status) = loader.construct("", &dir).unwrap();
        assert_eq!(status, LoadStatus::Incomplete);

        let entry = loader.entry(key).unwrap().clone();
        assert_eq!(entry.name, "NewMesh");
        assert_eq!(entry.path, dir.join("NewMesh.tmesh"));
        assert_ne!(entry.id, loader.default_id());

        let mesh = loader.resource(key).unwrap().downcast_ref::<Mesh>().unwrap();
        let default = loader
            .resource(loader.default_key())
            .unwrap()
            .downcast_ref::<Mesh>()
            .unwrap();
        assert_eq!(mesh.vertices, default.vertices);
        assert!(!loader.resource(key).unwrap().header().is_default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unique_name_probes_disk() {
        let dir = temp_dir();
        std::fs::write(dir.join("Rock.tmesh"), b"").unwrap();
        std::fs::write(dir.join("Rock1.tmesh"), b"").unwrap();

        let loader = Loader::new(Box::new(MeshLoader));
        let (name, path) = loader.unique_name("Rock", &dir);
        assert_eq!(name, "Rock2");
        assert_eq!(path, dir.join("Rock2.tmesh"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let dir = temp_dir();
        let mut loader = Loader::new(Box::new(MeshLoader));
        let (key, _) = loader.construct("Crate", &dir).unwrap();
        let entry = loader.entry(key).unwrap().clone();

        let copy = loader.resource(key).unwrap().clone_boxed();
        let mut renamed = entry.clone();
        renamed.name = "Other".into();
        assert!(matches!(
            loader.insert(copy, renamed),
            Err(TesseraError::AlreadyExists(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_remove_and_default_protection() {
        let dir = temp_dir();
        let mut loader = Loader::new(Box::new(MeshLoader));
        let (key, _) = loader.construct("Barrel", &dir).unwrap();
        let id = loader.entry(key).unwrap().id;

        assert!(loader.remove(loader.default_key()).is_none());
        assert!(loader.remove(key).is_some());
        assert!(!loader.contains(key));
        assert_eq!(loader.key_by_id(&id), None);
        assert_eq!(loader.key_by_name("Barrel"), None);

        std::fs::remove_dir_all(&dir).ok();
    }
}
