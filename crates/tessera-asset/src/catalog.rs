//! The catalog: registry of loaders and the resources they own

use crate::cache;
use crate::config::{CatalogConfig, MissingAssetPolicy};
use crate::handle::{AssetHandle, Handle, UntypedHandle};
use crate::kind::ResourceKind;
use crate::loader::{extension_of, AssetKey, Loader, LoaderStrategy};
use crate::record::{AssetLocation, AssetRef, CatalogEntry, LoadStatus, SourceStamp};
use crate::registry::BUILTIN_LOADERS;
use crate::resource::{Asset, AssetHeader, Resource};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_core::{ContentHash, ContentId, Result, TesseraError};

/// Options for [`Catalog::add_to_database`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Write the imported resource into the cache directory
    pub cache: bool,
    /// Resolve relative paths against the root for `location`
    pub relative: bool,
    pub location: AssetLocation,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            cache: true,
            relative: true,
            location: AssetLocation::Application,
        }
    }
}

impl AddOptions {
    /// Defaults, with caching taken from the config
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            cache: config.cache_on_import,
            ..Self::default()
        }
    }
}

/// Outcome of a cache directory scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheScan {
    pub loaded: Vec<PathBuf>,
    /// Files that could not be registered, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Central registry of every known resource.
///
/// Holds one [`Loader`] per resource kind and routes file extensions to
/// them. Identities are unique across the whole catalog, names only within
/// a kind. The catalog is single-threaded: it is neither `Send` nor `Sync`.
pub struct Catalog {
    config: CatalogConfig,
    loaders: Vec<Loader>,
    by_kind: HashMap<ResourceKind, usize>,
    by_extension: HashMap<String, usize>,
    identities: HashMap<ContentId, ResourceKind>,
}

impl Catalog {
    /// An empty catalog with no loaders
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            loaders: Vec::new(),
            by_kind: HashMap::new(),
            by_extension: HashMap::new(),
            identities: HashMap::new(),
        }
    }

    /// A catalog with every built-in loader registered
    pub fn with_builtin_loaders(config: CatalogConfig) -> Result<Self> {
        let mut catalog = Self::new(config);
        for registration in &BUILTIN_LOADERS {
            catalog.register_loader((registration.create_strategy)())?;
        }
        Ok(catalog)
    }

    /// Built-in loaders plus every cache file found under the asset roots
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let mut catalog = Self::with_builtin_loaders(config)?;
        catalog.load_cache()?;
        Ok(catalog)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Register a loader strategy and build its default resource.
    ///
    /// Fails without registering anything when the kind already has a
    /// loader or one of its extensions is already claimed.
    pub fn register_loader(&mut self, strategy: Box<dyn LoaderStrategy>) -> Result<()> {
        let kind = strategy.kind();
        if self.by_kind.contains_key(&kind) {
            return Err(TesseraError::DuplicateLoader(kind.to_string()));
        }
        for ext in strategy.accepted_extensions() {
            if let Some(&owner) = self.by_extension.get(*ext) {
                return Err(TesseraError::ExtensionConflict {
                    extension: ext.to_string(),
                    owner: self.loaders[owner].name().to_string(),
                });
            }
        }

        let loader = Loader::new(strategy);
        let index = self.loaders.len();
        for ext in loader.accepted_extensions() {
            self.by_extension.insert(ext.to_string(), index);
        }
        self.identities.insert(loader.default_id(), kind);
        self.by_kind.insert(kind, index);
        log::info!(
            "Registered {} loader for {} ({})",
            loader.name(),
            kind,
            loader.accepted_extensions().join(", ")
        );
        self.loaders.push(loader);
        Ok(())
    }

    pub fn loader(&self, kind: ResourceKind) -> Option<&Loader> {
        self.by_kind.get(&kind).map(|&i| &self.loaders[i])
    }

    /// Registered loaders, in registration order
    pub fn loaders(&self) -> impl Iterator<Item = &Loader> {
        self.loaders.iter()
    }

    fn loader_mut(&mut self, kind: ResourceKind) -> Option<&mut Loader> {
        let index = *self.by_kind.get(&kind)?;
        self.loaders.get_mut(index)
    }

    fn require_loader(&self, kind: ResourceKind) -> Result<&Loader> {
        self.loader(kind)
            .ok_or_else(|| TesseraError::NotFound(format!("no loader registered for {}", kind)))
    }

    fn require_loader_mut(&mut self, kind: ResourceKind) -> Result<&mut Loader> {
        self.loader_mut(kind)
            .ok_or_else(|| TesseraError::NotFound(format!("no loader registered for {}", kind)))
    }

    /// The loader claiming a path's extension (case-insensitive)
    pub fn get_loader_by_extension(&self, path: &Path) -> Option<&Loader> {
        let ext = extension_of(path)?;
        self.by_extension.get(&ext).map(|&i| &self.loaders[i])
    }

    /// Resolve a reference to an arena key within one kind
    pub fn lookup_key(&self, kind: ResourceKind, reference: &AssetRef) -> Option<AssetKey> {
        let loader = self.loader(kind)?;
        match reference {
            AssetRef::ByName(name) => loader.key_by_name(name),
            AssetRef::ById { id } => loader.key_by_id(id),
            AssetRef::ByPath { path } => loader.key_by_path(path).or_else(|| {
                loader.key_by_path(&self.resolve_path(path, true, AssetLocation::Application))
            }),
        }
    }

    /// Find a registered resource by name, then by identity.
    ///
    /// With no kind given, every loader is searched in registration order.
    pub fn lookup(&self, kind: Option<ResourceKind>, name_or_id: &str) -> Option<UntypedHandle> {
        let id = ContentId::from_string(name_or_id).ok();
        self.loaders
            .iter()
            .filter(|l| kind.map_or(true, |k| l.kind() == k))
            .find_map(|loader| {
                let key = loader
                    .key_by_name(name_or_id)
                    .or_else(|| id.and_then(|id| loader.key_by_id(&id)))?;
                let entry = loader.entry(key)?;
                Some(UntypedHandle::new(loader.kind(), key, entry.id))
            })
    }

    pub(crate) fn resource_mut(
        &mut self,
        kind: ResourceKind,
        key: AssetKey,
    ) -> Option<&mut dyn Resource> {
        self.loader_mut(kind)?.resource_mut(key)
    }

    fn resolve_path(&self, path: &Path, relative: bool, location: AssetLocation) -> PathBuf {
        if relative && path.is_relative() {
            self.config.root_for(location).join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Import a source file through the loader claiming its extension.
    ///
    /// Importing an already registered source is idempotent while the file
    /// is unchanged. When its content hash differs the payload is reloaded
    /// in place, keeping identity, name and path.
    pub fn add_to_database(&mut self, path: &Path, options: &AddOptions) -> Result<UntypedHandle> {
        let source = self.resolve_path(path, options.relative, options.location);
        let kind = self
            .get_loader_by_extension(&source)
            .map(|l| l.kind())
            .ok_or_else(|| {
                TesseraError::NotFound(format!("no loader accepts {}", source.display()))
            })?;
        let hash = ContentHash::from_file(&source)?;

        if let Some(key) = self.require_loader(kind)?.key_by_path(&source) {
            return self.reimport(kind, key, &source, hash, options);
        }

        let cache_dir = self.config.cache_dir();
        let loader = self.require_loader_mut(kind)?;
        let mut resource = loader.strategy().load_from_file(&source)?;

        let base = match source.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => kind.default_prefix(),
        };
        let (name, cache_path) = loader.unique_name(&base, &cache_dir);
        *resource.header_mut() = AssetHeader::registered(kind, name.clone(), cache_path.clone());

        let entry = CatalogEntry {
            id: resource.header().id(),
            name: name.clone(),
            display_name: name.clone(),
            path: cache_path,
            status: LoadStatus::Loaded,
            kind,
            loader: loader.name(),
            location: options.location,
            source: Some(SourceStamp {
                path: source.clone(),
                hash,
            }),
            is_default: false,
        };
        let id = entry.id;
        if self.identities.contains_key(&id) {
            return Err(TesseraError::AlreadyExists(format!("resource with id {}", id)));
        }

        let key = self.require_loader_mut(kind)?.insert(resource, entry)?;
        self.identities.insert(id, kind);

        if options.cache {
            if let Err(e) = self.require_loader_mut(kind)?.save(key) {
                self.forget(kind, key);
                return Err(e);
            }
        }

        log::info!("Imported {} '{}' from {}", kind, name, source.display());
        Ok(UntypedHandle::new(kind, key, id))
    }

    fn reimport(
        &mut self,
        kind: ResourceKind,
        key: AssetKey,
        source: &Path,
        hash: ContentHash,
        options: &AddOptions,
    ) -> Result<UntypedHandle> {
        let loader = self.require_loader_mut(kind)?;
        let not_found = || TesseraError::NotFound(format!("{} slot", kind));

        let unchanged = loader
            .entry(key)
            .ok_or_else(not_found)?
            .source
            .as_ref()
            .map_or(false, |s| s.hash == hash);
        if unchanged {
            let id = loader.entry(key).ok_or_else(not_found)?.id;
            log::debug!("{} already imported and unchanged", source.display());
            return Ok(UntypedHandle::new(kind, key, id));
        }

        let mut fresh = loader.strategy().load_from_file(source)?;
        let slot = loader.slot_mut(key).ok_or_else(not_found)?;
        *fresh.header_mut() = slot.resource.header().clone();
        slot.resource = fresh;
        slot.entry.source = Some(SourceStamp {
            path: source.to_path_buf(),
            hash,
        });
        slot.entry.status = LoadStatus::Loaded;
        let id = slot.entry.id;
        let name = slot.entry.name.clone();

        if options.cache {
            loader.save(key)?;
        }

        log::info!("Re-imported {} '{}' from {}", kind, name, source.display());
        Ok(UntypedHandle::new(kind, key, id))
    }

    /// Copy `T`'s default under a fresh identity and a unique name.
    ///
    /// The new resource is placed in `dir` (relative to the assets root),
    /// or the cache directory when `dir` is `None`. It is not written to
    /// disk: the returned status is `Incomplete` and the caller is expected
    /// to follow up with [`Catalog::save_asset`].
    pub fn construct_asset<T: Asset>(
        &mut self,
        name: &str,
        dir: Option<&Path>,
    ) -> Result<(Handle<T>, LoadStatus)> {
        let dir = match dir {
            Some(d) => self.resolve_path(d, true, AssetLocation::Application),
            None => self.config.cache_dir(),
        };

        let loader = self.require_loader_mut(T::KIND)?;
        let (key, status) = loader.construct(name, &dir)?;
        let entry = loader
            .entry(key)
            .ok_or_else(|| TesseraError::NotFound(format!("{} slot", T::KIND)))?;
        let id = entry.id;
        log::info!(
            "Constructed {} '{}' at {}",
            T::KIND,
            entry.name,
            entry.path.display()
        );

        self.identities.insert(id, T::KIND);
        Ok((Handle::bound(key, id), status))
    }

    /// Persist a resource through its loader strategy
    pub fn save_asset(&mut self, handle: &impl AssetHandle) -> Result<()> {
        let key = self.locate(handle)?;
        self.require_loader_mut(handle.kind())?.save(key)
    }

    /// Save every `Incomplete` resource, returning how many were written
    pub fn save_all(&mut self) -> Result<usize> {
        let pending: Vec<(ResourceKind, AssetKey)> = self
            .loaders
            .iter()
            .flat_map(|l| {
                l.entries()
                    .filter(|(_, e)| e.status == LoadStatus::Incomplete)
                    .map(move |(k, _)| (l.kind(), k))
            })
            .collect();

        for (kind, key) in &pending {
            self.require_loader_mut(*kind)?.save(*key)?;
        }
        Ok(pending.len())
    }

    fn locate(&self, handle: &impl AssetHandle) -> Result<AssetKey> {
        handle
            .locate(self)
            .ok_or_else(|| TesseraError::NotFound(format!("{} handle does not resolve", handle.kind())))
    }

    /// Look up by name, then identity, applying the missing-asset policy
    pub fn get_asset<T: Asset>(&self, name_or_id: &str) -> Result<Handle<T>> {
        let loader = self.require_loader(T::KIND)?;
        let key = loader.key_by_name(name_or_id).or_else(|| {
            ContentId::from_string(name_or_id)
                .ok()
                .and_then(|id| loader.key_by_id(&id))
        });

        match key {
            Some(key) => self.bind(loader, key),
            None => self.missing(&format!("{} '{}'", T::KIND, name_or_id)),
        }
    }

    /// Look up by identity, applying the missing-asset policy
    pub fn get_asset_by_id<T: Asset>(&self, id: ContentId) -> Result<Handle<T>> {
        let loader = self.require_loader(T::KIND)?;
        match loader.key_by_id(&id) {
            Some(key) => self.bind(loader, key),
            None => self.missing(&format!("{} with id {}", T::KIND, id)),
        }
    }

    /// Handle to `T`'s default resource
    pub fn get_default<T: Asset>(&self) -> Result<Handle<T>> {
        let loader = self.require_loader(T::KIND)?;
        Ok(Handle::bound(loader.default_key(), loader.default_id()))
    }

    /// Find a resource by its recorded path or import source, in any kind
    pub fn get_asset_by_path(&self, path: &Path) -> Option<UntypedHandle> {
        let resolved = self.resolve_path(path, true, AssetLocation::Application);
        self.loaders.iter().find_map(|loader| {
            let key = loader
                .key_by_path(path)
                .or_else(|| loader.key_by_path(&resolved))?;
            let entry = loader.entry(key)?;
            Some(UntypedHandle::new(loader.kind(), key, entry.id))
        })
    }

    fn bind<T: Asset>(&self, loader: &Loader, key: AssetKey) -> Result<Handle<T>> {
        let entry = loader
            .entry(key)
            .ok_or_else(|| TesseraError::NotFound(format!("{} slot", T::KIND)))?;
        Ok(Handle::bound(key, entry.id))
    }

    fn missing<T: Asset>(&self, what: &str) -> Result<Handle<T>> {
        match self.config.missing_asset_policy {
            MissingAssetPolicy::Strict => Err(TesseraError::NotFound(what.to_string())),
            MissingAssetPolicy::UseDefault => {
                log::warn!("{} not found, substituting the default {}", what, T::KIND);
                self.get_default::<T>()
            }
        }
    }

    /// Move a resource to `new_path`, relative to the assets root.
    ///
    /// The cache extension of the kind is enforced and the file stem
    /// becomes the new name. A file already on disk is moved along.
    pub fn rename(&mut self, handle: &impl AssetHandle, new_path: &Path) -> Result<()> {
        let kind = handle.kind();
        let key = self.locate(handle)?;

        let mut target = self.resolve_path(new_path, true, AssetLocation::Application);
        target.set_extension(kind.cache_extension());
        let name = target
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                TesseraError::InvalidOperation(format!("'{}' has no file name", new_path.display()))
            })?;

        let loader = self.require_loader_mut(kind)?;
        let entry = loader
            .entry(key)
            .ok_or_else(|| TesseraError::NotFound(format!("{} slot", kind)))?;
        if entry.is_default {
            return Err(TesseraError::InvalidOperation(format!(
                "the default {} cannot be renamed",
                kind
            )));
        }
        let old_path = entry.path.clone();
        let old_name = entry.name.clone();
        if old_path == target {
            return Ok(());
        }

        if loader.key_by_name(&name).map_or(false, |other| other != key) {
            return Err(TesseraError::AlreadyExists(format!("{} named '{}'", kind, name)));
        }
        if target.exists() {
            return Err(TesseraError::AlreadyExists(format!(
                "file {}",
                target.display()
            )));
        }

        // The frame stores the name, so a persisted file is rewritten rather than moved
        let had_file = old_path.is_file();
        loader.rename(key, name.clone(), target.clone())?;
        if had_file {
            if let Err(e) = loader.save(key) {
                loader.rename(key, old_name, old_path)?;
                return Err(e);
            }
            // The old file is untouched until here, so dropping the new copy restores it
            if let Err(e) = fs::remove_file(&old_path) {
                loader.rename(key, old_name, old_path)?;
                if let Err(cleanup) = fs::remove_file(&target) {
                    log::warn!("Could not remove {}: {}", target.display(), cleanup);
                }
                return Err(e.into());
            }
        }

        log::info!(
            "Renamed {} '{}' to '{}' ({})",
            kind,
            old_name,
            name,
            target.display()
        );
        Ok(())
    }

    /// Remove a resource from memory; handles to it stop resolving.
    ///
    /// Any file already written to disk is left in place.
    pub fn destroy(&mut self, handle: &impl AssetHandle) -> Result<()> {
        let kind = handle.kind();
        let key = self.locate(handle)?;
        let loader = self.require_loader_mut(kind)?;
        if key == loader.default_key() {
            return Err(TesseraError::InvalidOperation(format!(
                "the default {} cannot be destroyed",
                kind
            )));
        }

        if let Some(entry) = loader.remove(key) {
            if entry.status == LoadStatus::Incomplete {
                log::warn!("Destroyed {} '{}' before it was ever saved", kind, entry.name);
            }
            log::debug!("Destroyed {} '{}'", kind, entry.name);
            self.identities.remove(&entry.id);
        }
        Ok(())
    }

    /// Destroy every non-default resource of `T`, returning how many went
    pub fn unload_assets<T: Asset>(&mut self) -> usize {
        self.unload_kind(T::KIND)
    }

    fn unload_kind(&mut self, kind: ResourceKind) -> usize {
        let Some(loader) = self.loader_mut(kind) else {
            return 0;
        };
        let keys: Vec<AssetKey> = loader.entries().map(|(k, _)| k).collect();
        let removed: Vec<CatalogEntry> = keys.into_iter().filter_map(|k| loader.remove(k)).collect();
        for entry in &removed {
            self.identities.remove(&entry.id);
        }
        log::debug!("Unloaded {} {} resource(s)", removed.len(), kind);
        removed.len()
    }

    fn forget(&mut self, kind: ResourceKind, key: AssetKey) {
        if let Some(entry) = self.loader_mut(kind).and_then(|l| l.remove(key)) {
            self.identities.remove(&entry.id);
        }
    }

    /// Lifecycle state of whatever a handle points at
    pub fn status(&self, handle: &impl AssetHandle) -> LoadStatus {
        match handle.locate(self) {
            Some(key) => self
                .loader(handle.kind())
                .and_then(|l| l.entry(key))
                .map_or(LoadStatus::Destroyed, |e| e.status),
            None if handle.bound_key().is_some() => LoadStatus::Destroyed,
            None => LoadStatus::Unregistered,
        }
    }

    pub fn entry(&self, handle: &impl AssetHandle) -> Option<&CatalogEntry> {
        let key = handle.locate(self)?;
        self.loader(handle.kind())?.entry(key)
    }

    pub fn records<T: Asset>(&self) -> Vec<&CatalogEntry> {
        self.records_of(T::KIND)
    }

    /// Entries of one kind sorted by name, excluding the default
    pub fn records_of(&self, kind: ResourceKind) -> Vec<&CatalogEntry> {
        let mut records: Vec<&CatalogEntry> = self
            .loader(kind)
            .map(|l| l.entries().map(|(_, e)| e).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Every entry, grouped by kind in declaration order
    pub fn all_records(&self) -> Vec<&CatalogEntry> {
        let mut kinds: Vec<ResourceKind> = self.by_kind.keys().copied().collect();
        kinds.sort();
        kinds.into_iter().flat_map(|k| self.records_of(k)).collect()
    }

    /// Entries constructed in memory and never saved
    pub fn unsaved(&self) -> Vec<&CatalogEntry> {
        self.all_records()
            .into_iter()
            .filter(|e| e.status == LoadStatus::Incomplete)
            .collect()
    }

    /// Number of registered resources, excluding defaults
    pub fn len(&self) -> usize {
        self.loaders.iter().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any resource (defaults included) carries this identity
    pub fn contains_id(&self, id: &ContentId) -> bool {
        self.identities.contains_key(id)
    }

    /// Register every cache file under the cache directory and both asset
    /// roots, so resources constructed or renamed outside the cache are
    /// found again.
    ///
    /// Files that fail to decode, or whose identity or name is already
    /// taken, are logged and skipped. Files already registered from the
    /// same path are ignored.
    pub fn load_cache(&mut self) -> Result<CacheScan> {
        let mut scan = CacheScan::default();
        let mut files = Vec::new();
        for root in self.scan_roots() {
            if root.is_dir() {
                collect_files(&root, &mut files)?;
            } else {
                log::debug!("No asset directory at {}", root.display());
            }
        }
        files.sort();
        files.dedup();

        for path in files {
            let is_cache_file = extension_of(&path)
                .and_then(|ext| ResourceKind::from_cache_extension(&ext))
                .is_some();
            if !is_cache_file {
                continue;
            }

            match self.load_cache_file(&path) {
                Ok(true) => scan.loaded.push(path),
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Skipping cache file {}: {}", path.display(), e);
                    scan.skipped.push((path, e.to_string()));
                }
            }
        }

        log::info!(
            "Loaded {} cached resource(s) ({} skipped)",
            scan.loaded.len(),
            scan.skipped.len()
        );
        Ok(scan)
    }

    /// Directories walked by [`Catalog::load_cache`]
    pub fn scan_roots(&self) -> Vec<PathBuf> {
        vec![
            self.config.cache_dir(),
            self.config.assets_dir.clone(),
            self.config.engine_assets_dir.clone(),
        ]
    }

    /// Register one cache file; `Ok(false)` when it is already registered
    fn load_cache_file(&mut self, path: &Path) -> Result<bool> {
        let (header, mut buffer) = cache::open_cache_file(path)?;

        if let Some(&kind) = self.identities.get(&header.id) {
            let same_file = self
                .loader(kind)
                .and_then(|l| l.key_by_id(&header.id).and_then(|k| l.entry(k)))
                .map_or(false, |e| e.path.as_path() == path);
            if same_file {
                return Ok(false);
            }
            return Err(TesseraError::AlreadyExists(format!(
                "resource with id {}",
                header.id
            )));
        }

        let loader = self.require_loader_mut(header.kind)?;
        let mut resource = loader.strategy().read_cached(&mut buffer)?;
        if buffer.remaining() != 0 {
            return Err(TesseraError::ParseError(format!(
                "{} trailing byte(s) after payload",
                buffer.remaining()
            )));
        }
        *resource.header_mut() =
            AssetHeader::restored(header.kind, header.id, header.name.clone(), path.to_path_buf());

        let entry = CatalogEntry {
            id: header.id,
            name: header.name.clone(),
            display_name: header.name,
            path: path.to_path_buf(),
            status: LoadStatus::Persisted,
            kind: header.kind,
            loader: loader.name(),
            location: header.location,
            source: header.source,
            is_default: false,
        };
        loader.insert(resource, entry)?;
        self.identities.insert(header.id, header.kind);
        Ok(true)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .field("loaders", &self.loaders)
            .finish()
    }
}
