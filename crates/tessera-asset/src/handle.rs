//! Typed, lazily resolved references to catalog resources

use crate::catalog::Catalog;
use crate::kind::ResourceKind;
use crate::loader::AssetKey;
use crate::record::AssetRef;
use crate::resource::Asset;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use tessera_core::{ContentId, TesseraError};

/// Anything the catalog can locate a resource through
pub trait AssetHandle {
    /// Resource kind the handle points into
    fn kind(&self) -> ResourceKind;

    /// Live arena key, resolving (and caching) if needed
    fn locate(&self, catalog: &Catalog) -> Option<AssetKey>;

    /// Key last bound to this handle, whether or not it is still alive
    fn bound_key(&self) -> Option<AssetKey>;
}

/// A kind-tagged arena key, as returned by path-based catalog operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UntypedHandle {
    kind: ResourceKind,
    key: AssetKey,
    id: ContentId,
}

impl UntypedHandle {
    pub(crate) fn new(kind: ResourceKind, key: AssetKey, id: ContentId) -> Self {
        Self { kind, key, id }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn key(&self) -> AssetKey {
        self.key
    }

    /// Whether the resource is still present in the catalog
    pub fn is_valid(&self, catalog: &Catalog) -> bool {
        catalog
            .loader(self.kind)
            .map(|l| l.contains(self.key))
            .unwrap_or(false)
    }

    /// Convert to a typed handle, checking the kind
    pub fn typed<T: Asset>(&self) -> Result<Handle<T>, TesseraError> {
        Handle::try_from(*self)
    }
}

impl AssetHandle for UntypedHandle {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn locate(&self, catalog: &Catalog) -> Option<AssetKey> {
        self.is_valid(catalog).then_some(self.key)
    }

    fn bound_key(&self) -> Option<AssetKey> {
        Some(self.key)
    }
}

/// An indirect, type-checked reference to a resource of type `T`.
///
/// A handle stores how to find its resource (identity, name or path) and
/// caches the arena key after the first successful resolution. Handles
/// never own the resource: once the catalog destroys it, the cached key
/// goes stale and the handle stops resolving. Handles are cheap to clone
/// and, like the catalog, are meant to stay on the thread that made them.
pub struct Handle<T: Asset> {
    reference: Option<AssetRef>,
    key: Cell<Option<AssetKey>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Asset> Handle<T> {
    /// A handle that refers to nothing
    pub fn empty() -> Self {
        Self {
            reference: None,
            key: Cell::new(None),
            _marker: PhantomData,
        }
    }

    pub fn from_id(id: ContentId) -> Self {
        Self::from_ref(AssetRef::ById { id })
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        Self::from_ref(AssetRef::ByName(name.into()))
    }

    pub fn from_ref(reference: AssetRef) -> Self {
        Self {
            reference: Some(reference),
            key: Cell::new(None),
            _marker: PhantomData,
        }
    }

    /// A handle already bound to a live slot
    pub(crate) fn bound(key: AssetKey, id: ContentId) -> Self {
        Self {
            reference: Some(AssetRef::ById { id }),
            key: Cell::new(Some(key)),
            _marker: PhantomData,
        }
    }

    pub fn reference(&self) -> Option<&AssetRef> {
        self.reference.as_ref()
    }

    /// Identity this handle refers to, when it refers by identity
    pub fn id(&self) -> Option<ContentId> {
        match &self.reference {
            Some(AssetRef::ById { id }) => Some(*id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_none()
    }

    /// Borrow the resource, resolving and caching on first use
    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> Option<&'c T> {
        let key = self.locate(catalog)?;
        catalog.loader(T::KIND)?.resource(key)?.downcast_ref::<T>()
    }

    /// Mutably borrow the resource, resolving and caching on first use
    pub fn resolve_mut<'c>(&self, catalog: &'c mut Catalog) -> Option<&'c mut T> {
        let key = self.locate(catalog)?;
        catalog.resource_mut(T::KIND, key)?.downcast_mut::<T>()
    }

    /// True iff the handle has resolved and its resource still exists
    pub fn is_valid(&self, catalog: &Catalog) -> bool {
        match self.key.get() {
            Some(key) => catalog
                .loader(T::KIND)
                .map(|l| l.contains(key))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Untyped view of a resolved handle
    pub fn untyped(&self, catalog: &Catalog) -> Option<UntypedHandle> {
        let key = self.locate(catalog)?;
        let entry = catalog.loader(T::KIND)?.entry(key)?;
        Some(UntypedHandle::new(T::KIND, key, entry.id))
    }
}

impl<T: Asset> AssetHandle for Handle<T> {
    fn kind(&self) -> ResourceKind {
        T::KIND
    }

    fn locate(&self, catalog: &Catalog) -> Option<AssetKey> {
        let loader = catalog.loader(T::KIND)?;
        if let Some(key) = self.key.get() {
            if loader.contains(key) {
                return Some(key);
            }
        }

        let key = catalog.lookup_key(T::KIND, self.reference.as_ref()?)?;
        self.key.set(Some(key));
        Some(key)
    }

    fn bound_key(&self) -> Option<AssetKey> {
        self.key.get()
    }
}

impl<T: Asset> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
            key: Cell::new(self.key.get()),
            _marker: PhantomData,
        }
    }
}

impl<T: Asset> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Asset> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &T::KIND)
            .field("reference", &self.reference)
            .field("key", &self.key.get())
            .finish()
    }
}

impl<T: Asset> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl<T: Asset> TryFrom<UntypedHandle> for Handle<T> {
    type Error = TesseraError;

    fn try_from(handle: UntypedHandle) -> Result<Self, Self::Error> {
        if handle.kind != T::KIND {
            return Err(TesseraError::TypeMismatch {
                expected: T::KIND.to_string(),
                got: handle.kind.to_string(),
            });
        }
        Ok(Self::bound(handle.key, handle.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::resources::{Mesh, Texture};
    use std::path::PathBuf;

    fn temp_catalog() -> (Catalog, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tessera_handle_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let catalog = Catalog::with_builtin_loaders(CatalogConfig::rooted_at(&dir)).unwrap();
        (catalog, dir)
    }

    #[test]
    fn test_empty_handle_never_resolves() {
        let (catalog, dir) = temp_catalog();
        let handle = Handle::<Mesh>::empty();
        assert!(handle.is_empty());
        assert!(handle.resolve(&catalog).is_none());
        assert!(!handle.is_valid(&catalog));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_lazy_resolution_caches_key() {
        let (mut catalog, dir) = temp_catalog();
        let (made, _) = catalog.construct_asset::<Mesh>("Pillar", None).unwrap();
        let id = made.id().unwrap();

        let by_name = Handle::<Mesh>::from_name("Pillar");
        assert!(!by_name.is_valid(&catalog));
        assert_eq!(by_name.bound_key(), None);

        let mesh = by_name.resolve(&catalog).unwrap();
        assert_eq!(Asset::header(mesh).id(), id);
        assert!(by_name.is_valid(&catalog));
        assert!(by_name.bound_key().is_some());

        let by_id = Handle::<Mesh>::from_id(id);
        assert_eq!(by_id.resolve(&catalog).map(|m| Asset::header(m).id()), Some(id));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resolve_mut_edits_in_place() {
        let (mut catalog, dir) = temp_catalog();
        let (handle, _) = catalog.construct_asset::<Mesh>("Wall", None).unwrap();

        handle.resolve_mut(&mut catalog).unwrap().vertices.clear();
        assert!(handle.resolve(&catalog).unwrap().vertices.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_destroy_invalidates_clones() {
        let (mut catalog, dir) = temp_catalog();
        let (handle, _) = catalog.construct_asset::<Mesh>("Doomed", None).unwrap();
        let copy = handle.clone();
        assert!(copy.is_valid(&catalog));

        catalog.destroy(&handle).unwrap();
        assert!(!handle.is_valid(&catalog));
        assert!(!copy.is_valid(&catalog));
        assert!(copy.resolve(&catalog).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_untyped_conversion_checks_kind() {
        let (mut catalog, dir) = temp_catalog();
        let (handle, _) = catalog.construct_asset::<Mesh>("Typed", None).unwrap();
        let untyped = handle.untyped(&catalog).unwrap();
        assert_eq!(untyped.kind(), ResourceKind::Mesh);

        let back: Handle<Mesh> = untyped.typed().unwrap();
        assert!(back.resolve(&catalog).is_some());

        let wrong = untyped.typed::<Texture>();
        assert!(matches!(wrong, Err(TesseraError::TypeMismatch { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }
}
