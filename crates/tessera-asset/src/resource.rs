//! The resource contract shared by every asset type

use crate::kind::ResourceKind;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use tessera_core::{ByteBuffer, ContentId, Result};

/// Identity and bookkeeping carried by every resource.
///
/// The identity, kind and default flag are fixed when the header is
/// created. Name and path can only be changed by the catalog, which keeps
/// its indices in step with them.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHeader {
    id: ContentId,
    name: String,
    path: PathBuf,
    is_default: bool,
    kind: ResourceKind,
}

impl AssetHeader {
    /// A fresh, unregistered header with a newly generated identity
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            id: ContentId::generate(),
            name: String::new(),
            path: PathBuf::new(),
            is_default: false,
            kind,
        }
    }

    /// Header for a loader's canonical default instance
    pub(crate) fn default_for(kind: ResourceKind) -> Self {
        Self {
            name: format!("Default{}", kind.type_name()),
            is_default: true,
            ..Self::new(kind)
        }
    }

    /// Header for a freshly constructed or imported resource
    pub(crate) fn registered(kind: ResourceKind, name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            ..Self::new(kind)
        }
    }

    /// Header rebuilt from a cache file
    pub(crate) fn restored(kind: ResourceKind, id: ContentId, name: String, path: PathBuf) -> Self {
        Self {
            id,
            name,
            path,
            is_default: false,
            kind,
        }
    }

    pub fn id(&self) -> ContentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }
}

/// A concrete, typed resource (mesh, texture, ...).
///
/// Implementors hold an [`AssetHeader`] and define how their payload moves
/// through a [`ByteBuffer`]. The payload codec must read back exactly what
/// it wrote, field for field, in the same order.
pub trait Asset: Any + fmt::Debug + Clone + Default {
    const KIND: ResourceKind;

    fn header(&self) -> &AssetHeader;

    fn header_mut(&mut self) -> &mut AssetHeader;

    /// Write the type-specific payload
    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()>;

    /// Replace the payload with one read from the buffer
    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()>;
}

/// Object-safe view of an [`Asset`], as stored by the catalog
pub trait Resource: Any + fmt::Debug {
    fn kind(&self) -> ResourceKind;

    fn header(&self) -> &AssetHeader;

    fn header_mut(&mut self) -> &mut AssetHeader;

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()>;

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()>;

    fn clone_boxed(&self) -> Box<dyn Resource>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Asset> Resource for T {
    fn kind(&self) -> ResourceKind {
        T::KIND
    }

    fn header(&self) -> &AssetHeader {
        Asset::header(self)
    }

    fn header_mut(&mut self) -> &mut AssetHeader {
        Asset::header_mut(self)
    }

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()> {
        Asset::serialize_data(self, buffer)
    }

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()> {
        Asset::deserialize_data(self, buffer)
    }

    fn clone_boxed(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Resource + '_ {
    /// Downcast to a concrete asset type
    pub fn downcast_ref<T: Asset>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Asset>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
