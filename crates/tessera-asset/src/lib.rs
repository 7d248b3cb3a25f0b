//! Tessera Asset - Resource catalog with pluggable loaders
//!
//! This crate provides the catalog that tracks every resource by identity
//! and name, the per-kind loader strategies that read, construct and save
//! them, typed handles that resolve lazily, and the binary cache format.

pub mod cache;
mod catalog;
mod config;
mod handle;
mod kind;
mod loader;
mod record;
mod registry;
mod resource;
pub mod resources;

pub use catalog::{AddOptions, CacheScan, Catalog};
pub use config::{CatalogConfig, MissingAssetPolicy};
pub use handle::{AssetHandle, Handle, UntypedHandle};
pub use kind::ResourceKind;
pub use loader::{AssetKey, Loader, LoaderStrategy};
pub use record::{AssetLocation, AssetRef, CatalogEntry, LoadStatus, SourceStamp};
pub use registry::{registration, Registration, BUILTIN_LOADERS};
pub use resource::{Asset, AssetHeader, Resource};
pub use resources::{
    Material, MaterialLoader, Mesh, MeshLoader, Shader, ShaderLoader, ShaderStage, SlotBinding,
    Texture, TextureLoader, TextureSlot, Vertex,
};
