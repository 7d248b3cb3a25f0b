//! Static table of the built-in loader strategies.
//!
//! Each resource kind maps to a factory that builds its strategy. The
//! catalog walks this table at startup instead of discovering loaders at
//! runtime.

use crate::kind::ResourceKind;
use crate::loader::LoaderStrategy;
use crate::resources::{MaterialLoader, MeshLoader, ShaderLoader, TextureLoader};

/// Capability entry for one resource kind
pub struct Registration {
    pub kind: ResourceKind,
    pub create_strategy: fn() -> Box<dyn LoaderStrategy>,
}

fn mesh_strategy() -> Box<dyn LoaderStrategy> {
    Box::new(MeshLoader)
}

fn texture_strategy() -> Box<dyn LoaderStrategy> {
    Box::new(TextureLoader)
}

fn material_strategy() -> Box<dyn LoaderStrategy> {
    Box::new(MaterialLoader)
}

fn shader_strategy() -> Box<dyn LoaderStrategy> {
    Box::new(ShaderLoader)
}

/// Built-in registrations, in registration order
pub static BUILTIN_LOADERS: [Registration; 4] = [
    Registration {
        kind: ResourceKind::Mesh,
        create_strategy: mesh_strategy,
    },
    Registration {
        kind: ResourceKind::Texture,
        create_strategy: texture_strategy,
    },
    Registration {
        kind: ResourceKind::Material,
        create_strategy: material_strategy,
    },
    Registration {
        kind: ResourceKind::Shader,
        create_strategy: shader_strategy,
    },
];

/// Find the built-in registration for a kind
pub fn registration(kind: ResourceKind) -> Option<&'static Registration> {
    BUILTIN_LOADERS.iter().find(|r| r.kind == kind)
}
