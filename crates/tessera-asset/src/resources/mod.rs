//! Built-in resource types and their loader strategies

mod material;
mod mesh;
mod shader;
mod texture;

pub use material::{Material, MaterialLoader, SlotBinding, TextureSlot};
pub use mesh::{Mesh, MeshLoader, Vertex};
pub use shader::{Shader, ShaderLoader, ShaderStage};
pub use texture::{Texture, TextureLoader};
