//! Surface materials: texture slots, tint colours and a shader

use super::{Shader, Texture};
use crate::handle::Handle;
use crate::kind::ResourceKind;
use crate::loader::LoaderStrategy;
use crate::resource::{Asset, AssetHeader, Resource};
use serde::Deserialize;
use std::path::Path;
use tessera_core::{ByteBuffer, Color, ContentId, Result, TesseraError};

/// The texture inputs a material can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Albedo,
    Normal,
    Emissive,
    Metallic,
    Roughness,
    Ao,
}

impl TextureSlot {
    /// Slots in payload order
    pub const ALL: [TextureSlot; 6] = [
        TextureSlot::Albedo,
        TextureSlot::Normal,
        TextureSlot::Emissive,
        TextureSlot::Metallic,
        TextureSlot::Roughness,
        TextureSlot::Ao,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One slot's binding: an optional texture tinted by a colour
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotBinding {
    pub texture: Option<ContentId>,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct Material {
    header: AssetHeader,
    slots: [SlotBinding; 6],
    pub shader: Option<ContentId>,
    pub two_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            header: AssetHeader::new(ResourceKind::Material),
            slots: [SlotBinding::default(); 6],
            shader: None,
            two_sided: false,
        }
    }
}

impl Material {
    pub fn slot(&self, slot: TextureSlot) -> &SlotBinding {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: TextureSlot) -> &mut SlotBinding {
        &mut self.slots[slot.index()]
    }

    /// Handle to the texture bound in `slot`, if any
    pub fn texture_handle(&self, slot: TextureSlot) -> Option<Handle<Texture>> {
        self.slot(slot).texture.map(Handle::from_id)
    }

    pub fn shader_handle(&self) -> Option<Handle<Shader>> {
        self.shader.map(Handle::from_id)
    }
}

fn write_optional_id(buffer: &mut ByteBuffer, id: Option<ContentId>) {
    buffer.write(&id.is_some());
    if let Some(id) = id {
        buffer.write(&id);
    }
}

fn read_optional_id(buffer: &mut ByteBuffer) -> Result<Option<ContentId>> {
    if buffer.read::<bool>()? {
        Ok(Some(buffer.read::<ContentId>()?))
    } else {
        Ok(None)
    }
}

impl Asset for Material {
    const KIND: ResourceKind = ResourceKind::Material;

    fn header(&self) -> &AssetHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AssetHeader {
        &mut self.header
    }

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()> {
        for binding in &self.slots {
            write_optional_id(buffer, binding.texture);
            for channel in binding.color.to_array() {
                buffer.write(&channel);
            }
        }
        write_optional_id(buffer, self.shader);
        buffer.write(&self.two_sided);
        Ok(())
    }

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()> {
        let mut slots = [SlotBinding::default(); 6];
        for binding in &mut slots {
            binding.texture = read_optional_id(buffer)?;
            binding.color = Color::new(
                buffer.read()?,
                buffer.read()?,
                buffer.read()?,
                buffer.read()?,
            );
        }
        let shader = read_optional_id(buffer)?;
        let two_sided = buffer.read::<bool>()?;

        self.slots = slots;
        self.shader = shader;
        self.two_sided = two_sided;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlotFile {
    texture: Option<ContentId>,
    color: Option<[f32; 4]>,
}

/// `.mat` source: TOML with one optional table per slot
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialFile {
    shader: Option<ContentId>,
    #[serde(default)]
    two_sided: bool,
    albedo: Option<SlotFile>,
    normal: Option<SlotFile>,
    emissive: Option<SlotFile>,
    metallic: Option<SlotFile>,
    roughness: Option<SlotFile>,
    ao: Option<SlotFile>,
}

impl MaterialFile {
    fn into_material(self) -> Material {
        let mut material = Material {
            shader: self.shader,
            two_sided: self.two_sided,
            ..Material::default()
        };
        let files = [
            self.albedo,
            self.normal,
            self.emissive,
            self.metallic,
            self.roughness,
            self.ao,
        ];
        for (slot, file) in TextureSlot::ALL.into_iter().zip(files) {
            if let Some(file) = file {
                let binding = material.slot_mut(slot);
                binding.texture = file.texture;
                if let Some(color) = file.color {
                    binding.color = Color::from_array(color);
                }
            }
        }
        material
    }
}

/// Reads TOML material descriptions
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialLoader;

impl LoaderStrategy for MaterialLoader {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Material
    }

    fn name(&self) -> &'static str {
        "material"
    }

    fn accepted_extensions(&self) -> &'static [&'static str] {
        &["mat"]
    }

    fn load_from_file(&self, path: &Path) -> Result<Box<dyn Resource>> {
        let content = std::fs::read_to_string(path)?;
        let file: MaterialFile = toml::from_str(&content).map_err(|e| {
            TesseraError::ParseError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Box::new(file.into_material()))
    }

    fn default_resource(&self) -> Box<dyn Resource> {
        Box::new(Material::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_plain_white() {
        let material = Material::default();
        for slot in TextureSlot::ALL {
            assert_eq!(material.slot(slot).color, Color::WHITE);
            assert!(material.texture_handle(slot).is_none());
        }
        assert!(!material.two_sided);
        assert!(material.shader_handle().is_none());
    }

    #[test]
    fn test_payload_round_trip() {
        let albedo = ContentId::generate();
        let shader = ContentId::generate();
        let mut material = Material {
            shader: Some(shader),
            two_sided: true,
            ..Material::default()
        };
        material.slot_mut(TextureSlot::Albedo).texture = Some(albedo);
        material.slot_mut(TextureSlot::Emissive).color = Color::new(1.0, 0.5, 0.0, 1.0);

        let mut buffer = ByteBuffer::new();
        Asset::serialize_data(&material, &mut buffer).unwrap();

        let mut restored = Material::default();
        Asset::deserialize_data(&mut restored, &mut buffer).unwrap();
        assert_eq!(restored.slots, material.slots);
        assert_eq!(restored.shader, Some(shader));
        assert!(restored.two_sided);
        assert_eq!(
            restored.texture_handle(TextureSlot::Albedo).and_then(|h| h.id()),
            Some(albedo)
        );
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_parse_material_file() {
        let id = ContentId::generate();
        let source = format!(
            r#"
two_sided = true

[albedo]
texture = "{}"
color = [0.8, 0.2, 0.2, 1.0]

[roughness]
color = [0.5, 0.5, 0.5, 1.0]
"#,
            id
        );
        let material = toml::from_str::<MaterialFile>(&source)
            .unwrap()
            .into_material();

        assert!(material.two_sided);
        assert_eq!(material.slot(TextureSlot::Albedo).texture, Some(id));
        assert_eq!(
            material.slot(TextureSlot::Albedo).color,
            Color::new(0.8, 0.2, 0.2, 1.0)
        );
        assert_eq!(material.slot(TextureSlot::Roughness).color.r, 0.5);
        assert_eq!(material.slot(TextureSlot::Normal).color, Color::WHITE);
    }

    #[test]
    fn test_malformed_material_file() {
        let dir = std::env::temp_dir().join(format!("tessera_material_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let typo = dir.join("typo.mat");
        std::fs::write(&typo, "[albdo]\ncolor = [1.0, 1.0, 1.0, 1.0]\n").unwrap();
        assert!(matches!(
            MaterialLoader.load_from_file(&typo),
            Err(TesseraError::ParseError(_))
        ));

        let bad_id = dir.join("bad_id.mat");
        std::fs::write(&bad_id, "shader = \"not-an-id\"\n").unwrap();
        assert!(matches!(
            MaterialLoader.load_from_file(&bad_id),
            Err(TesseraError::ParseError(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
