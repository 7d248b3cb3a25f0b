//! GLSL shader sources

use crate::kind::ResourceKind;
use crate::loader::{extension_of, LoaderStrategy};
use crate::resource::{Asset, AssetHeader, Resource};
use std::fmt;
use std::path::Path;
use tessera_core::{ByteBuffer, Result, TesseraError};

const DEFAULT_FRAGMENT: &str = "#version 450
layout(location = 0) out vec4 out_color;
void main() {
    out_color = vec4(1.0, 0.0, 1.0, 1.0);
}
";

/// Pipeline stage a shader runs in; stored as one byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShaderStage {
    Vertex = 0,
    #[default]
    Fragment = 1,
    Compute = 2,
}

impl ShaderStage {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Vertex),
            1 => Some(Self::Fragment),
            2 => Some(Self::Compute),
            _ => None,
        }
    }

    /// Stage implied by a source file extension; bare `.glsl` is a fragment shader
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "vert" => Some(Self::Vertex),
            "frag" | "glsl" => Some(Self::Fragment),
            "comp" => Some(Self::Compute),
            _ => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Shader {
    header: AssetHeader,
    pub stage: ShaderStage,
    pub source: String,
}

impl Default for Shader {
    /// A fragment shader that paints everything magenta
    fn default() -> Self {
        Self {
            header: AssetHeader::new(ResourceKind::Shader),
            stage: ShaderStage::Fragment,
            source: DEFAULT_FRAGMENT.to_string(),
        }
    }
}

impl Asset for Shader {
    const KIND: ResourceKind = ResourceKind::Shader;

    fn header(&self) -> &AssetHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AssetHeader {
        &mut self.header
    }

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()> {
        buffer.write(&(self.stage as u8));
        buffer.write_str(&self.source);
        Ok(())
    }

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()> {
        let raw = buffer.read::<u8>()?;
        let stage = ShaderStage::from_u8(raw)
            .ok_or_else(|| TesseraError::ParseError(format!("unknown shader stage {}", raw)))?;
        self.source = buffer.read::<String>()?;
        self.stage = stage;
        Ok(())
    }
}

/// Reads GLSL source files, picking the stage from the extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaderLoader;

impl LoaderStrategy for ShaderLoader {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Shader
    }

    fn name(&self) -> &'static str {
        "glsl"
    }

    fn accepted_extensions(&self) -> &'static [&'static str] {
        &["vert", "frag", "comp", "glsl"]
    }

    fn load_from_file(&self, path: &Path) -> Result<Box<dyn Resource>> {
        let stage = extension_of(path)
            .and_then(|ext| ShaderStage::from_extension(&ext))
            .ok_or_else(|| {
                TesseraError::ParseError(format!("{} is not a shader source", path.display()))
            })?;

        let bytes = std::fs::read(path)?;
        let source = String::from_utf8(bytes).map_err(|_| {
            TesseraError::ParseError(format!("{} is not valid UTF-8", path.display()))
        })?;
        if source.trim().is_empty() {
            return Err(TesseraError::ParseError(format!(
                "{} is empty",
                path.display()
            )));
        }

        Ok(Box::new(Shader {
            stage,
            source,
            ..Shader::default()
        }))
    }

    fn default_resource(&self) -> Box<dyn Resource> {
        Box::new(Shader::default())
    }
}
