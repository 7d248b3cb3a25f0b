//! Cache file framing
//!
//! Layout: magic `u32`, format version `u32`, kind type name, identity,
//! resource name, location `u8`, optional import source, then the
//! type-specific payload.
//! All fields go through the [`ByteBuffer`] codecs.

use crate::kind::ResourceKind;
use crate::record::{AssetLocation, SourceStamp};
use crate::resource::Resource;
use std::fs;
use std::path::{Path, PathBuf};
use tessera_core::{ByteBuffer, ContentHash, ContentId, Result, TesseraError};

/// "TSSA" read as a big-endian word
pub const CACHE_MAGIC: u32 = 0x5453_5341;
pub const CACHE_VERSION: u32 = 2;

/// Identity information stored ahead of the payload
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHeader {
    pub kind: ResourceKind,
    pub id: ContentId,
    pub name: String,
    pub location: AssetLocation,
    pub source: Option<SourceStamp>,
}

/// Encode a resource's frame and payload
pub fn encode(
    resource: &dyn Resource,
    location: AssetLocation,
    source: Option<&SourceStamp>,
) -> Result<ByteBuffer> {
    let header = resource.header();
    let mut buffer = ByteBuffer::new();
    buffer.write(&CACHE_MAGIC);
    buffer.write(&CACHE_VERSION);
    buffer.write_str(resource.kind().type_name());
    buffer.write(&header.id());
    buffer.write_str(header.name());
    buffer.write(&location_tag(location));
    buffer.write(&source.is_some());
    if let Some(stamp) = source {
        buffer.write_str(&stamp.path.to_string_lossy());
        buffer.write(&stamp.hash);
    }
    resource.serialize_data(&mut buffer)?;
    Ok(buffer)
}

/// Read and validate the frame, leaving the cursor at the payload
pub fn read_header(buffer: &mut ByteBuffer) -> Result<CacheHeader> {
    let magic = buffer.read::<u32>()?;
    if magic != CACHE_MAGIC {
        return Err(TesseraError::ParseError(format!(
            "not a cache file (magic {:#010x})",
            magic
        )));
    }

    let version = buffer.read::<u32>()?;
    if version != CACHE_VERSION {
        return Err(TesseraError::ParseError(format!(
            "unsupported cache version {} (expected {})",
            version, CACHE_VERSION
        )));
    }

    let type_name = buffer.read::<String>()?;
    let kind = ResourceKind::from_type_name(&type_name).ok_or_else(|| {
        TesseraError::ParseError(format!("unknown resource type '{}'", type_name))
    })?;
    let id = buffer.read::<ContentId>()?;
    let name = buffer.read::<String>()?;
    let location = match buffer.read::<u8>()? {
        0 => AssetLocation::Application,
        1 => AssetLocation::Engine,
        other => {
            return Err(TesseraError::ParseError(format!(
                "unknown asset location {}",
                other
            )))
        }
    };

    let source = if buffer.read::<bool>()? {
        let path = PathBuf::from(buffer.read::<String>()?);
        let hash = buffer.read::<ContentHash>()?;
        Some(SourceStamp { path, hash })
    } else {
        None
    };

    Ok(CacheHeader {
        kind,
        id,
        name,
        location,
        source,
    })
}

fn location_tag(location: AssetLocation) -> u8 {
    match location {
        AssetLocation::Application => 0,
        AssetLocation::Engine => 1,
    }
}

/// Write a resource to the path recorded in its header
pub fn write_cache_file(
    resource: &dyn Resource,
    location: AssetLocation,
    source: Option<&SourceStamp>,
) -> Result<()> {
    let path = resource.header().path();
    if path.as_os_str().is_empty() {
        return Err(TesseraError::NotFound(format!(
            "{} '{}' has no file path to save to",
            resource.kind(),
            resource.header().name()
        )));
    }

    let buffer = encode(resource, location, source)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    buffer.save_to_file(path)
}

/// Load a cache file and read its frame
pub fn open_cache_file(path: &Path) -> Result<(CacheHeader, ByteBuffer)> {
    let mut buffer = ByteBuffer::new();
    buffer.load_from_file(path)?;
    let header = read_header(&mut buffer)?;
    Ok((header, buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Asset, AssetHeader};
    use crate::resources::Shader;

    #[test]
    fn test_frame_roundtrip() {
        let mut shader = Shader::default();
        *Asset::header_mut(&mut shader) =
            AssetHeader::registered(ResourceKind::Shader, "Outline".into(), "Outline.tshader".into());

        let mut buffer = encode(&shader, AssetLocation::Application, None).unwrap();
        let header = read_header(&mut buffer).unwrap();
        assert_eq!(header.kind, ResourceKind::Shader);
        assert_eq!(header.location, AssetLocation::Application);
        assert_eq!(header.id, Asset::header(&shader).id());
        assert_eq!(header.name, "Outline");
        assert_eq!(header.source, None);

        let mut restored = Shader::default();
        Asset::deserialize_data(&mut restored, &mut buffer).unwrap();
        assert_eq!(restored.source, shader.source);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_frame_keeps_source_stamp() {
        let shader = Shader::default();
        let stamp = SourceStamp {
            path: PathBuf::from("shaders/outline.frag"),
            hash: ContentHash::of(b"void main() {}"),
        };

        let mut buffer = encode(&shader, AssetLocation::Engine, Some(&stamp)).unwrap();
        let header = read_header(&mut buffer).unwrap();
        assert_eq!(header.location, AssetLocation::Engine);
        assert_eq!(header.source, Some(stamp));
    }

    #[test]
    fn test_unknown_location_byte() {
        let shader = Shader::default();
        let mut buffer = ByteBuffer::new();
        buffer.write(&CACHE_MAGIC);
        buffer.write(&CACHE_VERSION);
        buffer.write_str("Shader");
        buffer.write(&Asset::header(&shader).id());
        buffer.write_str("Broken");
        buffer.write(&9u8);
        assert!(matches!(
            read_header(&mut buffer),
            Err(TesseraError::ParseError(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut buffer = ByteBuffer::new();
        buffer.write(&0xDEADu32);
        assert!(matches!(
            read_header(&mut buffer),
            Err(TesseraError::ParseError(_))
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let mut buffer = ByteBuffer::new();
        buffer.write(&CACHE_MAGIC);
        buffer.write(&CACHE_VERSION);
        buffer.write_str("Font");
        assert!(matches!(
            read_header(&mut buffer),
            Err(TesseraError::ParseError(_))
        ));
    }

    #[test]
    fn test_truncated_frame_is_underrun() {
        let mut buffer = ByteBuffer::new();
        buffer.write(&CACHE_MAGIC);
        assert!(matches!(
            read_header(&mut buffer),
            Err(TesseraError::BufferUnderrun { .. })
        ));
    }

    #[test]
    fn test_write_without_path_fails() {
        let shader = Shader::default();
        assert!(matches!(
            write_cache_file(&shader, AssetLocation::Application, None),
            Err(TesseraError::NotFound(_))
        ));
    }
}
