//! Triangle meshes imported from Wavefront OBJ

use crate::kind::ResourceKind;
use crate::loader::LoaderStrategy;
use crate::resource::{Asset, AssetHeader, Resource};
use std::path::Path;
use tessera_core::{ByteBuffer, Result, TesseraError, Vec2, Vec3};

/// One vertex of a triangle list
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    fn write(&self, buffer: &mut ByteBuffer) {
        for v in [self.position, self.normal, self.tangent] {
            buffer.write(&v.x);
            buffer.write(&v.y);
            buffer.write(&v.z);
        }
        buffer.write(&self.uv.x);
        buffer.write(&self.uv.y);
    }

    fn read(buffer: &mut ByteBuffer) -> Result<Self> {
        let vec3 = |buffer: &mut ByteBuffer| -> Result<Vec3> {
            Ok(Vec3::new(buffer.read()?, buffer.read()?, buffer.read()?))
        };
        let position = vec3(buffer)?;
        let normal = vec3(buffer)?;
        let tangent = vec3(buffer)?;
        let uv = Vec2::new(buffer.read()?, buffer.read()?);
        Ok(Self {
            position,
            normal,
            tangent,
            uv,
        })
    }
}

/// A non-indexed triangle list: every three vertices form one triangle
#[derive(Debug, Clone)]
pub struct Mesh {
    header: AssetHeader,
    pub vertices: Vec<Vertex>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            header: AssetHeader::new(ResourceKind::Mesh),
            vertices: Vec::new(),
        }
    }
}

impl Mesh {
    /// A unit quad in the XY plane facing +Z, as two triangles
    pub fn quad() -> Self {
        let corner = |x: f32, y: f32| Vertex {
            position: Vec3::new(x - 0.5, y - 0.5, 0.0),
            normal: Vec3::new(0.0, 0.0, 1.0),
            tangent: Vec3::RIGHT,
            uv: Vec2::new(x, 1.0 - y),
        };
        let (bl, br, tr, tl) = (
            corner(0.0, 0.0),
            corner(1.0, 0.0),
            corner(1.0, 1.0),
            corner(0.0, 1.0),
        );
        Self {
            vertices: vec![bl, br, tr, bl, tr, tl],
            ..Self::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Recompute per-triangle tangents from position and UV deltas
    pub fn compute_tangents(&mut self) {
        for tri in self.vertices.chunks_mut(3) {
            if tri.len() < 3 {
                break;
            }
            let e1 = tri[1].position - tri[0].position;
            let e2 = tri[2].position - tri[0].position;
            let d1 = tri[1].uv - tri[0].uv;
            let d2 = tri[2].uv - tri[0].uv;

            let det = d1.x * d2.y - d2.x * d1.y;
            let tangent = if det.abs() <= f32::EPSILON {
                Vec3::RIGHT
            } else {
                let r = 1.0 / det;
                let t = (e1 * d2.y - e2 * d1.y) * r;
                if t.length() <= f32::EPSILON {
                    Vec3::RIGHT
                } else {
                    t.normalized()
                }
            };
            for v in tri.iter_mut() {
                v.tangent = tangent;
            }
        }
    }
}

impl Asset for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;

    fn header(&self) -> &AssetHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AssetHeader {
        &mut self.header
    }

    fn serialize_data(&self, buffer: &mut ByteBuffer) -> Result<()> {
        buffer.write(&(self.vertices.len() as u64));
        for vertex in &self.vertices {
            vertex.write(buffer);
        }
        Ok(())
    }

    fn deserialize_data(&mut self, buffer: &mut ByteBuffer) -> Result<()> {
        let count = buffer.read::<u64>()? as usize;
        // 11 floats per vertex
        let needed = count.saturating_mul(44);
        if needed > buffer.remaining() {
            return Err(TesseraError::BufferUnderrun {
                requested: needed,
                available: buffer.remaining(),
            });
        }
        self.vertices = (0..count)
            .map(|_| Vertex::read(buffer))
            .collect::<Result<_>>()?;
        Ok(())
    }
}

/// Loads `.obj` files through `tobj`
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshLoader;

impl LoaderStrategy for MeshLoader {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Mesh
    }

    fn name(&self) -> &'static str {
        "obj"
    }

    fn accepted_extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn load_from_file(&self, path: &Path) -> Result<Box<dyn Resource>> {
        let bytes = std::fs::read(path)?;
        Ok(Box::new(parse_obj(&bytes)?))
    }

    fn default_resource(&self) -> Box<dyn Resource> {
        Box::new(Mesh::quad())
    }
}

/// Flatten every model in an OBJ document into one triangle list
fn parse_obj(bytes: &[u8]) -> Result<Mesh> {
    let (models, _materials) = tobj::load_obj_buf(
        &mut std::io::Cursor::new(bytes),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok(Default::default()),
    )
    .map_err(|e| TesseraError::ParseError(format!("invalid OBJ: {}", e)))?;

    if models.is_empty() {
        return Err(TesseraError::ParseError("OBJ contains no geometry".into()));
    }

    let mut mesh = Mesh::default();
    for model in &models {
        let m = &model.mesh;
        for &index in &m.indices {
            let i = index as usize;
            let position = read3(&m.positions, i).ok_or_else(|| {
                TesseraError::ParseError(format!("vertex index {} out of range", i))
            })?;
            mesh.vertices.push(Vertex {
                position,
                normal: read3(&m.normals, i).unwrap_or(Vec3::ZERO),
                tangent: Vec3::RIGHT,
                uv: read2(&m.texcoords, i).unwrap_or(Vec2::ZERO),
            });
        }
    }
    mesh.compute_tangents();
    Ok(mesh)
}

fn read3(data: &[f32], i: usize) -> Option<Vec3> {
    let s = data.get(i * 3..i * 3 + 3)?;
    Some(Vec3::new(s[0], s[1], s[2]))
}

fn read2(data: &[f32], i: usize) -> Option<Vec2> {
    let s = data.get(i * 2..i * 2 + 2)?;
    Some(Vec2::new(s[0], s[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vertices(n: usize) -> Vec<Vertex> {
        (0..n)
            .map(|i| {
                let f = i as f32;
                Vertex {
                    position: Vec3::new(f, -f, f * 0.5),
                    normal: Vec3::new(0.0, 1.0, 0.0),
                    tangent: Vec3::new(0.0, 0.0, -1.0),
                    uv: Vec2::new(f / 10.0, 1.0 - f / 10.0),
                }
            })
            .collect()
    }

    #[test]
    fn test_payload_round_trip() {
        let mesh = Mesh {
            vertices: sample_vertices(7),
            ..Mesh::default()
        };
        let mut buffer = ByteBuffer::new();
        Asset::serialize_data(&mesh, &mut buffer).unwrap();
        assert_eq!(buffer.size(), 8 + 7 * 44);

        let mut restored = Mesh::default();
        Asset::deserialize_data(&mut restored, &mut buffer).unwrap();
        assert_eq!(restored.vertices.len(), 7);
        for (a, b) in restored.vertices.iter().zip(&mesh.vertices) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.normal, b.normal);
            assert_eq!(a.tangent, b.tangent);
            assert_eq!(a.uv, b.uv);
        }
    }

    #[test]
    fn test_field_order_on_the_wire() {
        let mesh = Mesh {
            vertices: vec![Vertex {
                position: Vec3::new(1.0, 2.0, 3.0),
                normal: Vec3::new(4.0, 5.0, 6.0),
                tangent: Vec3::new(7.0, 8.0, 9.0),
                uv: Vec2::new(10.0, 11.0),
            }],
            ..Mesh::default()
        };
        let mut buffer = ByteBuffer::new();
        Asset::serialize_data(&mesh, &mut buffer).unwrap();

        assert_eq!(buffer.read::<u64>().unwrap(), 1);
        for expected in 1..=11 {
            assert_eq!(buffer.read::<f32>().unwrap(), expected as f32);
        }
    }

    #[test]
    fn test_truncated_payload() {
        let mut buffer = ByteBuffer::new();
        buffer.write(&3u64);
        buffer.write(&1.0f32);

        let mut mesh = Mesh::quad();
        assert!(matches!(
            Asset::deserialize_data(&mut mesh, &mut buffer),
            Err(TesseraError::BufferUnderrun { .. })
        ));
        assert_eq!(mesh.vertices.len(), 6);
    }

    #[test]
    fn test_quad_default() {
        let quad = Mesh::quad();
        assert_eq!(quad.triangle_count(), 2);
        assert!(quad.vertices.iter().all(|v| v.normal == Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_parse_obj_triangle() {
        let obj = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.vertices[2].uv, Vec2::new(0.0, 1.0));
        assert_eq!(mesh.vertices[0].normal, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertices[0].tangent, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_obj_quad_face_is_triangulated() {
        let obj = b"v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj(obj).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::ZERO));
        assert!(mesh.vertices.iter().all(|v| v.tangent == Vec3::RIGHT));
    }

    #[test]
    fn test_parse_obj_rejects_garbage() {
        assert!(matches!(
            parse_obj(b"v 1 2\nf 1 1 1\n"),
            Err(TesseraError::ParseError(_))
        ));
    }

    #[test]
    fn test_degenerate_uvs_fall_back() {
        let mut mesh = Mesh {
            vertices: sample_vertices(3),
            ..Mesh::default()
        };
        for v in &mut mesh.vertices {
            v.uv = Vec2::ZERO;
        }
        mesh.compute_tangents();
        assert!(mesh.vertices.iter().all(|v| v.tangent == Vec3::RIGHT));
    }
}
