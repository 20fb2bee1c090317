//! Mesh block: shared-vertex topology with per-face slices of a global
//! index buffer, plus the barycentric bit-packing used by wireframe-capable
//! mesh variants.
//!
//! Wire payload order: sizes, vertices, faces (each face re-serializes its
//! slice of the index array), AABB, transform.  A face's `first_index` is
//! not stored — the decoder rebuilds it as the running sum of the previous
//! faces' index counts.  `bary_vertices` and `normals_angle` are in-memory
//! state for consumers and never hit the wire.

use std::hash::{Hash, Hasher};

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::stream::BinStream;

use super::Block;

/// One unique render vertex.  Equality and hashing are exact per component
/// (bit comparisons on the floats) — higher layers rely on this for
/// deduplication.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.uv == other.uv && self.normal == other.normal
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in [
            self.pos.x, self.pos.y, self.pos.z,
            self.uv.x, self.uv.y,
            self.normal.x, self.normal.y, self.normal.z,
        ] {
            v.to_bits().hash(state);
        }
    }
}

/// Reference into a vertex group: which group, and which vertex of the
/// global vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexRef {
    pub group: u32,
    pub vertex: u32,
}

/// Back-references from one vertex group: the vertices it contains and the
/// faces that touch it.  Derived data — see [`fill_vertex_groups`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexGroup {
    pub vertices: Vec<u32>,
    pub faces: Vec<u32>,
}

/// A polygon face over the shared index buffer.  `first_index..first_index
/// + count` is this face's contiguous slice of [`Model::indices`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexedFace {
    pub vertices: Vec<VertexRef>,
    pub normal: Vec3,
    pub first_index: u32,
    pub count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self { min: Vec3::splat(f32::MAX), max: Vec3::splat(f32::MIN) }
    }
}

impl Aabb {
    pub fn encapsulate(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub vertices: Vec<Vertex>,
    pub group_count: u32,
    pub faces: Vec<IndexedFace>,
    pub indices: Vec<u32>,
    pub aabb: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

/// Vertex with barycentric coordinates; every component is 0.0 or 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaryVertex {
    pub pos: Vec3,
    pub barycentric: Vec3,
}

/// Mesh metadata block.
#[derive(Debug, Clone, Default)]
pub struct MeshBlock {
    pub model: Model,
    /// Consumer-side wireframe vertices; not serialized.
    pub bary_vertices: Vec<BaryVertex>,
    pub transform: Transform,
    /// 0 means hard normals; any other value is the soft-normal angle.
    /// Not serialized.
    pub normals_angle: f32,
}

/// Equality covers the serialized payload (model + transform); the
/// consumer-side fields are derived state.
impl PartialEq for MeshBlock {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.transform == other.transform
    }
}

pub(crate) fn write_mesh(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Mesh(mesh) = block else {
        return Err(Error::MalformedBlock("block is not a mesh"));
    };
    let model = &mesh.model;

    // Sizes
    stream
        .write_u32(model.vertices.len() as u32)
        .write_u32(model.group_count)
        .write_u32(model.faces.len() as u32)
        .write_u32(model.indices.len() as u32);

    // Vertices
    for vertex in &model.vertices {
        stream
            .write_vec3(vertex.pos)
            .write_vec2(vertex.uv)
            .write_vec3(vertex.normal);
    }

    // Faces, each with its slice of the global index buffer
    for face in &model.faces {
        stream.write_u32(face.vertices.len() as u32);
        for vref in &face.vertices {
            stream.write_u32(vref.group).write_u32(vref.vertex);
        }
        stream.write_vec3(face.normal).write_u16(face.count);
        let start = face.first_index as usize;
        let end = start + face.count as usize;
        let slice = model
            .indices
            .get(start..end)
            .ok_or(Error::MalformedBlock("face index range exceeds index buffer"))?;
        for &index in slice {
            stream.write_u32(index);
        }
    }

    stream.write_vec3(model.aabb.min).write_vec3(model.aabb.max);
    stream
        .write_vec3(mesh.transform.position)
        .write_vec3(mesh.transform.rotation)
        .write_vec3(mesh.transform.scale);
    Ok(())
}

pub(crate) fn read_mesh(stream: &mut BinStream) -> Result<Block> {
    let mut mesh = MeshBlock::default();
    let model = &mut mesh.model;

    let vertex_count = stream.read_u32()? as usize;
    model.group_count = stream.read_u32()?;
    let face_count = stream.read_u32()? as usize;
    let index_count = stream.read_u32()? as usize;

    model.vertices.reserve(vertex_count.min(stream.remaining() / 32));
    for _ in 0..vertex_count {
        model.vertices.push(Vertex {
            pos: stream.read_vec3()?,
            uv: stream.read_vec2()?,
            normal: stream.read_vec3()?,
        });
    }

    model.indices = vec![0u32; index_count];
    model.faces.reserve(face_count.min(stream.remaining() / 26));
    let mut index_offset = 0usize;
    for _ in 0..face_count {
        let vref_count = stream.read_u32()? as usize;
        let mut vertices = Vec::with_capacity(vref_count.min(stream.remaining() / 8));
        for _ in 0..vref_count {
            vertices.push(VertexRef { group: stream.read_u32()?, vertex: stream.read_u32()? });
        }
        let normal = stream.read_vec3()?;
        let count = stream.read_u16()?;
        if index_offset + count as usize > index_count {
            return Err(Error::MalformedBlock("face index range exceeds index buffer"));
        }
        for i in 0..count as usize {
            model.indices[index_offset + i] = stream.read_u32()?;
        }
        model.faces.push(IndexedFace {
            vertices,
            normal,
            first_index: index_offset as u32,
            count,
        });
        index_offset += count as usize;
    }

    model.aabb = Aabb { min: stream.read_vec3()?, max: stream.read_vec3()? };
    mesh.transform = Transform {
        position: stream.read_vec3()?,
        rotation: stream.read_vec3()?,
        scale: stream.read_vec3()?,
    };
    Ok(Block::Mesh(mesh))
}

/// Derive the per-group back-references from a model's faces.
pub fn fill_vertex_groups(model: &Model) -> Vec<VertexGroup> {
    let mut groups = vec![VertexGroup::default(); model.group_count as usize];
    for (f, face) in model.faces.iter().enumerate() {
        for vref in &face.vertices {
            if let Some(group) = groups.get_mut(vref.group as usize) {
                group.faces.push(f as u32);
                group.vertices.push(vref.vertex);
            }
        }
    }
    groups
}

pub mod bary {
    //! Barycentric bit-packing: one 3-bit pattern per vertex, MSB-first
    //! into `u64` words.  Bit `k` of a pattern (counting from the
    //! most-significant of the three) marks component `k` nonzero.  A
    //! pattern that straddles a word boundary is split, high bits first.

    use glam::Vec3;

    use super::BaryVertex;

    /// The 3-bit pattern of one barycentric vertex.
    pub fn pattern_of(vertex: &BaryVertex) -> u8 {
        let b = vertex.barycentric;
        (((b.x != 0.0) as u8) << 2) | (((b.y != 0.0) as u8) << 1) | ((b.z != 0.0) as u8)
    }

    /// Pack `patterns` (values 0..=7) into `ceil(3n / 64)` words.
    pub fn pack_patterns(patterns: &[u8]) -> Vec<u64> {
        let mut words = vec![0u64; (patterns.len() * 3).div_ceil(64)];
        let mut bit = 0usize;
        for &pattern in patterns {
            for k in (0..3).rev() {
                if (pattern >> k) & 1 != 0 {
                    words[bit / 64] |= 1u64 << (63 - bit % 64);
                }
                bit += 1;
            }
        }
        words
    }

    /// Recover `count` patterns from packed words.
    pub fn unpack_patterns(words: &[u64], count: usize) -> Vec<u8> {
        let mut patterns = Vec::with_capacity(count);
        let mut bit = 0usize;
        for _ in 0..count {
            let mut pattern = 0u8;
            for _ in 0..3 {
                let set = words
                    .get(bit / 64)
                    .map_or(false, |word| (word >> (63 - bit % 64)) & 1 != 0);
                pattern = (pattern << 1) | set as u8;
                bit += 1;
            }
            patterns.push(pattern);
        }
        patterns
    }

    /// Pack a barycentric vertex run into words.
    pub fn pack(vertices: &[BaryVertex]) -> Vec<u64> {
        let patterns: Vec<u8> = vertices.iter().map(pattern_of).collect();
        pack_patterns(&patterns)
    }

    /// Expand packed words back into barycentric components: a set bit
    /// decodes to `1.0`, a clear bit to `0.0`.
    pub fn unpack_components(words: &[u64], count: usize) -> Vec<Vec3> {
        unpack_patterns(words, count)
            .into_iter()
            .map(|pattern| {
                Vec3::new(
                    ((pattern >> 2) & 1) as f32,
                    ((pattern >> 1) & 1) as f32,
                    (pattern & 1) as f32,
                )
            })
            .collect()
    }
}
