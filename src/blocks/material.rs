//! Material blocks: the textured material itself plus the two bookkeeping
//! blocks (named material info, face-range assignment).

use glam::Vec3;

use crate::error::{Error, Result};
use crate::file::File;
use crate::stream::BinStream;

use super::Block;

/// A single material property node.  On the wire the flag and texture index
/// share one `u16`: bit 15 is `textured`, bits 0–14 the texture id.  An
/// untextured node always round-trips with `texture_id == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialNode {
    pub rgb: Vec3,
    pub textured: bool,
    pub texture_id: i16,
}

pub(crate) fn write_material_node(stream: &mut BinStream, node: &MaterialNode) {
    let data: u16 = if node.textured {
        (1 << 15) | (node.texture_id as u16 & 0x7FFF)
    } else {
        0
    };
    stream.write_vec3(node.rgb).write_u16(data);
}

pub(crate) fn read_material_node(stream: &mut BinStream) -> Result<MaterialNode> {
    let rgb = stream.read_vec3()?;
    let data = stream.read_u16()?;
    let textured = (data >> 15) != 0;
    Ok(MaterialNode {
        rgb,
        textured,
        texture_id: if textured { (data & 0x7FFF) as i16 } else { 0 },
    })
}

/// Material asset block: embedded texture files plus the albedo node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub textures: Vec<File>,
    pub albedo: MaterialNode,
}

pub(crate) fn write_material(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Material(material) = block else {
        return Err(Error::MalformedBlock("block is not a material"));
    };
    File::write_files(stream, &material.textures)?;
    write_material_node(stream, &material.albedo);
    Ok(())
}

pub(crate) fn read_material(stream: &mut BinStream) -> Result<Block> {
    let textures = File::read_files(stream)?;
    let albedo = read_material_node(stream)?;
    Ok(Block::Material(Material { textures, albedo }))
}

// ── MaterialInfo ─────────────────────────────────────────────────────────────

/// Named material record with the object ids it is assigned to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialInfo {
    pub id: u64,
    pub name: String,
    pub assignments: Vec<u64>,
}

pub(crate) fn write_material_info(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::MaterialInfo(info) = block else {
        return Err(Error::MalformedBlock("block is not a material info"));
    };
    stream
        .write_u64(info.id)
        .write_str(&info.name)
        .write_u64_seq(&info.assignments);
    Ok(())
}

pub(crate) fn read_material_info(stream: &mut BinStream) -> Result<Block> {
    Ok(Block::MaterialInfo(MaterialInfo {
        id: stream.read_u64()?,
        name: stream.read_string()?,
        assignments: stream.read_u64_seq()?,
    }))
}

// ── MatRangeAssign ───────────────────────────────────────────────────────────

/// Assignment of one material to a set of face indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatRangeAssign {
    pub mat_id: u64,
    pub faces: Vec<u32>,
}

pub(crate) fn write_mat_range_assign(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::MatRangeAssign(assign) = block else {
        return Err(Error::MalformedBlock("block is not a material range assignment"));
    };
    stream.write_u64(assign.mat_id).write_u32_seq(&assign.faces);
    Ok(())
}

pub(crate) fn read_mat_range_assign(stream: &mut BinStream) -> Result<Block> {
    Ok(Block::MatRangeAssign(MatRangeAssign {
        mat_id: stream.read_u64()?,
        faces: stream.read_u32_seq()?,
    }))
}

/// Normalize a set of range assignments over `face_count` faces: faces not
/// claimed by any assignment fall into a default range under `default_id`.
/// The default range is dropped entirely when every face is claimed.
pub fn filter_mat_assignments(
    assigns: &[MatRangeAssign],
    face_count: usize,
    default_id: u64,
) -> Vec<MatRangeAssign> {
    let mut default_assign = MatRangeAssign {
        mat_id: default_id,
        faces: (0..face_count as u32).collect(),
    };
    if assigns.is_empty() {
        return vec![default_assign];
    }

    let mut claimed = vec![false; face_count];
    for assign in assigns {
        for &face in &assign.faces {
            if let Some(slot) = claimed.get_mut(face as usize) {
                *slot = true;
            }
        }
    }
    default_assign.faces.retain(|&face| !claimed[face as usize]);

    let mut out = Vec::with_capacity(assigns.len() + 1);
    if !default_assign.faces.is_empty() {
        out.push(default_assign);
    }
    out.extend_from_slice(assigns);
    out
}
