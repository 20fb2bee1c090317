//! Scene block: an ordered object list plus embedded texture and material
//! files.  Each object carries its own framed block stream as metadata, so
//! scenes nest arbitrarily (a mesh block inside an object inside a scene).

use crate::error::{Error, Result};
use crate::file::File;
use crate::frame;
use crate::stream::BinStream;

use super::Block;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub id: u64,
    pub name: String,
    /// Per-object metadata — a terminator-delimited block stream.
    pub meta: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub textures: Vec<File>,
    pub materials: Vec<File>,
}

pub(crate) fn write_scene(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Scene(scene) = block else {
        return Err(Error::MalformedBlock("block is not a scene"));
    };
    let count = u16::try_from(scene.objects.len())
        .map_err(|_| Error::MalformedBlock("more than 65535 scene objects"))?;
    stream.write_u16(count);
    for object in &scene.objects {
        stream.write_u64(object.id).write_str(&object.name);
        frame::write_blocks(stream, &object.meta)?;
    }
    File::write_files(stream, &scene.textures)?;
    File::write_files(stream, &scene.materials)?;
    Ok(())
}

pub(crate) fn read_scene(stream: &mut BinStream) -> Result<Block> {
    let count = stream.read_u16()?;
    let mut scene = Scene::default();
    scene.objects.reserve(count as usize);
    for _ in 0..count {
        scene.objects.push(Object {
            id: stream.read_u64()?,
            name: stream.read_string()?,
            meta: frame::read_blocks(stream)?,
        });
    }
    scene.textures = File::read_files(stream)?;
    scene.materials = File::read_files(stream)?;
    Ok(Block::Scene(scene))
}
