//! Process-wide stream registry: maps a 32-bit block signature to the
//! reader/writer pair that handles it.
//!
//! The nine built-in codecs are installed the first time the registry is
//! touched, so resolution is ready before any I/O without an explicit init
//! call.  Registration is expected to happen during startup; resolution is
//! read-only and safe from any number of decode threads.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::warn;

use crate::blocks::{image, library, material, mesh, scene, sign, target, Block};
use crate::error::Result;
use crate::stream::BinStream;

pub type ReadFn = fn(&mut BinStream) -> Result<Block>;
pub type WriteFn = fn(&mut BinStream, &Block) -> Result<()>;

/// A registered reader/writer pair.
#[derive(Clone, Copy)]
pub struct BlockCodec {
    pub read: ReadFn,
    pub write: WriteFn,
}

static STREAMS: LazyLock<RwLock<HashMap<u32, BlockCodec>>> =
    LazyLock::new(|| RwLock::new(default_streams()));

fn default_streams() -> HashMap<u32, BlockCodec> {
    HashMap::from([
        (sign::block::IMAGE2D, BlockCodec { read: image::read_image2d, write: image::write_image2d }),
        (sign::block::IMAGE_ATLAS, BlockCodec { read: image::read_image_atlas, write: image::write_image_atlas }),
        (sign::block::MATERIAL, BlockCodec { read: material::read_material, write: material::write_material }),
        (sign::block::MATERIAL_INFO, BlockCodec { read: material::read_material_info, write: material::write_material_info }),
        (sign::block::MATERIAL_RANGE_ASSIGN, BlockCodec { read: material::read_mat_range_assign, write: material::write_mat_range_assign }),
        (sign::block::SCENE, BlockCodec { read: scene::read_scene, write: scene::write_scene }),
        (sign::block::MESH, BlockCodec { read: mesh::read_mesh, write: mesh::write_mesh }),
        (sign::block::TARGET, BlockCodec { read: target::read_target, write: target::write_target }),
        (sign::block::LIBRARY, BlockCodec { read: library::read_library, write: library::write_library }),
    ])
}

fn read_lock() -> RwLockReadGuard<'static, HashMap<u32, BlockCodec>> {
    STREAMS.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock() -> RwLockWriteGuard<'static, HashMap<u32, BlockCodec>> {
    STREAMS.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Register a codec for `signature`.  The first registration wins: a second
/// attempt for the same signature is dropped with a warning, so built-ins
/// cannot be silently overridden.
pub fn register(signature: u32, codec: BlockCodec) {
    let mut streams = write_lock();
    if streams.contains_key(&signature) {
        warn!("stream {signature:#010x} already registered");
        return;
    }
    streams.insert(signature, codec);
}

/// Resolve the codec for `signature`, if any.
pub fn get(signature: u32) -> Option<BlockCodec> {
    read_lock().get(&signature).copied()
}

/// Drop every registration.  Test teardown; pair with
/// [`install_defaults`] to restore the built-ins.
pub fn clear() {
    write_lock().clear();
}

/// Re-install any missing built-in codecs without disturbing existing
/// registrations.
pub fn install_defaults() {
    let mut streams = write_lock();
    for (signature, codec) in default_streams() {
        streams.entry(signature).or_insert(codec);
    }
}
