//! Filesystem seam — byte-in/byte-out services the codec delegates to.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub fn read_binary(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

pub fn write_binary(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    Ok(fs::write(path, bytes)?)
}

/// Recursively list every regular file under `dir`, directories first come
/// first served — no ordering guarantee beyond what the OS returns.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.as_ref().to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(files)
}
