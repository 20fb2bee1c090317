//! Library registry: scans a directory tree for `.umlib` files and keeps
//! the loaded libraries by their root node name.

use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};

use crate::blocks::{sign, Block, Library};
use crate::error::{Error, Result};
use crate::file::File;
use crate::fsio;

#[derive(Debug, Default)]
pub struct Registry {
    libraries: HashMap<String, Library>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` recursively and load every `.umlib` it contains.  A file
    /// that fails to load is logged and skipped; a missing directory is
    /// fatal.
    pub fn init(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let entries = fsio::list_files(dir)
            .map_err(|_| Error::AssetsNotFound(dir.to_path_buf()))?;
        for entry in entries {
            if entry.extension().and_then(|e| e.to_str()) != Some("umlib") {
                continue;
            }
            info!("loading library: {}", entry.display());
            let file = match File::read_from_disk(&entry) {
                Ok(file) if file.header.type_sign == sign::format::LIBRARY => file,
                Ok(_) => {
                    warn!("failed to load library {}: wrong file type", entry.display());
                    continue;
                }
                Err(_) => {
                    // read_from_disk already logged the cause
                    warn!("failed to load library {}", entry.display());
                    continue;
                }
            };
            match file.blocks.into_iter().next() {
                Some(Block::Library(library)) => {
                    self.libraries.insert(library.root.name.clone(), library);
                }
                _ => warn!(
                    "failed to load library {}: first block is not a library",
                    entry.display()
                ),
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Library> {
        self.libraries.get(name)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Library)> {
        self.libraries.iter()
    }
}
