//! The file façade: a header, an ordered block list, and the derived
//! CRC-32 checksum.
//!
//! Nested files (material textures, scene assets, library leaves) reuse the
//! same block-stream path but carry only a packed header — no magic, no
//! compression, no checksum.  That is why `checksum` stays out of file
//! equality: it describes the block-stream bytes, not the value.

use std::path::Path;

use log::{error, warn};

use crate::blocks::Block;
use crate::envelope::{self, Header};
use crate::error::{Error, Result};
use crate::frame;
use crate::fsio;
use crate::stream::BinStream;

/// CRC-32 (IEEE) with seed 0 — the integrity primitive of the format.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

#[derive(Debug, Clone, Default)]
pub struct File {
    pub header: Header,
    /// Ordered blocks; by convention the first one matches the type the
    /// header announces.
    pub blocks: Vec<Block>,
    /// CRC-32 of the uncompressed block-stream bytes.  Filled by
    /// [`File::save`]/[`File::to_bytes`] and by decode; zero on nested
    /// files and freshly built values.
    pub checksum: u32,
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.blocks == other.blocks
    }
}

impl File {
    pub fn new(header: Header) -> Self {
        Self { header, ..Self::default() }
    }

    /// Encode into the on-disk byte form, updating `self.checksum` from the
    /// uncompressed block stream.
    pub fn to_bytes(&mut self, compression: i32) -> Result<Vec<u8>> {
        let mut body = BinStream::new();
        frame::write_blocks(&mut body, &self.blocks)?;
        self.checksum = crc32(body.data());
        envelope::write(&self.header, body.data(), compression)
    }

    /// Encode and write to `path`.  Strict: any encoder error aborts the
    /// whole save and nothing is written.
    pub fn save(&mut self, path: impl AsRef<Path>, compression: i32) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(compression).map_err(|err| {
            error!("failed to write {}: {err}", path.display());
            err
        })?;
        fsio::write_binary(path, &bytes)
    }

    /// Decode a whole file from its on-disk byte form.
    pub fn read_from_bytes(bytes: &[u8]) -> Result<File> {
        let mut stream = BinStream::from_vec(bytes.to_vec());
        let header = envelope::read(&mut stream)?;
        let body_start = stream.pos();
        let blocks = frame::read_blocks(&mut stream)?;
        if blocks.is_empty() {
            warn!("no blocks found in stream");
        }
        let checksum = crc32(&stream.data()[body_start..]);
        Ok(File { header, blocks, checksum })
    }

    /// Read and decode `path`.  Failures surface as a single error logged
    /// at this boundary.
    pub fn read_from_disk(path: impl AsRef<Path>) -> Result<File> {
        let path = path.as_ref();
        fsio::read_binary(path)
            .and_then(|bytes| File::read_from_bytes(&bytes))
            .map_err(|err| {
                error!("failed to read {}: {err}", path.display());
                err
            })
    }

    // ── Nested files ─────────────────────────────────────────────────────────

    /// Encode as an embedded file: packed header + block stream, nothing
    /// else.
    pub(crate) fn write_nested(&self, stream: &mut BinStream) -> Result<()> {
        self.header.write_packed(stream);
        frame::write_blocks(stream, &self.blocks)
    }

    pub(crate) fn read_nested(stream: &mut BinStream) -> Result<File> {
        let header = Header::read_packed(stream)?;
        let blocks = frame::read_blocks(stream)?;
        Ok(File { header, blocks, checksum: 0 })
    }

    /// `u16` count followed by each nested file — the layout every
    /// file-sequence field shares.
    pub(crate) fn write_files(stream: &mut BinStream, files: &[File]) -> Result<()> {
        let count = u16::try_from(files.len())
            .map_err(|_| Error::MalformedBlock("more than 65535 nested files"))?;
        stream.write_u16(count);
        for file in files {
            file.write_nested(stream)?;
        }
        Ok(())
    }

    pub(crate) fn read_files(stream: &mut BinStream) -> Result<Vec<File>> {
        let count = stream.read_u16()?;
        let mut files = Vec::with_capacity(count as usize);
        for _ in 0..count {
            files.push(File::read_nested(stream)?);
        }
        Ok(files)
    }
}
