//! External compression seam.
//!
//! The envelope's `compressed` toggle is a single bit, so a deployment picks
//! one algorithm and sticks to it — the codec layer only ever sees byte
//! slices.  [`DEFAULT_CODEC`] is the algorithm this build writes and reads;
//! the [`Codec`] trait keeps the seam swappable for embedders.

use crate::error::{Error, Result};

/// Compression level handed to [`compress`] when the caller has no opinion.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 5;

/// The deployment-wide body compression algorithm.
pub const DEFAULT_CODEC: CodecId = CodecId::Zstd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecId {
    Zstd,
    Lz4,
}

pub trait Codec {
    fn id(&self) -> CodecId;
    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn id(&self) -> CodecId {
        CodecId::Zstd
    }

    fn compress(&self, data: &[u8], level: i32) -> Result<Vec<u8>> {
        zstd::encode_all(data, level).map_err(|e| Error::CompressionFailed(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| Error::DecompressionFailed(e.to_string()))
    }
}

pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> CodecId {
        CodecId::Lz4
    }

    fn compress(&self, data: &[u8], _level: i32) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Error::DecompressionFailed(e.to_string()))
    }
}

pub fn get_codec(id: CodecId) -> &'static dyn Codec {
    match id {
        CodecId::Zstd => &ZstdCodec,
        CodecId::Lz4 => &Lz4Codec,
    }
}

/// Compress with the deployment codec.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    get_codec(DEFAULT_CODEC).compress(data, level)
}

/// Decompress with the deployment codec.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    get_codec(DEFAULT_CODEC).decompress(data)
}
