use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid file signature: {0:#010x}")]
    BadMagic(u32),
    #[error("legacy container revision (FF BE CF B8) is not supported")]
    LegacyRevision,
    #[error("stream truncated: needed {needed} bytes, {left} left")]
    TruncatedStream { needed: usize, left: usize },
    #[error("string field is not valid UTF-8")]
    InvalidString(#[from] FromUtf8Error),
    #[error("failed to decode block {signature:#010x}: {source}")]
    BlockDecodeFailed { signature: u32, source: Box<Error> },
    #[error("malformed block payload: {0}")]
    MalformedBlock(&'static str),
    #[error("library structure is corrupted: {0}")]
    CorruptLibrary(&'static str),
    #[error("image pixel buffer is empty")]
    InvalidPixels,
    #[error("pixel operation failed: {0}")]
    Raster(&'static str),
    #[error("compression failed: {0}")]
    CompressionFailed(String),
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),
    #[error("assets directory not found: {0}")]
    AssetsNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
