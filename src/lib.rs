pub mod blocks;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod file;
pub mod frame;
pub mod fsio;
pub mod library_registry;
pub mod raster;
pub mod registry;
pub mod stream;

pub use blocks::{sign, Block};
pub use codec::{get_codec, CodecId, DEFAULT_COMPRESSION_LEVEL};
pub use envelope::{Header, LEGACY_MAGIC, UMBF_MAGIC, UMBF_VENDOR_ID};
pub use error::{Error, Result};
pub use file::{crc32, File};
pub use library_registry::Registry;
pub use stream::BinStream;
