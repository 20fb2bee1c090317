//! 2D image and texture-atlas blocks.
//!
//! An [`Atlas`] never carries raster bytes on the wire — only the rectangle
//! placements.  The pixel data lives in the sibling [`Image2d`] block of the
//! same file; [`fill_atlas_pixels`] composes it at build time.

use log::info;

use crate::error::{Error, Result};
use crate::raster;
use crate::stream::BinStream;

use super::Block;

/// On-wire sample-format tag.  Round-tripped bit-for-bit; the named values
/// are the ones the raster helpers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u8);

impl PixelFormat {
    pub const UNKNOWN: PixelFormat = PixelFormat(0);
    /// Unsigned integer samples, scaled over the full type range.
    pub const UINT: PixelFormat = PixelFormat(1);
    /// IEEE float samples (f16 or f32 per `bytes_per_channel`).
    pub const SFLOAT: PixelFormat = PixelFormat(2);
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image2d {
    pub width: u16,
    pub height: u16,
    pub channel_count: u16,
    pub channel_names: Vec<String>,
    pub bytes_per_channel: u16,
    pub format: PixelFormat,
    /// Raw interleaved samples, exactly [`Image2d::byte_size`] long.
    pub pixels: Vec<u8>,
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::UNKNOWN
    }
}

impl Image2d {
    /// Total raster size implied by the dimension fields.
    pub fn byte_size(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.channel_count as usize
            * self.bytes_per_channel as usize
    }

    /// Bytes per interleaved pixel.
    pub fn pixel_stride(&self) -> usize {
        self.channel_count as usize * self.bytes_per_channel as usize
    }
}

fn write_image_info(stream: &mut BinStream, image: &Image2d) -> Result<()> {
    stream
        .write_u16(image.width)
        .write_u16(image.height)
        .write_u16(image.channel_count);
    let name_count = u8::try_from(image.channel_names.len())
        .map_err(|_| Error::MalformedBlock("more than 255 channel names"))?;
    stream.write_u8(name_count);
    for name in &image.channel_names {
        stream.write_str(name);
    }
    stream
        .write_u16(image.bytes_per_channel)
        .write_u8(image.format.0);
    Ok(())
}

fn read_image_info(stream: &mut BinStream) -> Result<Image2d> {
    let mut image = Image2d {
        width: stream.read_u16()?,
        height: stream.read_u16()?,
        channel_count: stream.read_u16()?,
        ..Image2d::default()
    };
    let name_count = stream.read_u8()?;
    for _ in 0..name_count {
        image.channel_names.push(stream.read_string()?);
    }
    image.bytes_per_channel = stream.read_u16()?;
    image.format = PixelFormat(stream.read_u8()?);
    Ok(image)
}

pub(crate) fn write_image2d(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Image2d(image) = block else {
        return Err(Error::MalformedBlock("block is not an image2d"));
    };
    write_image_info(stream, image)?;
    if image.pixels.len() != image.byte_size() {
        return Err(Error::InvalidPixels);
    }
    stream.write_bytes(&image.pixels);
    Ok(())
}

pub(crate) fn read_image2d(stream: &mut BinStream) -> Result<Block> {
    let mut image = read_image_info(stream)?;
    image.pixels = stream.read_bytes(image.byte_size())?;
    Ok(Block::Image2d(image))
}

// ── Atlas ────────────────────────────────────────────────────────────────────

/// One placed sub-rectangle of an atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackRect {
    pub w: i32,
    pub h: i32,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atlas {
    pub discard_step: u16,
    pub padding: i16,
    pub pack_data: Vec<PackRect>,
}

pub(crate) fn write_image_atlas(stream: &mut BinStream, block: &Block) -> Result<()> {
    let Block::Atlas(atlas) = block else {
        return Err(Error::MalformedBlock("block is not an atlas"));
    };
    stream.write_u16(atlas.discard_step).write_i16(atlas.padding);
    let count = u16::try_from(atlas.pack_data.len())
        .map_err(|_| Error::MalformedBlock("more than 65535 atlas rects"))?;
    stream.write_u16(count);
    for rect in &atlas.pack_data {
        stream
            .write_i32(rect.w)
            .write_i32(rect.h)
            .write_i32(rect.x)
            .write_i32(rect.y);
    }
    Ok(())
}

pub(crate) fn read_image_atlas(stream: &mut BinStream) -> Result<Block> {
    let mut atlas = Atlas {
        discard_step: stream.read_u16()?,
        padding: stream.read_i16()?,
        pack_data: Vec::new(),
    };
    let count = stream.read_u16()?;
    atlas.pack_data.reserve(count as usize);
    for _ in 0..count {
        atlas.pack_data.push(PackRect {
            w: stream.read_i32()?,
            h: stream.read_i32()?,
            x: stream.read_i32()?,
            y: stream.read_i32()?,
        });
    }
    Ok(Block::Atlas(atlas))
}

// ── Packing ──────────────────────────────────────────────────────────────────

/// External bin-packing heuristic.  Implementations arrange `rects` in place
/// inside a `max_size` × `max_size` bin and report whether every rectangle
/// found a spot.
pub trait RectPacker {
    fn pack_rects(
        &self,
        rects: &mut [PackRect],
        max_size: u32,
        discard_step: u16,
        allow_flip: bool,
    ) -> bool;
}

/// Run the external packer over `rects`.  Pure compute, never touches a
/// stream; returns `false` (with a log line) when the bin is too small.
pub fn pack_atlas(
    packer: &dyn RectPacker,
    max_size: u32,
    discard_step: u16,
    allow_flip: bool,
    rects: &mut [PackRect],
) -> bool {
    let packed = packer.pack_rects(rects, max_size, discard_step, allow_flip);
    if !packed {
        info!("failed to pack atlas, max size: {max_size}");
    }
    packed
}

/// Compose the atlas raster: clear the target image, then blit every source
/// into its packed rectangle inset by the atlas padding.
pub fn fill_atlas_pixels(image: &mut Image2d, atlas: &Atlas, sources: &[Image2d]) -> Result<()> {
    let clear = vec![0u8; image.pixel_stride()];
    raster::fill_color_pixels(&clear, image)?;
    for (i, rect) in atlas.pack_data.iter().enumerate() {
        let source = sources
            .get(i)
            .ok_or(Error::MalformedBlock("fewer source images than atlas rects"))?;
        if source.pixels.is_empty() {
            return Err(Error::InvalidPixels);
        }
        let pad = atlas.padding as i32;
        let inset = PackRect {
            x: rect.x + pad,
            y: rect.y + pad,
            w: rect.w - 2 * pad,
            h: rect.h - 2 * pad,
        };
        raster::copy_pixels_to_area(source, image, &inset)?;
    }
    Ok(())
}
