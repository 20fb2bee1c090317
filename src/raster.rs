//! Pixel services behind the atlas fill path: solid fills, rectangular
//! blits, and sample-format conversion.
//!
//! Conversion normalises every sample through f64 — integer formats over
//! their full type range, float formats as-is — so any supported
//! source/destination pair composes.  Channels missing in the source are
//! padded with the destination maximum (opaque alpha).

use half::f16;
use rayon::prelude::*;

use crate::blocks::{Image2d, PackRect, PixelFormat};
use crate::error::{Error, Result};

/// Fill the whole raster with one pixel value, allocating the buffer if the
/// image has none yet.  `pixel` must be exactly one pixel stride long.
pub fn fill_color_pixels(pixel: &[u8], image: &mut Image2d) -> Result<()> {
    let stride = image.pixel_stride();
    if pixel.len() != stride {
        return Err(Error::Raster("fill value does not match the pixel stride"));
    }
    let total = image.byte_size();
    let mut pixels = std::mem::take(&mut image.pixels);
    pixels.clear();
    pixels.reserve(total);
    while pixels.len() < total {
        pixels.extend_from_slice(pixel);
    }
    image.pixels = pixels;
    Ok(())
}

/// Copy `src` into the `rect` area of `dst`.  Formats must match and the
/// rectangle must lie inside the destination.
pub fn copy_pixels_to_area(src: &Image2d, dst: &mut Image2d, rect: &PackRect) -> Result<()> {
    if src.format != dst.format
        || src.bytes_per_channel != dst.bytes_per_channel
        || src.channel_count != dst.channel_count
    {
        return Err(Error::Raster("image format mismatch"));
    }
    if rect.x < 0
        || rect.y < 0
        || rect.x + rect.w > dst.width as i32
        || rect.y + rect.h > dst.height as i32
    {
        return Err(Error::Raster("destination area is out of image bounds"));
    }
    if src.pixels.is_empty() {
        return Err(Error::InvalidPixels);
    }

    let bytes_per_pixel = dst.pixel_stride();
    let src_row_bytes = rect.w as usize * bytes_per_pixel;
    let dst_row_bytes = dst.width as usize * bytes_per_pixel;

    for y in 0..rect.h as usize {
        let src_row = y * src_row_bytes;
        let dst_row =
            (rect.y as usize + y) * dst_row_bytes + rect.x as usize * bytes_per_pixel;
        dst.pixels[dst_row..dst_row + src_row_bytes]
            .copy_from_slice(&src.pixels[src_row..src_row + src_row_bytes]);
    }
    Ok(())
}

// ── Format conversion ────────────────────────────────────────────────────────

fn load_sample(format: PixelFormat, bpc: u16, bytes: &[u8]) -> Result<f64> {
    Ok(match (format, bpc) {
        (PixelFormat::UINT, 1) => bytes[0] as f64 / u8::MAX as f64,
        (PixelFormat::UINT, 2) => {
            u16::from_le_bytes([bytes[0], bytes[1]]) as f64 / u16::MAX as f64
        }
        (PixelFormat::UINT, 4) => {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
                / u32::MAX as f64
        }
        (PixelFormat::SFLOAT, 2) => {
            f16::from_le_bytes([bytes[0], bytes[1]]).to_f64()
        }
        (PixelFormat::SFLOAT, 4) => {
            f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
        }
        _ => return Err(Error::Raster("unsupported pixel format")),
    })
}

fn store_sample(format: PixelFormat, bpc: u16, value: f64, out: &mut [u8]) -> Result<()> {
    match (format, bpc) {
        (PixelFormat::UINT, 1) => {
            out[0] = (value.clamp(0.0, 1.0) * u8::MAX as f64).round() as u8;
        }
        (PixelFormat::UINT, 2) => {
            let v = (value.clamp(0.0, 1.0) * u16::MAX as f64).round() as u16;
            out[..2].copy_from_slice(&v.to_le_bytes());
        }
        (PixelFormat::UINT, 4) => {
            let v = (value.clamp(0.0, 1.0) * u32::MAX as f64).round() as u32;
            out[..4].copy_from_slice(&v.to_le_bytes());
        }
        (PixelFormat::SFLOAT, 2) => {
            out[..2].copy_from_slice(&f16::from_f64(value).to_le_bytes());
        }
        (PixelFormat::SFLOAT, 4) => {
            out[..4].copy_from_slice(&(value as f32).to_le_bytes());
        }
        _ => return Err(Error::Raster("unsupported pixel format")),
    }
    Ok(())
}

/// Convert an image's raster to a new sample format and channel count,
/// returning the freshly allocated buffer.  Pixels convert independently,
/// so the work parallelises per destination pixel.
pub fn convert_image(
    image: &Image2d,
    dst_format: PixelFormat,
    dst_bytes_per_channel: u16,
    dst_channels: u16,
) -> Result<Vec<u8>> {
    if image.pixels.len() != image.byte_size() {
        return Err(Error::InvalidPixels);
    }
    // Validate both endpoints up front so the parallel loop cannot fail.
    load_sample(image.format, image.bytes_per_channel, &[0u8; 4])?;
    store_sample(dst_format, dst_bytes_per_channel, 0.0, &mut [0u8; 4])?;

    let pixel_count = image.width as usize * image.height as usize;
    let src_channels = image.channel_count as usize;
    let src_sample = image.bytes_per_channel as usize;
    let src_stride = image.pixel_stride();
    let dst_sample = dst_bytes_per_channel as usize;
    let dst_stride = dst_sample * dst_channels as usize;

    let mut out = vec![0u8; pixel_count * dst_stride];
    if out.is_empty() {
        return Ok(out);
    }
    out.par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(pixel, dst_pixel)| {
            let src_pixel = &image.pixels[pixel * src_stride..pixel * src_stride + src_stride];
            for ch in 0..dst_channels as usize {
                let value = if ch < src_channels {
                    load_sample(
                        image.format,
                        image.bytes_per_channel,
                        &src_pixel[ch * src_sample..],
                    )
                    .unwrap_or(0.0)
                } else {
                    1.0
                };
                let slot = &mut dst_pixel[ch * dst_sample..(ch + 1) * dst_sample];
                let _ = store_sample(dst_format, dst_bytes_per_channel, value, slot);
            }
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_image(width: u16, height: u16, pixels: Vec<u8>) -> Image2d {
        Image2d {
            width,
            height,
            channel_count: 1,
            bytes_per_channel: 1,
            format: PixelFormat::UINT,
            pixels,
            ..Image2d::default()
        }
    }

    #[test]
    fn fill_repeats_the_pixel_value() {
        let mut image = gray_image(4, 2, Vec::new());
        fill_color_pixels(&[7], &mut image).unwrap();
        assert_eq!(image.pixels, vec![7u8; 8]);
        assert!(fill_color_pixels(&[1, 2], &mut image).is_err());
    }

    #[test]
    fn copy_rejects_out_of_bounds_and_mismatched_formats() {
        let src = gray_image(2, 2, vec![1; 4]);
        let mut dst = gray_image(4, 4, vec![0; 16]);
        copy_pixels_to_area(&src, &mut dst, &PackRect { w: 2, h: 2, x: 2, y: 2 }).unwrap();
        assert_eq!(dst.pixels[2 * 4 + 2], 1);

        assert!(matches!(
            copy_pixels_to_area(&src, &mut dst, &PackRect { w: 2, h: 2, x: 3, y: 0 }),
            Err(Error::Raster(_))
        ));

        let mut float_dst = gray_image(4, 4, vec![0; 64]);
        float_dst.format = PixelFormat::SFLOAT;
        float_dst.bytes_per_channel = 4;
        assert!(matches!(
            copy_pixels_to_area(&src, &mut float_dst, &PackRect { w: 2, h: 2, x: 0, y: 0 }),
            Err(Error::Raster(_))
        ));
    }

    #[test]
    fn uint8_to_f32_conversion_normalizes_and_pads_channels() {
        let image = gray_image(2, 1, vec![0, 255]);
        let out = convert_image(&image, PixelFormat::SFLOAT, 4, 2).unwrap();
        let floats: Vec<f32> = out
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        // Each source luminance plus a padded second channel at full value.
        assert_eq!(floats, vec![0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn f16_roundtrips_through_uint16() {
        let mut image = gray_image(1, 1, f16::from_f32(0.5).to_le_bytes().to_vec());
        image.format = PixelFormat::SFLOAT;
        image.bytes_per_channel = 2;
        let out = convert_image(&image, PixelFormat::UINT, 2, 1).unwrap();
        let v = u16::from_le_bytes([out[0], out[1]]);
        assert_eq!(v, (0.5f64 * u16::MAX as f64).round() as u16);
    }

    #[test]
    fn unknown_format_is_reported() {
        let mut image = gray_image(1, 1, vec![0]);
        image.format = PixelFormat(9);
        assert!(matches!(
            convert_image(&image, PixelFormat::UINT, 1, 1),
            Err(Error::Raster(_))
        ));
    }
}
