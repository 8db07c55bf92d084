//! HEIC decode and PNG encode.
//!
//! Decoding goes through system libheif; encoding through the `image`
//! crate's PNG encoder with lossless settings.

use crate::errors::{ConvertError, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Decode the primary image of a HEIC file into RGB or RGBA pixels.
pub fn decode_heic(path: &Path) -> Result<DynamicImage> {
    let lib_heif = LibHeif::new();

    let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref())
        .map_err(|e| ConvertError::HeicRead(format!("{}", e)))?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ConvertError::HeicRead(format!("no primary image: {}", e)))?;

    let width = handle.width();
    let height = handle.height();

    let (chroma, channels) = if handle.has_alpha_channel() {
        (RgbChroma::Rgba, 4usize)
    } else {
        (RgbChroma::Rgb, 3usize)
    };

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(chroma), None)
        .map_err(|e| ConvertError::HeicDecode(format!("{}", e)))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ConvertError::HeicDecode("no interleaved plane".to_string()))?;

    // libheif pads rows for odd widths; strip the stride before handing the
    // buffer to `image`.
    let bytes_per_row = width as usize * channels;
    let pixels = if plane.stride == bytes_per_row {
        plane.data.to_vec()
    } else {
        let mut buf = Vec::with_capacity(bytes_per_row * height as usize);
        for row in plane.data.chunks(plane.stride).take(height as usize) {
            buf.extend_from_slice(&row[..bytes_per_row]);
        }
        buf
    };

    let img = match chroma {
        RgbChroma::Rgba => image::RgbaImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8),
        _ => image::RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
    };

    img.ok_or_else(|| ConvertError::HeicDecode("pixel buffer size mismatch".to_string()))
}

/// Encode `img` as a lossless PNG at `out`, default compression effort
/// with adaptive filtering.
pub fn write_png(img: &DynamicImage, out: &Path) -> Result<()> {
    let file = File::create(out)?;
    let writer = BufWriter::new(file);
    let encoder =
        PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    Ok(())
}

/// Convert one HEIC file to a PNG at `out`.
///
/// Any decode or write failure surfaces as an error for the caller to
/// record; a partially written output is removed so a failed job leaves
/// nothing behind.
pub fn convert_heic_to_png(input: &Path, out: &Path) -> Result<()> {
    let img = decode_heic(input)?;
    write_png(&img, out).map_err(|e| {
        let _ = std::fs::remove_file(out);
        e
    })
}
