//! PNG encoding for rendered tiles and colormap swatches.
//!
//! Two modes:
//! - **Indexed (color type 3)** when the image has at most 256 distinct
//!   RGBA values, which is typical of colormapped tiles.
//! - **RGBA (color type 6)** otherwise.

use std::collections::HashMap;
use std::io::Write;

use raster_common::RenderedTile;
use tracing::debug;

use crate::colormap::ColormapLut;
use crate::error::{RenderError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const MAX_PALETTE_SIZE: usize = 256;

/// Encode a rendered tile, indexed when its colors fit a palette.
pub fn encode_tile(tile: &RenderedTile) -> Result<Vec<u8>> {
    encode_auto(&tile.rgba, tile.width, tile.height)
}

/// Encode a LUT as a horizontal strip of `width` x `height` pixels.
pub fn encode_lut_swatch(lut: &ColormapLut, width: usize, height: usize) -> Result<Vec<u8>> {
    let mut row = Vec::with_capacity(width * 4);
    let denom = width.saturating_sub(1).max(1) as f32;
    for x in 0..width {
        row.extend_from_slice(&lut.lookup(x as f32 / denom));
    }
    let pixels = row.repeat(height);
    encode_auto(&pixels, width, height)
}

/// Choose indexed or RGBA encoding from the pixel content.
pub fn encode_auto(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_size(pixels, width, height)?;
    match extract_palette(pixels) {
        Some((palette, indices)) => {
            debug!(width, height, colors = palette.len(), "Encoding indexed PNG");
            encode_indexed(width, height, &palette, &indices)
        }
        None => {
            debug!(width, height, "More than {} colors, encoding RGBA PNG", MAX_PALETTE_SIZE);
            encode_rgba(pixels, width, height)
        }
    }
}

fn check_size(pixels: &[u8], width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::Encode(format!("empty image {}x{}", width, height)));
    }
    if pixels.len() != width * height * 4 {
        return Err(RenderError::Encode(format!(
            "{}x{} RGBA image needs {} bytes, got {}",
            width,
            height,
            width * height * 4,
            pixels.len()
        )));
    }
    Ok(())
}

/// Palette and per-pixel indices, or `None` above 256 colors.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 4]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Indexed PNG (color type 3) with a tRNS chunk when any entry is translucent.
pub fn encode_indexed(width: usize, height: usize, palette: &[[u8; 4]], indices: &[u8]) -> Result<Vec<u8>> {
    if indices.len() != width * height {
        return Err(RenderError::Encode(format!(
            "{} indices for a {}x{} image",
            indices.len(),
            width,
            height
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width, height)?);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// RGBA PNG (color type 6).
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_size(pixels, width, height)?;

    let mut png = Vec::new();
    png.extend_from_slice(&SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width * 4, height)?);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression
    data.push(0); // filter
    data.push(0); // interlace
    data
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each `row_bytes` scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_extraction() {
        let pixels = [
            255, 0, 0, 255, //
            0, 0, 0, 0, //
            255, 0, 0, 255,
        ];
        let (palette, indices) = extract_palette(&pixels).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_too_many_colors() {
        let pixels: Vec<u8> = (0..300u32).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255]).collect();
        assert!(extract_palette(&pixels).is_none());
    }

    #[test]
    fn test_size_checked() {
        assert!(matches!(encode_rgba(&[0; 8], 3, 1), Err(RenderError::Encode(_))));
        assert!(matches!(encode_auto(&[], 0, 0), Err(RenderError::Encode(_))));
    }
}
