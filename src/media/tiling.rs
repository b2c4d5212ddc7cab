// SPDX-License-Identifier: MPL-2.0
//! Tiled inference.
//!
//! Large images are split into square tiles so a single inference never
//! needs more memory than one tile. Each tile is run with a margin of
//! context pixels around it; the margin is cropped off the upscaled result
//! before stitching, which hides seams at tile borders.

use crate::domain::TileConfig;
use crate::media::upscale::{UpscaleError, UpscaleResult};
use image_rs::{imageops, RgbImage};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One tile: the region it is responsible for and the region fed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixels this tile contributes to the output.
    pub core: Rect,
    /// `core` grown by the padding and clamped to the image.
    pub padded: Rect,
}

impl Tile {
    /// Position of `core` inside `padded`.
    #[must_use]
    pub fn core_offset(&self) -> (u32, u32) {
        (self.core.x - self.padded.x, self.core.y - self.padded.y)
    }
}

/// Splits a `width`×`height` image into tiles, row by row.
///
/// A disabled tile config, or an image no larger than one tile, yields a
/// single tile covering the whole image. The cores of the returned tiles
/// partition the image exactly.
#[must_use]
pub fn tile_grid(width: u32, height: u32, config: TileConfig) -> Vec<Tile> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    if config.is_disabled() || (width <= config.size && height <= config.size) {
        let whole = Rect::new(0, 0, width, height);
        return vec![Tile {
            core: whole,
            padded: whole,
        }];
    }

    let size = config.size;
    let mut tiles = Vec::new();
    for y in (0..height).step_by(size as usize) {
        for x in (0..width).step_by(size as usize) {
            let core = Rect::new(x, y, size.min(width - x), size.min(height - y));
            let x0 = x.saturating_sub(config.pad);
            let y0 = y.saturating_sub(config.pad);
            let x1 = (core.x + core.width).saturating_add(config.pad).min(width);
            let y1 = (core.y + core.height).saturating_add(config.pad).min(height);
            tiles.push(Tile {
                core,
                padded: Rect::new(x0, y0, x1 - x0, y1 - y0),
            });
        }
    }
    tiles
}

/// Runs `infer` over every tile of `image` and stitches the results.
///
/// `infer` must return its input upscaled by exactly `scale`.
///
/// # Errors
///
/// Returns the first error from `infer`, [`UpscaleError::ShapeMismatch`] if
/// a tile comes back with the wrong size, or
/// [`UpscaleError::UnsupportedInput`] for an empty or oversized image.
pub fn upscale_tiled<F>(
    image: &RgbImage,
    scale: u32,
    config: TileConfig,
    mut infer: F,
) -> UpscaleResult<RgbImage>
where
    F: FnMut(&RgbImage) -> UpscaleResult<RgbImage>,
{
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(UpscaleError::UnsupportedInput("image has no pixels".into()));
    }
    let (out_width, out_height) = width
        .checked_mul(scale)
        .zip(height.checked_mul(scale))
        .ok_or_else(|| UpscaleError::UnsupportedInput("output size overflows".into()))?;

    let mut output = RgbImage::new(out_width, out_height);
    for tile in tile_grid(width, height, config) {
        let patch = imageops::crop_imm(
            image,
            tile.padded.x,
            tile.padded.y,
            tile.padded.width,
            tile.padded.height,
        )
        .to_image();

        let upscaled = infer(&patch)?;
        let expected = (tile.padded.width * scale, tile.padded.height * scale);
        if upscaled.dimensions() != expected {
            return Err(UpscaleError::ShapeMismatch {
                expected,
                actual: upscaled.dimensions(),
            });
        }

        let (offset_x, offset_y) = tile.core_offset();
        let core = imageops::crop_imm(
            &upscaled,
            offset_x * scale,
            offset_y * scale,
            tile.core.width * scale,
            tile.core.height * scale,
        )
        .to_image();
        imageops::replace(
            &mut output,
            &core,
            i64::from(tile.core.x * scale),
            i64::from(tile.core.y * scale),
        );
    }
    Ok(output)
}
