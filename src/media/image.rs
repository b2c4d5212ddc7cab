// SPDX-License-Identifier: MPL-2.0
//! Image loading, channel normalization and atomic saving.

use crate::error::{Error, Result};
use image_rs::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and decodes an image, guessing the format from its content.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be read, is empty, or is not
/// a decodable image.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let img_bytes = fs::read(path).map_err(|e| Error::Decode(e.to_string()))?;
    if img_bytes.is_empty() {
        return Err(Error::Decode("file is empty".to_string()));
    }
    image_rs::load_from_memory(&img_bytes).map_err(|e| Error::Decode(e.to_string()))
}

/// Converts an image to 8-bit RGB, or 8-bit RGBA when it carries alpha.
///
/// Grayscale becomes three identical channels; gray+alpha becomes RGBA.
/// Images that are already 8-bit RGB or RGBA are returned unchanged.
#[must_use]
pub fn normalize_channels(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Returns the encoder format for a destination path.
///
/// # Errors
///
/// Returns [`Error::Write`] when the extension maps to no known format.
pub fn output_format(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_path(path).map_err(|e| Error::Write(format!("{}: {e}", path.display())))
}

/// Drops the alpha channel for formats that cannot store it.
#[must_use]
pub fn prepare_for_format(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}

/// Temporary sibling path used while `destination` is being written.
#[must_use]
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

/// Encodes `image` next to `destination` and renames it into place.
///
/// The destination either does not exist or holds a complete file; a failed
/// encode never leaves a partial file under the final name.
///
/// # Errors
///
/// Returns [`Error::Write`] if encoding, writing or renaming fails.
pub fn save_image_atomic(image: DynamicImage, destination: &Path) -> Result<()> {
    let format = output_format(destination)?;
    let image = prepare_for_format(image, format);
    let temp = temp_path_for(destination);

    let written = image
        .save_with_format(&temp, format)
        .map_err(|e| Error::Write(e.to_string()))
        .and_then(|()| fs::rename(&temp, destination).map_err(|e| Error::Write(e.to_string())));

    if written.is_err() {
        let _ = fs::remove_file(&temp);
    }
    written
}
