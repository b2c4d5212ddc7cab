// SPDX-License-Identifier: MPL-2.0
//! Image files, model downloads and inference.
//!
//! - [`image`]: decoding, channel normalization and atomic saving
//! - [`download`]: streaming HTTP download of model weights
//! - [`tiling`]: tile grid and stitching for large images
//! - [`upscale`]: ONNX Runtime session and super-resolution inference

pub mod download;
pub mod image;
pub mod tiling;
pub mod upscale;

use crate::config::defaults::IMAGE_EXTENSIONS;
use std::path::Path;

pub use image::{load_image, normalize_channels, save_image_atomic};

/// Returns `true` if the path has a supported image extension, ignoring case.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_match_case_insensitively() {
        assert!(is_supported_image(Path::new("a.png")));
        assert!(is_supported_image(Path::new("b.JPG")));
        assert!(is_supported_image(Path::new("c.Tif")));
        assert!(is_supported_image(Path::new("d.webp")));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        assert!(!is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }
}
