// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! Values owned by a domain type stay with that type:
//! [`scale_bounds`](crate::domain::run_config::scale_bounds),
//! [`TileConfig::DEFAULT_SIZE`] and [`RunConfig::OUTPUT_DIR_NAME`]. This module
//! holds the limits that only the configuration and I/O layers use.
//!
//! # Categories
//!
//! - **Tiling**: Upper bound for the `tile_size` setting
//! - **Layout**: Accepted image extensions
//! - **Download**: HTTP client limits for model downloads
//!
//! [`RunConfig::OUTPUT_DIR_NAME`]: crate::domain::RunConfig::OUTPUT_DIR_NAME

use crate::domain::TileConfig;

// ==========================================================================
// Tiling Limits
// ==========================================================================

/// Largest accepted tile edge length.
pub const MAX_TILE_SIZE: u32 = 4096;

// ==========================================================================
// Layout Defaults
// ==========================================================================

/// Image file extensions picked up by the enumerator (compared lowercase).
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "webp", "tiff", "tif"];

// ==========================================================================
// Download Defaults
// ==========================================================================

/// Maximum number of HTTP redirects followed when fetching a model.
pub const MAX_DOWNLOAD_REDIRECTS: usize = 5;

/// User agent sent with model downloads.
pub const DOWNLOAD_USER_AGENT: &str = concat!("anime_upscaler/", env!("CARGO_PKG_VERSION"));

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Tiling validation
    assert!(TileConfig::DEFAULT_SIZE <= MAX_TILE_SIZE);
    assert!(TileConfig::DEFAULT_PAD < TileConfig::DEFAULT_SIZE);

    // Download validation
    assert!(MAX_DOWNLOAD_REDIRECTS > 0);
};
