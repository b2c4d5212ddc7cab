// SPDX-License-Identifier: MPL-2.0
//! Image enhancement port definition.
//!
//! This module defines the [`ImageEnhancer`] trait consumed by the batch
//! runner. The output scale, tiling and precision are fixed when the
//! implementation is constructed, so the trait only carries the image.
//!
//! # Design Notes
//!
//! - Model downloading and session creation happen before an enhancer exists
//! - The trait is `Send + Sync`; implementations serialize calls internally
//! - Images cross the boundary as [`DynamicImage`] so the channel layout the
//!   runner normalized to stays visible to the implementation

use image_rs::DynamicImage;

// =============================================================================
// EnhanceError
// =============================================================================

/// Errors that can occur while enhancing one image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnhanceError {
    /// The enhancer has no loaded model.
    #[error("model is not ready")]
    ModelNotReady,

    /// The input shape is not usable by the model.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The model output had an unexpected shape.
    #[error("unexpected output shape: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected `[N, C, H, W]` shape.
        expected: Vec<usize>,
        /// Shape the session returned.
        actual: Vec<usize>,
    },

    /// The runtime failed during inference.
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

// =============================================================================
// EnhancerCapabilities
// =============================================================================

/// Describes what an enhancer does. Logged when a batch starts.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerCapabilities {
    /// Human-readable model name (e.g. "Real-ESRGAN x4plus").
    pub name: &'static str,

    /// Output scale relative to the input.
    pub scale_factor: u32,

    /// Edge length of inference tiles; `None` when the whole image is sent.
    pub tile_size: Option<u32>,

    /// Whether inference runs on half-precision tensors.
    pub half_precision: bool,
}

impl EnhancerCapabilities {
    /// Creates capabilities for an untiled full-precision enhancer.
    #[must_use]
    pub const fn new(name: &'static str, scale_factor: u32) -> Self {
        Self {
            name,
            scale_factor,
            tile_size: None,
            half_precision: false,
        }
    }

    /// Sets the tile size. A size of 0 means no tiling.
    #[must_use]
    pub const fn with_tile_size(mut self, size: u32) -> Self {
        self.tile_size = if size == 0 { None } else { Some(size) };
        self
    }

    /// Marks the enhancer as running in half precision.
    #[must_use]
    pub const fn with_half_precision(mut self, half: bool) -> Self {
        self.half_precision = half;
        self
    }
}

// =============================================================================
// ImageEnhancer Trait
// =============================================================================

/// Port for super-resolution.
///
/// Infrastructure adapters implement this trait on top of ONNX Runtime; tests
/// implement it with plain resizes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The batch runner never calls
/// [`enhance`](ImageEnhancer::enhance) concurrently, but the bound keeps the
/// adapter shareable.
pub trait ImageEnhancer: Send + Sync {
    /// Upscales an image by the configured factor.
    ///
    /// The input is 8-bit RGB or RGBA; grayscale has been expanded by the
    /// caller. The output keeps the input's channel layout.
    ///
    /// # Errors
    ///
    /// Returns an [`EnhanceError`] if the model is not ready, the input is
    /// unsupported or inference fails.
    fn enhance(&self, image: &DynamicImage) -> Result<DynamicImage, EnhanceError>;

    /// Checks if the model is loaded and ready.
    fn is_ready(&self) -> bool;

    /// Returns the capabilities of this enhancer.
    fn capabilities(&self) -> EnhancerCapabilities;
}
