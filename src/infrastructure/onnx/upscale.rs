// SPDX-License-Identifier: MPL-2.0
//! `Real-ESRGAN` upscale adapter implementing the [`ImageEnhancer`] trait.
//!
//! [`ImageEnhancer`]: crate::application::port::ImageEnhancer

use std::path::Path;
use std::sync::Mutex;

use image_rs::DynamicImage;

use crate::application::port::{EnhanceError, EnhancerCapabilities, ImageEnhancer};
use crate::domain::{Device, ModelKind, Precision, RunConfig, ScaleFactor, TileConfig};
use crate::error::{Error, Result};
use crate::media::upscale::{UpscaleError, UpscaleManager};

/// ONNX-based upscale processor for the `Real-ESRGAN` x4 family.
///
/// Scale, tiling and precision are fixed at construction. The session lives
/// behind a mutex, so calls are serialized.
///
/// # Example
///
/// ```ignore
/// use anime_upscaler::infrastructure::onnx::OnnxUpscaleProcessor;
/// use anime_upscaler::application::port::ImageEnhancer;
///
/// let processor = OnnxUpscaleProcessor::load(&model_path, &config, Device::Cpu)?;
/// let upscaled = processor.enhance(&image)?;
/// ```
pub struct OnnxUpscaleProcessor {
    manager: Mutex<UpscaleManager>,
    model: ModelKind,
    scale: ScaleFactor,
    tiles: TileConfig,
}

impl OnnxUpscaleProcessor {
    /// Creates the session for `model_path` on `device` using the model,
    /// scale, precision and tiling of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the session cannot be created.
    pub fn load(model_path: &Path, config: &RunConfig, device: Device) -> Result<Self> {
        Self::load_with(
            model_path,
            config.model(),
            config.scale(),
            config.precision(),
            config.tiling(),
            device,
        )
    }

    /// Same as [`load`](Self::load) with explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelLoad`] if the session cannot be created.
    pub fn load_with(
        model_path: &Path,
        model: ModelKind,
        scale: ScaleFactor,
        precision: Precision,
        tiles: TileConfig,
        device: Device,
    ) -> Result<Self> {
        let mut manager = UpscaleManager::new(model_path, model.net_scale());
        manager
            .load_session(device, precision)
            .map_err(|e| Error::ModelLoad(e.to_string()))?;

        Ok(Self {
            manager: Mutex::new(manager),
            model,
            scale,
            tiles,
        })
    }
}

impl ImageEnhancer for OnnxUpscaleProcessor {
    fn enhance(&self, image: &DynamicImage) -> std::result::Result<DynamicImage, EnhanceError> {
        let mut manager = self
            .manager
            .lock()
            .map_err(|_| EnhanceError::InferenceFailed("Lock poisoned".to_string()))?;

        manager
            .upscale_image(image, self.scale, self.tiles)
            .map_err(to_enhance_error)
    }

    fn is_ready(&self) -> bool {
        self.manager
            .lock()
            .map(|m| m.is_session_ready())
            .unwrap_or(false)
    }

    fn capabilities(&self) -> EnhancerCapabilities {
        let half = self
            .manager
            .lock()
            .map(|m| m.precision() == Precision::Half)
            .unwrap_or(false);
        EnhancerCapabilities::new(self.model.display_name(), self.scale.value())
            .with_tile_size(self.tiles.size)
            .with_half_precision(half)
    }
}

/// Maps manager errors onto the port's error type.
fn to_enhance_error(err: UpscaleError) -> EnhanceError {
    match err {
        UpscaleError::SessionNotInitialized | UpscaleError::ModelNotFound(_) => {
            EnhanceError::ModelNotReady
        }
        UpscaleError::UnsupportedInput(msg) => EnhanceError::UnsupportedInput(msg),
        UpscaleError::ShapeMismatch { expected, actual } => EnhanceError::ShapeMismatch {
            expected: vec![expected.0 as usize, expected.1 as usize],
            actual: vec![actual.0 as usize, actual.1 as usize],
        },
        other => EnhanceError::InferenceFailed(other.to_string()),
    }
}
