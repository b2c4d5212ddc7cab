// SPDX-License-Identifier: MPL-2.0
//! Super-resolution inference on ONNX Runtime.
//!
//! This module provides functionality for:
//! - Creating an ONNX session on the selected execution provider
//! - Running Real-ESRGAN style models tile by tile
//! - Handling alpha channels and non-native output scales
//!
//! # Upscaling Strategy
//!
//! The networks upscale by a fixed factor (4x). For other scale factors:
//! - Apply the native upscaling first
//! - Then resize to the target dimensions using Lanczos3 interpolation
//!
//! This produces better quality than direct interpolation for enlargements.
//! Alpha is never sent through the network; it is resized with Lanczos3 and
//! merged back.

use crate::domain::{Device, Precision, ScaleFactor, TileConfig};
use crate::media::tiling;
use half::f16;
use image_rs::imageops::{self, FilterType};
use image_rs::{DynamicImage, GrayImage, Luma, RgbImage, Rgba, RgbaImage};
use ndarray::Array4;
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use std::path::{Path, PathBuf};

/// Result type for upscale operations.
pub type UpscaleResult<T> = Result<T, UpscaleError>;

/// Errors that can occur during upscaling operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpscaleError {
    /// Model file not found at expected path.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    /// The session could not be created.
    #[error("failed to create session: {0}")]
    ModelLoad(String),
    /// Model session not initialized.
    #[error("ONNX session not initialized")]
    SessionNotInitialized,
    /// The image cannot be processed.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
    /// A tile came back with unexpected dimensions.
    #[error("unexpected tile size: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// ONNX inference failed.
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    /// Image postprocessing failed.
    #[error("postprocessing failed: {0}")]
    PostprocessingFailed(String),
}

/// Returns the execution provider for `device`, or `None` for plain CPU.
///
/// `Mps` maps to Core ML, the Apple GPU backend of ONNX Runtime.
#[must_use]
pub fn execution_provider(device: Device) -> Option<ExecutionProviderDispatch> {
    match device {
        Device::Cpu => None,
        Device::Cuda => Some(CUDAExecutionProvider::default().build()),
        Device::Mps => Some(CoreMLExecutionProvider::default().build()),
    }
}

/// Decides the tensor precision for a session.
///
/// Half precision is used only when it was requested, the device is an
/// accelerator and the model declares an `f16` input. Every other
/// combination runs in `f32`, and a half request that is not honored is
/// logged.
#[must_use]
pub fn effective_precision(requested: Precision, device: Device, model_is_f16: bool) -> Precision {
    match requested {
        Precision::Full => Precision::Full,
        Precision::Half if !device.is_accelerator() => {
            tracing::warn!(%device, "half precision needs an accelerator, running in fp32");
            Precision::Full
        }
        Precision::Half if !model_is_f16 => {
            tracing::warn!("model expects fp32 input, running in fp32");
            Precision::Full
        }
        Precision::Half => Precision::Half,
    }
}

/// Manager for a super-resolution ONNX model.
///
/// Handles the session lifecycle and inference.
pub struct UpscaleManager {
    model_path: PathBuf,
    net_scale: u32,
    session: Option<Session>,
    input_name: String,
    precision: Precision,
}

impl UpscaleManager {
    /// Creates a manager for the model at `model_path`, which upscales by
    /// `net_scale`. No session is created yet.
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>, net_scale: u32) -> Self {
        Self {
            model_path: model_path.into(),
            net_scale,
            session: None,
            input_name: "input".to_string(),
            precision: Precision::Full,
        }
    }

    /// Returns the path of the model file.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Native upscale factor of the network.
    #[must_use]
    pub fn net_scale(&self) -> u32 {
        self.net_scale
    }

    /// Precision of the tensors fed to the session.
    #[must_use]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Loads the ONNX session from the model file on `device`.
    ///
    /// Execution providers that fail to register fall back to the CPU
    /// inside ONNX Runtime.
    ///
    /// # Errors
    ///
    /// Returns [`UpscaleError::ModelNotFound`] if the file is missing and
    /// [`UpscaleError::ModelLoad`] if the session fails to initialize or the
    /// model only accepts `f16` input while `f32` was selected.
    pub fn load_session(&mut self, device: Device, requested: Precision) -> UpscaleResult<()> {
        if !self.model_path.exists() {
            return Err(UpscaleError::ModelNotFound(self.model_path.clone()));
        }

        let mut builder = Session::builder()
            .map_err(|e| UpscaleError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| UpscaleError::ModelLoad(e.to_string()))?;
        if let Some(provider) = execution_provider(device) {
            builder = builder
                .with_execution_providers([provider])
                .map_err(|e| UpscaleError::ModelLoad(e.to_string()))?;
        }
        let session = builder
            .commit_from_file(&self.model_path)
            .map_err(|e| UpscaleError::ModelLoad(e.to_string()))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| UpscaleError::ModelLoad("model has no inputs".to_string()))?;
        let model_is_f16 = matches!(
            &input.input_type,
            ValueType::Tensor {
                ty: TensorElementType::Float16,
                ..
            }
        );
        let precision = effective_precision(requested, device, model_is_f16);
        if model_is_f16 && precision == Precision::Full {
            return Err(UpscaleError::ModelLoad(format!(
                "{} only accepts fp16 input, which needs a CUDA or MPS device without --fp32",
                self.model_path.display()
            )));
        }
        self.input_name = input.name.clone();
        self.precision = precision;

        tracing::info!(
            model = %self.model_path.display(),
            %device,
            precision = %self.precision,
            "inference session ready"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Checks if the ONNX session is loaded and ready.
    #[must_use]
    pub fn is_session_ready(&self) -> bool {
        self.session.is_some()
    }

    /// Runs one inference on an RGB image.
    ///
    /// Returns the image upscaled by the network's native factor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not initialized or inference fails.
    pub fn upscale(&mut self, image: &RgbImage) -> UpscaleResult<RgbImage> {
        let session = self
            .session
            .as_mut()
            .ok_or(UpscaleError::SessionNotInitialized)?;

        // Preprocess: RgbImage -> NCHW tensor (RGB, normalized 0-1)
        let input_tensor = preprocess_image(image);

        match self.precision {
            Precision::Full => {
                let input_ref = ort::value::TensorRef::from_array_view(&input_tensor)
                    .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
                let outputs = session
                    .run(ort::inputs![self.input_name.as_str() => input_ref])
                    .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
                postprocess_output(&outputs, Precision::Full)
            }
            Precision::Half => {
                let input_tensor = input_tensor.mapv(f16::from_f32);
                let input_ref = ort::value::TensorRef::from_array_view(&input_tensor)
                    .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
                let outputs = session
                    .run(ort::inputs![self.input_name.as_str() => input_ref])
                    .map_err(|e| UpscaleError::InferenceFailed(e.to_string()))?;
                postprocess_output(&outputs, Precision::Half)
            }
        }
    }

    /// Upscales an image to `scale` times its size.
    ///
    /// The RGB channels go through the network tile by tile; alpha, if
    /// present, is resized separately. When `scale` differs from the native
    /// factor, the result is resized with Lanczos3.
    ///
    /// # Errors
    ///
    /// Returns an error if any tile fails.
    pub fn upscale_image(
        &mut self,
        image: &DynamicImage,
        scale: ScaleFactor,
        tiles: TileConfig,
    ) -> UpscaleResult<DynamicImage> {
        let net_scale = self.net_scale;
        let rgb = image.to_rgb8();
        let upscaled =
            tiling::upscale_tiled(&rgb, net_scale, tiles, |tile| self.upscale(tile))?;

        let upscaled = if image.color().has_alpha() {
            let alpha = extract_alpha(image);
            let alpha = imageops::resize(
                &alpha,
                upscaled.width(),
                upscaled.height(),
                FilterType::Lanczos3,
            );
            DynamicImage::ImageRgba8(merge_alpha(&upscaled, &alpha))
        } else {
            DynamicImage::ImageRgb8(upscaled)
        };

        resize_to_scale(upscaled, image.width(), image.height(), scale)
    }
}

/// Resizes a natively upscaled image to `scale` times the source size.
///
/// Returns the image as-is when it already has the target size.
///
/// # Errors
///
/// Returns [`UpscaleError::UnsupportedInput`] if the target size overflows.
pub fn resize_to_scale(
    upscaled: DynamicImage,
    source_width: u32,
    source_height: u32,
    scale: ScaleFactor,
) -> UpscaleResult<DynamicImage> {
    let (target_width, target_height) = scale
        .apply_to_dimensions(source_width, source_height)
        .ok_or_else(|| {
            UpscaleError::UnsupportedInput(format!(
                "{source_width}x{source_height} at {scale} exceeds the maximum image size"
            ))
        })?;
    if upscaled.width() == target_width && upscaled.height() == target_height {
        return Ok(upscaled);
    }
    Ok(upscaled.resize_exact(target_width, target_height, FilterType::Lanczos3))
}

fn extract_alpha(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y).0[3]])
    })
}

fn merge_alpha(rgb: &RgbImage, alpha: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Rgba([r, g, b, alpha.get_pixel(x, y).0[0]])
    })
}

/// Preprocesses an image for inference.
///
/// Converts to NCHW format (batch=1, channels=3, height, width),
/// RGB color order, normalized to 0-1 range.
fn preprocess_image(rgb: &RgbImage) -> Array4<f32> {
    let (width, height) = rgb.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        tensor[[0, 0, y as usize, x as usize]] = f32::from(r) / 255.0;
        tensor[[0, 1, y as usize, x as usize]] = f32::from(g) / 255.0;
        tensor[[0, 2, y as usize, x as usize]] = f32::from(b) / 255.0;
    }

    tensor
}

/// Postprocesses the first output tensor back to an image.
fn postprocess_output(
    outputs: &ort::session::SessionOutputs<'_>,
    precision: Precision,
) -> UpscaleResult<RgbImage> {
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| UpscaleError::PostprocessingFailed("No output tensor".to_string()))?;

    match precision {
        Precision::Full => {
            let (shape, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| UpscaleError::PostprocessingFailed(e.to_string()))?;
            nchw_to_rgb(&shape[..], data)
        }
        Precision::Half => {
            let (shape, data) = output
                .try_extract_tensor::<f16>()
                .map_err(|e| UpscaleError::PostprocessingFailed(e.to_string()))?;
            let data: Vec<f32> = data.iter().map(|v| v.to_f32()).collect();
            nchw_to_rgb(&shape[..], &data)
        }
    }
}

/// Converts an NCHW float tensor (RGB, 0-1) into an 8-bit image, clipping
/// out-of-range values.
fn nchw_to_rgb(shape: &[i64], data: &[f32]) -> UpscaleResult<RgbImage> {
    if shape.len() != 4 {
        return Err(UpscaleError::PostprocessingFailed(format!(
            "Expected 4D tensor, got {}D",
            shape.len()
        )));
    }
    if shape[1] != 3 {
        return Err(UpscaleError::PostprocessingFailed(format!(
            "Expected 3 channels, got {}",
            shape[1]
        )));
    }

    let height = usize::try_from(shape[2])
        .map_err(|_| UpscaleError::PostprocessingFailed("Invalid tensor height".to_string()))?;
    let width = usize::try_from(shape[3])
        .map_err(|_| UpscaleError::PostprocessingFailed("Invalid tensor width".to_string()))?;
    let channel_size = height * width;
    if data.len() < 3 * channel_size {
        return Err(UpscaleError::PostprocessingFailed(format!(
            "Tensor has {} values, expected {}",
            data.len(),
            3 * channel_size
        )));
    }

    // Clamp guarantees 0.0..=255.0, so the cast cannot wrap
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_u8 = |v: f32| (v * 255.0).clamp(0.0, 255.0).round() as u8;

    let mut pixels = Vec::with_capacity(channel_size * 3);
    for idx in 0..channel_size {
        pixels.push(to_u8(data[idx]));
        pixels.push(to_u8(data[channel_size + idx]));
        pixels.push(to_u8(data[2 * channel_size + idx]));
    }

    let width_u32 = u32::try_from(width)
        .map_err(|_| UpscaleError::PostprocessingFailed("Image width too large".to_string()))?;
    let height_u32 = u32::try_from(height)
        .map_err(|_| UpscaleError::PostprocessingFailed("Image height too large".to_string()))?;

    RgbImage::from_raw(width_u32, height_u32, pixels)
        .ok_or_else(|| UpscaleError::PostprocessingFailed("Failed to create image".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_rs::Rgb;

    #[test]
    fn preprocess_image_creates_correct_shape() {
        let img = RgbImage::new(100, 80);
        let tensor = preprocess_image(&img);
        assert_eq!(tensor.shape(), &[1, 3, 80, 100]);
    }

    #[test]
    fn preprocess_image_normalizes_values() {
        let img = RgbImage::from_pixel(10, 10, Rgb([255, 128, 0]));
        let tensor = preprocess_image(&img);

        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
        assert!((tensor[[0, 1, 0, 0]] - 0.502).abs() < 0.01);
        assert!(tensor[[0, 2, 0, 0]].abs() < 0.01);
    }

    #[test]
    fn nchw_to_rgb_clamps_and_orders_channels() {
        // 1x2 image: channel planes R, G, B
        let data = [1.5, 0.0, 0.5, 0.5, -1.0, 1.0];
        let img = nchw_to_rgb(&[1, 3, 1, 2], &data).expect("valid tensor");
        assert_eq!(img.get_pixel(0, 0).0, [255, 128, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 128, 255]);
    }

    #[test]
    fn nchw_to_rgb_rejects_bad_shapes() {
        assert!(nchw_to_rgb(&[3, 2, 2], &[0.0; 12]).is_err());
        assert!(nchw_to_rgb(&[1, 1, 2, 2], &[0.0; 4]).is_err());
        assert!(nchw_to_rgb(&[1, 3, 2, 2], &[0.0; 6]).is_err());
    }

    #[test]
    fn alpha_round_trips_through_merge() {
        let rgba = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 77]));
        let image = DynamicImage::ImageRgba8(rgba.clone());
        let alpha = extract_alpha(&image);
        let merged = merge_alpha(&image.to_rgb8(), &alpha);
        assert_eq!(merged, rgba);
    }

    #[test]
    fn resize_to_scale_keeps_native_size() {
        let upscaled = DynamicImage::new_rgb8(40, 20);
        let scale = ScaleFactor::new(4).expect("valid scale");
        let out = resize_to_scale(upscaled, 10, 5, scale).expect("resize");
        assert_eq!((out.width(), out.height()), (40, 20));
    }

    #[test]
    fn resize_to_scale_downsamples_to_target() {
        let upscaled = DynamicImage::new_rgba8(40, 20);
        let scale = ScaleFactor::new(2).expect("valid scale");
        let out = resize_to_scale(upscaled, 10, 5, scale).expect("resize");
        assert_eq!((out.width(), out.height()), (20, 10));
        assert!(out.color().has_alpha());
    }

    #[test]
    fn resize_to_scale_enlarges_beyond_native_factor() {
        let upscaled = DynamicImage::new_rgb8(40, 20);
        let scale = ScaleFactor::new(8).expect("valid scale");
        let out = resize_to_scale(upscaled, 10, 5, scale).expect("resize");
        assert_eq!((out.width(), out.height()), (80, 40));
    }

    #[test]
    fn resize_to_scale_rejects_overflowing_target() {
        let upscaled = DynamicImage::new_rgb8(4, 4);
        let scale = ScaleFactor::new(8).expect("valid scale");
        let err = resize_to_scale(upscaled, u32::MAX / 2, 1, scale).unwrap_err();
        assert!(matches!(err, UpscaleError::UnsupportedInput(_)));
    }

    #[test]
    fn half_precision_needs_accelerator_and_f16_model() {
        assert_eq!(
            effective_precision(Precision::Half, Device::Cuda, true),
            Precision::Half
        );
        assert_eq!(
            effective_precision(Precision::Half, Device::Mps, true),
            Precision::Half
        );
        assert_eq!(
            effective_precision(Precision::Half, Device::Cuda, false),
            Precision::Full
        );
    }

    #[test]
    fn cpu_always_runs_full_precision() {
        assert_eq!(
            effective_precision(Precision::Half, Device::Cpu, true),
            Precision::Full
        );
        assert_eq!(
            effective_precision(Precision::Half, Device::Cpu, false),
            Precision::Full
        );
    }

    #[test]
    fn full_precision_request_is_kept() {
        assert_eq!(
            effective_precision(Precision::Full, Device::Cuda, true),
            Precision::Full
        );
        assert_eq!(
            effective_precision(Precision::Full, Device::Cpu, false),
            Precision::Full
        );
    }

    #[test]
    fn cpu_has_no_execution_provider() {
        assert!(execution_provider(Device::Cpu).is_none());
        assert!(execution_provider(Device::Cuda).is_some());
    }

    #[test]
    fn missing_model_is_reported() {
        let mut manager = UpscaleManager::new("/nonexistent/model.onnx", 4);
        let err = manager
            .load_session(Device::Cpu, Precision::Full)
            .unwrap_err();
        assert!(matches!(err, UpscaleError::ModelNotFound(_)));
        assert!(!manager.is_session_ready());
    }

    #[test]
    fn upscale_without_session_fails() {
        let mut manager = UpscaleManager::new("model.onnx", 4);
        let result = manager.upscale(&RgbImage::new(4, 4));
        assert_eq!(result, Err(UpscaleError::SessionNotInitialized));
    }
}
