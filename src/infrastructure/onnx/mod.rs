// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapters.
//!
//! - [`OnnxUpscaleProcessor`]: `Real-ESRGAN` upscaling, implements [`ImageEnhancer`]
//! - [`OrtDeviceProbe`]: execution provider availability, implements [`DeviceProbe`]
//!
//! # Design Notes
//!
//! - The processor wraps [`UpscaleManager`], which owns the session
//! - Images cross the port as `DynamicImage`; tiling happens inside the manager
//!
//! [`ImageEnhancer`]: crate::application::port::ImageEnhancer
//! [`DeviceProbe`]: crate::domain::DeviceProbe
//! [`UpscaleManager`]: crate::media::upscale::UpscaleManager

mod device;
mod upscale;

pub use device::OrtDeviceProbe;
pub use upscale::OnnxUpscaleProcessor;
