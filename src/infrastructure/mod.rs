// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port` and `domain`. These adapters wrap ONNX Runtime.
//!
//! # Available Adapters
//!
//! - [`onnx`]: Inference and device probing via ONNX Runtime

pub mod onnx;

// Re-export main types for convenience
pub use onnx::{OnnxUpscaleProcessor, OrtDeviceProbe};
