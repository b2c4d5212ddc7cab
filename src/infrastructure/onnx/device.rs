// SPDX-License-Identifier: MPL-2.0
//! Device availability as reported by ONNX Runtime.

use ort::execution_providers::{CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider};

use crate::domain::{Device, DeviceProbe};

/// Asks ONNX Runtime which execution providers this build can use.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrtDeviceProbe;

impl DeviceProbe for OrtDeviceProbe {
    fn is_available(&self, device: Device) -> bool {
        let available = match device {
            Device::Cpu => Ok(true),
            Device::Cuda => CUDAExecutionProvider::default().is_available(),
            Device::Mps => CoreMLExecutionProvider::default().is_available(),
        };
        match available {
            Ok(available) => {
                tracing::debug!(%device, available, "probed execution provider");
                available
            }
            Err(err) => {
                tracing::debug!(%device, error = %err, "execution provider probe failed");
                false
            }
        }
    }
}
