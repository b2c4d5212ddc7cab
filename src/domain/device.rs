// SPDX-License-Identifier: MPL-2.0
//! Compute device selection.
//!
//! A [`DevicePreference`] is what the user asked for; a [`Device`] is what the
//! run actually uses. [`resolve`] turns the former into the latter.

use std::fmt;
use std::str::FromStr;

/// Concrete compute backend used for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    /// Plain CPU execution. Always available.
    Cpu,
    /// NVIDIA GPU through CUDA.
    Cuda,
    /// Apple GPU (Metal Performance Shaders / Core ML).
    Mps,
}

impl Device {
    /// Order in which `auto` tries the backends. The last entry is the fallback.
    pub const CASCADE: [Device; 3] = [Device::Cuda, Device::Mps, Device::Cpu];

    /// Identifier used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::Mps => "mps",
        }
    }

    /// Returns `true` for GPU-class backends.
    #[must_use]
    pub fn is_accelerator(self) -> bool {
        !matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Pick the best available backend.
    #[default]
    Auto,
    /// Use exactly this backend, without checking availability.
    Explicit(Device),
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePreference::Auto => f.write_str("auto"),
            DevicePreference::Explicit(device) => fmt::Display::fmt(device, f),
        }
    }
}

/// Error returned when a device name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDevice(pub String);

impl fmt::Display for UnknownDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown device '{}' (expected one of: auto, cpu, cuda, mps)",
            self.0
        )
    }
}

impl std::error::Error for UnknownDevice {}

impl FromStr for DevicePreference {
    type Err = UnknownDevice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Explicit(Device::Cpu)),
            "cuda" => Ok(DevicePreference::Explicit(Device::Cuda)),
            "mps" => Ok(DevicePreference::Explicit(Device::Mps)),
            _ => Err(UnknownDevice(s.to_string())),
        }
    }
}

/// Answers whether a backend can be used on this machine.
pub trait DeviceProbe {
    /// Returns `true` if `device` is usable. Must be `true` for [`Device::Cpu`].
    fn is_available(&self, device: Device) -> bool;
}

/// Resolves a preference into a concrete device.
///
/// Explicit preferences are returned as-is. `Auto` walks
/// [`Device::CASCADE`] and stops at the first available entry; the CPU
/// fallback is taken unconditionally, so this never fails.
#[must_use]
pub fn resolve(preference: DevicePreference, probe: &impl DeviceProbe) -> Device {
    match preference {
        DevicePreference::Explicit(device) => device,
        DevicePreference::Auto => Device::CASCADE
            .into_iter()
            .find(|&device| device == Device::Cpu || probe.is_available(device))
            .unwrap_or(Device::Cpu),
    }
}
