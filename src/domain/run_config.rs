// SPDX-License-Identifier: MPL-2.0
//! Validated settings for one invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use super::device::DevicePreference;
use super::model::ModelKind;

// =============================================================================
// Scale Factor Bounds
// =============================================================================

/// Output scale bounds.
///
/// There is no upper bound: factors above the network's native 4x are
/// reached by resizing its output.
pub mod scale_bounds {
    /// Smallest accepted output scale.
    pub const MIN: u32 = 1;
    /// Default output scale, the networks' native factor.
    pub const DEFAULT: u32 = 4;
}

// =============================================================================
// ScaleFactor
// =============================================================================

/// Integer output scale factor, guaranteed to be at least
/// [`scale_bounds::MIN`].
///
/// An out-of-range scale is a configuration mistake and is rejected rather
/// than silently adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactor(u32);

impl ScaleFactor {
    /// Creates a scale factor, returning `None` when `value` is below
    /// [`scale_bounds::MIN`].
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        (value >= scale_bounds::MIN).then_some(Self(value))
    }

    /// Returns the raw factor.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Applies the factor to image dimensions.
    ///
    /// Returns `None` if either scaled dimension overflows `u32`.
    #[must_use]
    pub fn apply_to_dimensions(self, width: u32, height: u32) -> Option<(u32, u32)> {
        Some((width.checked_mul(self.0)?, height.checked_mul(self.0)?))
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(scale_bounds::DEFAULT)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

// =============================================================================
// Precision
// =============================================================================

/// Floating point precision requested for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 16-bit floats (faster on GPUs, needs a half-precision model).
    #[default]
    Half,
    /// 32-bit floats.
    Full,
}

impl Precision {
    /// Maps the `--fp32` flag onto a precision.
    #[must_use]
    pub fn from_full_precision_flag(full: bool) -> Self {
        if full {
            Precision::Full
        } else {
            Precision::Half
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Half => f.write_str("fp16"),
            Precision::Full => f.write_str("fp32"),
        }
    }
}

// =============================================================================
// TileConfig
// =============================================================================

/// Tiling parameters for inference.
///
/// A `size` of 0 disables tiling and sends the whole image at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    /// Edge length of a tile in input pixels.
    pub size: u32,
    /// Context pixels added around each tile and cropped after inference.
    pub pad: u32,
}

impl TileConfig {
    /// Default tile edge length.
    pub const DEFAULT_SIZE: u32 = 512;
    /// Default padding around a tile.
    pub const DEFAULT_PAD: u32 = 10;

    /// Returns `true` when tiling is disabled.
    #[must_use]
    pub fn is_disabled(self) -> bool {
        self.size == 0
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            pad: Self::DEFAULT_PAD,
        }
    }
}

// =============================================================================
// RunConfig
// =============================================================================

/// Reasons a [`RunConfig`] cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunConfigError {
    /// The input directory does not exist or is not a directory.
    NotADirectory(PathBuf),
    /// The input directory exists but cannot be listed.
    Unreadable { path: PathBuf, reason: String },
    /// The scale factor is outside the accepted range.
    ScaleOutOfRange(u32),
}

impl fmt::Display for RunConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunConfigError::NotADirectory(path) => {
                write!(f, "input directory does not exist: {}", path.display())
            }
            RunConfigError::Unreadable { path, reason } => {
                write!(f, "cannot read input directory {}: {reason}", path.display())
            }
            RunConfigError::ScaleOutOfRange(value) => write!(
                f,
                "scale {value} is out of range (must be at least {})",
                scale_bounds::MIN
            ),
        }
    }
}

impl std::error::Error for RunConfigError {}

/// Settings for one batch run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    input_dir: PathBuf,
    scale: ScaleFactor,
    model: ModelKind,
    device: DevicePreference,
    precision: Precision,
    face_enhance: bool,
    tiling: TileConfig,
}

impl RunConfig {
    /// Name of the output subdirectory created inside the input directory.
    pub const OUTPUT_DIR_NAME: &'static str = "upscaled";

    /// Builds a run configuration, checking that the input directory is
    /// readable and the scale is in range.
    ///
    /// # Errors
    ///
    /// Returns a [`RunConfigError`] if any invariant does not hold.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        scale: u32,
        model: ModelKind,
        device: DevicePreference,
        precision: Precision,
    ) -> Result<Self, RunConfigError> {
        let input_dir = input_dir.into();
        if !input_dir.is_dir() {
            return Err(RunConfigError::NotADirectory(input_dir));
        }
        if let Err(err) = std::fs::read_dir(&input_dir) {
            return Err(RunConfigError::Unreadable {
                path: input_dir,
                reason: err.to_string(),
            });
        }
        let scale = ScaleFactor::new(scale).ok_or(RunConfigError::ScaleOutOfRange(scale))?;

        Ok(Self {
            input_dir,
            scale,
            model,
            device,
            precision,
            face_enhance: true,
            tiling: TileConfig::default(),
        })
    }

    /// Sets whether face enhancement was requested.
    #[must_use]
    pub fn with_face_enhance(mut self, enabled: bool) -> Self {
        self.face_enhance = enabled;
        self
    }

    /// Sets the tiling parameters.
    #[must_use]
    pub fn with_tiling(mut self, tiling: TileConfig) -> Self {
        self.tiling = tiling;
        self
    }

    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory receiving the upscaled files.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.input_dir.join(Self::OUTPUT_DIR_NAME)
    }

    #[must_use]
    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    #[must_use]
    pub fn model(&self) -> ModelKind {
        self.model
    }

    #[must_use]
    pub fn device(&self) -> DevicePreference {
        self.device
    }

    #[must_use]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[must_use]
    pub fn face_enhance(&self) -> bool {
        self.face_enhance
    }

    #[must_use]
    pub fn tiling(&self) -> TileConfig {
        self.tiling
    }
}
