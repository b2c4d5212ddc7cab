// SPDX-License-Identifier: MPL-2.0
//! Model registry.
//!
//! The set of models is closed: every identifier maps to one downloadable
//! weight file and the architecture parameters the inference adapter needs.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Location the built-in ONNX exports are downloaded from.
const DEFAULT_MODEL_BASE_URL: &str =
    "https://huggingface.co/onnx-community/Real-ESRGAN-ONNX/resolve/main/";

/// Identifier of a supported super-resolution model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    /// `RealESRGAN_x4plus_anime_6B`, tuned for manga, manhwa and anime art.
    #[default]
    Anime,
    /// `RealESRGAN_x4plus`, for photographs and general content.
    General,
}

impl ModelKind {
    /// All registered models.
    pub const ALL: [ModelKind; 2] = [ModelKind::Anime, ModelKind::General];

    /// Identifier used on the command line and in the settings file.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Anime => "anime",
            ModelKind::General => "general",
        }
    }

    /// Upscale factor the network produces natively.
    #[must_use]
    pub fn net_scale(self) -> u32 {
        4
    }

    /// Number of RRDB blocks in the generator.
    #[must_use]
    pub fn block_count(self) -> u32 {
        match self {
            ModelKind::Anime => 6,
            ModelKind::General => 23,
        }
    }

    /// Human-readable model name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Anime => "Real-ESRGAN x4plus anime 6B",
            ModelKind::General => "Real-ESRGAN x4plus",
        }
    }

    /// Whether face enhancement can apply to this model.
    ///
    /// Only the general model was ever paired with a face restorer.
    #[must_use]
    pub fn supports_face_enhance(self) -> bool {
        matches!(self, ModelKind::General)
    }

    /// Base name of the exported weights, without extension.
    #[must_use]
    pub fn weights_name(self) -> &'static str {
        match self {
            ModelKind::Anime => "RealESRGAN_x4plus_anime_6B",
            ModelKind::General => "RealESRGAN_x4plus",
        }
    }

    /// Built-in download location of this model's ONNX export.
    #[must_use]
    pub fn default_artifact(self) -> ModelArtifact {
        let filename = format!("{}.{}", self.weights_name(), ModelArtifact::EXTENSION);
        ModelArtifact::new(format!("{DEFAULT_MODEL_BASE_URL}{filename}"), filename)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a model identifier is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model '{}' (expected one of: anime, general)", self.0)
    }
}

impl std::error::Error for UnknownModel {}

impl FromStr for ModelKind {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anime" => Ok(ModelKind::Anime),
            "general" => Ok(ModelKind::General),
            _ => Err(UnknownModel(s.to_string())),
        }
    }
}

/// A downloadable weight file: where it comes from and what it is called locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    /// Download URL.
    pub url: String,
    /// File name inside the model cache directory.
    pub filename: String,
}

impl ModelArtifact {
    /// File extension of weights the inference adapter can load.
    pub const EXTENSION: &'static str = "onnx";

    /// Creates an artifact description.
    #[must_use]
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }

    /// Name of the temporary file used while the artifact is downloading.
    #[must_use]
    pub fn partial_filename(&self) -> String {
        format!("{}.part", self.filename)
    }

    /// Whether the local file name designates an ONNX graph, ignoring case.
    #[must_use]
    pub fn is_onnx(&self) -> bool {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(Self::EXTENSION))
    }
}
