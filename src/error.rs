// SPDX-License-Identifier: MPL-2.0
//! Crate-wide error type.
//!
//! Variants split into two groups. Run-scoped errors (configuration,
//! download, model load, output directory creation) abort the invocation
//! before or instead of the batch. Task-scoped errors (decode, inference,
//! write) are recorded per file and the run continues.

use crate::application::port::EnhanceError;
use crate::domain::{RunConfigError, UnknownDevice, UnknownModel};
use crate::media::download::DownloadError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid arguments, settings or input directory.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model weights could not be fetched.
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    /// The inference session could not be created from the weights.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// A source image could not be read or decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The enhancer failed on an image.
    #[error("inference failed: {0}")]
    Inference(#[from] EnhanceError),

    /// An output file or directory could not be written.
    #[error("failed to write output: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error when it ends the run.
    ///
    /// Usage and configuration problems exit with `2`; everything else with `1`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Configuration(_) => 2,
            _ => 1,
        }
    }
}

impl From<RunConfigError> for Error {
    fn from(err: RunConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<UnknownModel> for Error {
    fn from(err: UnknownModel) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<UnknownDevice> for Error {
    fn from(err: UnknownDevice) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
